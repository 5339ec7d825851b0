//! Exposes a host `log` function and calls it from a script.
//!
//! ```bash
//! cargo run --example functions
//! ```

use luabinder::prelude::*;

fn main() -> Result<(), BinderError> {
    let mut binder = Binder::new();
    binder.func("log", |ctx| {
        let parts = (1..=ctx.top())
            .map(|position| ctx.arg(position).any().to_string())
            .collect::<Vec<_>>();
        println!("[lua] {}", parts.join(" "));
        Ok(())
    })?;

    binder.do_string(
        r#"
        log("Hello from Lua!", 42, true)
        for i = 1, 3 do
            log("iteration", i)
        end
        "#,
    )?;

    Ok(())
}

//! Defines a function in Lua and calls it from Rust.
//!
//! ```bash
//! cargo run --example call_lua
//! ```

use luabinder::prelude::*;

fn main() -> Result<(), BinderError> {
    let binder = Binder::new();
    binder.do_string(
        r#"
        function hello(name)
            return "Hello " .. name
        end
        "#,
    )?;

    let mut caller = binder.call("hello")?;
    caller.args().string("World")?;
    let ret = caller.execute()?;

    println!("{}", ret.get(1).string()?);
    Ok(())
}

//! Typed, stack-safe bindings between Rust and an embedded Lua VM.
//!
//! Host code declares functions, modules and object types in a [`Loader`],
//! a [`Binder`] installs them into its VM before the first script runs, and
//! scripts call back into the host through a [`Context`]. Host code calls
//! script functions through a [`Caller`] and reads what they return from
//! [`Returns`].
//!
//! ```ignore
//! use luabinder::prelude::*;
//!
//! let mut binder = Binder::new();
//! binder.func("sum", |ctx| {
//!     let a = ctx.arg(1).number()?;
//!     let b = ctx.arg(2).number()?;
//!     ctx.push().number(a + b);
//!     Ok(())
//! })?;
//!
//! let ret = binder.do_string("return sum(5, 7)")?;
//! assert_eq!(ret.get(1).number()?, 12.0);
//! ```
//!
//! Values that cross the boundary are marshaled by the types in
//! `luabinder-core`, re-exported here.

mod binder;
mod caller;
mod error;
mod loader;
mod module;
mod options;
mod returns;
mod source;
mod table;

pub use binder::{Binder, STRING_CHUNK};
pub use caller::Caller;
pub use error::BinderError;
pub use loader::Loader;
pub use module::{Constant, Module};
pub use options::Options;
pub use returns::Returns;
pub use source::{ScriptError, Source};
pub use table::Table;

pub use luabinder_core::{
    Argument, Context, ConversionError, Dynamic, Handler, NativeCallable, NativeError, Object,
    Push, Stack, mlua,
};

// Re-export main types
pub mod prelude {
    pub use crate::{
        Argument, Binder, BinderError, Caller, Context, ConversionError, Dynamic, Loader, Module,
        NativeError, Options, Returns, Table,
    };
}

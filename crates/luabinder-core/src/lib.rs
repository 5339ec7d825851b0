//! Core marshaling types for luabinder.
//!
//! This crate owns everything that touches a single value stack:
//!
//! - [`Stack`]: the value stack of one activation or one binder
//! - [`Context`]: per-invocation handle bundling the engine state with stack bookkeeping
//! - [`Argument`] / [`Push`]: typed read access to stack positions and append-only writes
//! - [`Dynamic`]: the dynamic kind of a value, for handlers that branch on type
//! - [`Object`]: tagged host objects passed through the VM as opaque userdata
//! - [`Handler`]: type-erased native callable, plus the dispatch trampoline
//!   that turns handler errors into VM failures
//!
//! Registration (loaders, modules, tables) and execution live in the
//! `luabinder` crate, which builds on these types.

mod argument;
mod context;
mod diagnostics;
mod dynamic;
mod error;
mod handler;
mod object;
mod push;
mod stack;

pub use argument::Argument;
pub use context::Context;
pub use diagnostics::Diagnostics;
pub use dynamic::Dynamic;
pub use error::{ConversionError, NativeError};
pub use handler::{Guard, Handler, NativeCallable};
pub use object::{Object, register_methods};
pub use push::Push;
pub use stack::Stack;

/// The embedded engine, re-exported so embedders use the same version.
pub use mlua;

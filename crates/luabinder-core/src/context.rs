//! Execution context bridging the VM and native handlers.

use std::cell::RefCell;
use std::fmt;

use mlua::{Lua, Value};

use crate::{Argument, Diagnostics, NativeError, Push, Stack};

/// Per-invocation handle on the VM.
///
/// A `Context` bundles the engine state with the stack it works on and counts
/// the values pushed by the current operation. One is created for every host
/// function invocation (over a stack holding the call's arguments) and for
/// every outbound call (over the binder's stack). It is only ever borrowed by
/// the code it was created for; [`Argument`] and [`Push`] borrow it in turn,
/// so neither can outlive the invocation.
///
/// ## Reading arguments
///
/// ```ignore
/// if ctx.top() < 2 {
///     return Err("need at least 2 arguments".into());
/// }
/// let a = ctx.arg(1).number()?;
/// let b = ctx.arg(2).number()?;
/// ```
///
/// ## Returning values
///
/// ```ignore
/// ctx.push().number(a + b);
/// ```
pub struct Context<'a> {
    lua: &'a Lua,
    stack: &'a RefCell<Stack>,
    /// Stack depth below this activation
    base: usize,
    /// Values pushed by this activation
    pushed: usize,
}

impl<'a> Context<'a> {
    /// Create a context for a host call whose arguments fill `frame`.
    pub fn inbound(lua: &'a Lua, frame: &'a RefCell<Stack>) -> Self {
        Self {
            lua,
            stack: frame,
            base: 0,
            pushed: 0,
        }
    }

    /// Create a context that stages values above the current top of `stack`.
    pub fn outbound(lua: &'a Lua, stack: &'a RefCell<Stack>) -> Self {
        let base = stack.borrow().top();
        Self {
            lua,
            stack,
            base,
            pushed: 0,
        }
    }

    /// Number of positions in this activation, arguments and pushed values alike.
    pub fn top(&self) -> usize {
        self.stack.borrow().top().saturating_sub(self.base)
    }

    /// Argument at a 1-based position. Validated only when read.
    pub fn arg(&self, position: usize) -> Argument<'_> {
        Argument::new(self.stack, self.base.saturating_add(position), position)
    }

    /// A cursor appending values to the stack.
    pub fn push(&mut self) -> Push<'_, 'a> {
        Push::new(self)
    }

    /// Number of values pushed by this activation.
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Stack depth below this activation.
    pub fn base(&self) -> usize {
        self.base
    }

    /// The engine state, for handlers that need to re-enter the VM.
    pub fn lua(&self) -> &'a Lua {
        self.lua
    }

    pub(crate) fn push_value(&mut self, value: Value) {
        self.stack.borrow_mut().push(value);
        self.pushed += 1;
    }

    /// Turn a handler error into a VM failure aborting the running script.
    pub(crate) fn error(&self, err: NativeError, diagnostics: &Diagnostics) -> mlua::Error {
        diagnostics.record_fault(self.lua);
        mlua::Error::RuntimeError(diagnostics.failure_message(err.to_string()))
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("top", &self.top())
            .field("base", &self.base)
            .field("pushed", &self.pushed)
            .finish()
    }
}

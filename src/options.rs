//! Engine configuration.

use mlua::{HookTriggers, Lua, LuaOptions, StdLib, VmState};
use tracing::debug;

/// Configuration applied when a [`Binder`](crate::Binder) creates its VM.
///
/// Every option is opt-in; an untouched `Options` gives the engine's defaults.
///
/// ```ignore
/// let binder = Binder::with_options(
///     Options::new().with_call_stack_size(200).with_skip_open_libs(true),
/// )?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Deepest call nesting allowed before a call fails with "stack overflow"
    pub call_stack_size: Option<usize>,
    /// Initial capacity of the binder's value stack
    pub registry_size: Option<usize>,
    /// Open only the base, package and table libraries
    pub skip_open_libs: bool,
    /// Append the host backtrace to handler failure messages
    pub include_native_trace: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_stack_size(mut self, size: usize) -> Self {
        self.call_stack_size = Some(size);
        self
    }

    pub fn with_registry_size(mut self, size: usize) -> Self {
        self.registry_size = Some(size);
        self
    }

    pub fn with_skip_open_libs(mut self, skip: bool) -> Self {
        self.skip_open_libs = skip;
        self
    }

    pub fn with_native_trace(mut self, include: bool) -> Self {
        self.include_native_trace = include;
        self
    }

    /// Create a VM configured by these options.
    pub(crate) fn open_state(&self) -> mlua::Result<Lua> {
        let lua = if self.skip_open_libs {
            // The base library is always opened by the engine.
            Lua::new_with(StdLib::PACKAGE | StdLib::TABLE, LuaOptions::default())?
        } else {
            Lua::new()
        };

        if let Some(limit) = self.call_stack_size {
            limit_call_depth(&lua, limit);
        }

        debug!(options = ?self, "opened VM state");
        Ok(lua)
    }
}

/// Fail any call nested deeper than `limit` frames.
fn limit_call_depth(lua: &Lua, limit: usize) {
    lua.set_hook(HookTriggers::ON_CALLS, move |lua, _debug| {
        let mut depth = 0;
        while lua.inspect_stack(depth).is_some() {
            depth += 1;
            if depth > limit {
                return Err(mlua::Error::runtime(format!(
                    "stack overflow (call depth exceeds {limit})"
                )));
            }
        }
        Ok(VmState::Continue)
    });
}

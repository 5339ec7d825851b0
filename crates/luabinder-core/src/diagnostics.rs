//! Failure bookkeeping shared between a binder and its dispatch trampolines.

use std::backtrace::Backtrace;
use std::cell::Cell;

use mlua::Lua;

/// Per-VM diagnostic state.
///
/// Trampolines record the script line that was executing when a handler
/// failed; the binder reads it back when the engine's own message carries no
/// position. The innermost failure wins: once a line is recorded it is kept
/// until the binder resets it for the next execution.
#[derive(Debug, Default)]
pub struct Diagnostics {
    native_trace: bool,
    fault_line: Cell<Option<usize>>,
}

impl Diagnostics {
    /// Create diagnostics, optionally attaching host backtraces to handler failures.
    pub fn new(native_trace: bool) -> Self {
        Self {
            native_trace,
            fault_line: Cell::new(None),
        }
    }

    /// Whether handler failures carry a host backtrace.
    pub fn native_trace(&self) -> bool {
        self.native_trace
    }

    /// Line of the innermost failed handler call since the last reset.
    pub fn fault_line(&self) -> Option<usize> {
        self.fault_line.get()
    }

    /// Forget the recorded line before a new execution.
    pub fn reset(&self) {
        self.fault_line.set(None);
    }

    /// Record the line of the script function that called the failing handler.
    pub(crate) fn record_fault(&self, lua: &Lua) {
        if self.fault_line.get().is_some() {
            return;
        }
        // Level 0 is the native function itself, level 1 its caller.
        let line = lua
            .inspect_stack(1)
            .and_then(|debug| usize::try_from(debug.curr_line()).ok())
            .filter(|line| *line > 0);
        self.fault_line.set(line);
    }

    /// Build the VM failure message for a handler error.
    pub(crate) fn failure_message(&self, message: String) -> String {
        if self.native_trace {
            format!("{message}\n{}", Backtrace::force_capture())
        } else {
            message
        }
    }
}

//! Outbound calls into script functions.

use std::fmt;

use mlua::{MultiValue, Value};
use tracing::{debug, warn};

use luabinder_core::{Context, Push};

use crate::source::{describe, first_line};
use crate::{Binder, BinderError, Returns};

/// One call to a global script function.
///
/// Created by [`Binder::call`] with the callee already staged; arguments are
/// appended with [`args`](Self::args) in positional order and the call runs
/// on [`execute`](Self::execute). Dropping a `Caller` without executing it
/// releases the staged values.
///
/// ```ignore
/// let mut caller = binder.call("hello")?;
/// caller.args().string("World")?;
/// let ret = caller.execute()?;
/// assert_eq!(ret.get(1).string()?, "Hello World");
/// ```
pub struct Caller<'b> {
    binder: &'b Binder,
    function: String,
    /// Stack depth before the callee was staged
    base: usize,
    ctx: Context<'b>,
    /// Still owns its staged values
    armed: bool,
}

impl<'b> Caller<'b> {
    pub(crate) fn new(binder: &'b Binder, function: String, base: usize, ctx: Context<'b>) -> Self {
        Self {
            binder,
            function,
            base,
            ctx,
            armed: true,
        }
    }

    /// Name of the called global.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Cursor appending arguments.
    pub fn args(&mut self) -> Push<'_, 'b> {
        self.ctx.push()
    }

    /// Number of arguments staged so far.
    pub fn staged(&self) -> usize {
        self.ctx.pushed()
    }

    /// Run the call in protected mode, keeping every value it returns.
    ///
    /// On every failure the staged callee and arguments are released. When
    /// another caller's values were left above them, those values move down.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn execute(mut self) -> Result<Returns<'b>, BinderError> {
        self.armed = false;
        let binder = self.binder;

        let expected = 1 + self.ctx.pushed();
        let staged = {
            let mut stack = binder.stack().borrow_mut();
            let actual = stack.top().saturating_sub(self.base);
            if actual != expected {
                warn!(function = %self.function, expected, actual, "staged values are not on top");
                stack.remove_range(self.base + 1, expected);
                return Err(BinderError::Unbalanced { expected, actual });
            }
            stack.take(expected)
        };

        let mut staged = staged.into_iter();
        let callee = staged.next().unwrap_or(Value::Nil);
        let args: MultiValue = staged.collect();

        let function = match callee {
            Value::Function(function) => function,
            other => {
                return Err(BinderError::NotCallable {
                    function: self.function.clone(),
                    actual: other.type_name(),
                });
            }
        };

        debug!(function = %self.function, arguments = args.len(), "calling script function");
        binder.diagnostics().reset();
        let results = function.call::<MultiValue>(args).map_err(|err| {
            let line = first_line(&err.to_string()).or_else(|| binder.diagnostics().fault_line());
            BinderError::Call {
                function: self.function.clone(),
                message: describe(&err),
                line,
            }
        })?;

        let count = results.len();
        let mut stack = binder.stack().borrow_mut();
        for value in results {
            stack.push(value);
        }
        Ok(Returns::new(binder.stack(), self.base, count))
    }
}

impl Drop for Caller<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let staged = 1 + self.ctx.pushed();
        let mut stack = self.binder.stack().borrow_mut();
        if stack.top() != self.base + staged {
            warn!(function = %self.function, "unexecuted call released out of order");
        }
        stack.remove_range(self.base + 1, staged);
    }
}

impl fmt::Debug for Caller<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caller")
            .field("function", &self.function)
            .field("base", &self.base)
            .field("staged", &self.ctx.pushed())
            .finish()
    }
}

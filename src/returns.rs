//! Values produced by an execution or a call.

use std::cell::RefCell;
use std::fmt;

use tracing::warn;

use luabinder_core::{Argument, Stack};

/// Values a chunk or a call left on the binder's stack.
///
/// The values stay readable until the `Returns` is closed or dropped, which
/// pops exactly [`values`](Self::values) slots. Closing twice is a no-op.
///
/// ```ignore
/// let mut ret = binder.do_string("return sum(5, 7)")?;
/// assert_eq!(ret.get(1).number()?, 12.0);
/// ret.close();
/// ```
pub struct Returns<'b> {
    stack: &'b RefCell<Stack>,
    /// Stack depth before the values were produced
    base: usize,
    count: usize,
    closed: bool,
}

impl<'b> Returns<'b> {
    pub(crate) fn new(stack: &'b RefCell<Stack>, base: usize, count: usize) -> Self {
        Self {
            stack,
            base,
            count,
            closed: false,
        }
    }

    /// Number of values produced.
    pub fn values(&self) -> usize {
        self.count
    }

    /// The nth value (1-based); past the last value, or once closed, it reads as "no value".
    pub fn get(&self, n: usize) -> Argument<'b> {
        let limit = if self.closed {
            self.base
        } else {
            self.base + self.count
        };
        Argument::bounded(self.stack, self.base.saturating_add(n), n, limit)
    }

    /// Release the values.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut stack = self.stack.borrow_mut();
        let expected = self.base + self.count;
        if stack.top() != expected {
            warn!(
                top = stack.top(),
                expected,
                count = self.count,
                "results released out of order"
            );
        }
        stack.pop(self.count);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Returns<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Returns<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Returns")
            .field("base", &self.base)
            .field("count", &self.count)
            .field("closed", &self.closed)
            .finish()
    }
}

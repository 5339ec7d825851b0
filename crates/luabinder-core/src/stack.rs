//! Value stack for one activation.

use mlua::{MultiValue, Value};

/// An append-only value stack addressed by 1-based positions.
///
/// Every inbound host call gets its own `Stack` holding the call's arguments
/// followed by whatever the handler pushes. A binder keeps one more for
/// outbound work: staged callees and arguments, and the values held by live
/// results.
#[derive(Debug, Default)]
pub struct Stack {
    slots: Vec<Value>,
}

impl Stack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Create an empty stack with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Create a stack holding `values`, first value at position 1.
    pub fn from_values(values: MultiValue) -> Self {
        Self {
            slots: values.into_iter().collect(),
        }
    }

    /// Number of values on the stack.
    pub fn top(&self) -> usize {
        self.slots.len()
    }

    /// Check if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Value at a 1-based position.
    pub fn get(&self, position: usize) -> Option<&Value> {
        position.checked_sub(1).and_then(|index| self.slots.get(index))
    }

    /// Append a value.
    pub fn push(&mut self, value: Value) {
        self.slots.push(value);
    }

    /// Pop up to `count` values from the top, returning how many were removed.
    pub fn pop(&mut self, count: usize) -> usize {
        let removed = count.min(self.slots.len());
        self.slots.truncate(self.slots.len() - removed);
        removed
    }

    /// Remove up to `count` values starting at 1-based `position`, shifting
    /// the values above them down. Returns how many were removed.
    pub fn remove_range(&mut self, position: usize, count: usize) -> usize {
        let start = position.saturating_sub(1).min(self.slots.len());
        let end = start.saturating_add(count).min(self.slots.len());
        self.slots.drain(start..end);
        end - start
    }

    /// Remove the top `count` values, keeping their stack order.
    pub fn take(&mut self, count: usize) -> Vec<Value> {
        let start = self.slots.len().saturating_sub(count);
        self.slots.split_off(start)
    }
}

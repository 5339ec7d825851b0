//! Append-only write access to the stack.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::Value;

use crate::{Context, NativeError, Object};

/// A write cursor appending to the top of the stack.
///
/// Every write adds exactly one value and bumps the owning [`Context`]'s
/// pushed-count. Writes that only move a scalar are infallible; writes that
/// allocate inside the VM return an error when the engine refuses.
///
/// ```ignore
/// ctx.push().string("Hello")?.number(100.0);
/// ```
pub struct Push<'c, 'a> {
    context: &'c mut Context<'a>,
}

impl<'c, 'a> Push<'c, 'a> {
    pub(crate) fn new(context: &'c mut Context<'a>) -> Self {
        Self { context }
    }

    /// Push a boolean.
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.context.push_value(Value::Boolean(value));
        self
    }

    /// Push a number.
    pub fn number(&mut self, value: f64) -> &mut Self {
        self.context.push_value(Value::Number(value));
        self
    }

    /// Push an integer.
    pub fn integer(&mut self, value: i64) -> &mut Self {
        self.context.push_value(Value::Integer(value));
        self
    }

    /// Push nil.
    pub fn nil(&mut self) -> &mut Self {
        self.context.push_value(Value::Nil);
        self
    }

    /// Push a raw engine value.
    pub fn value(&mut self, value: Value) -> &mut Self {
        self.context.push_value(value);
        self
    }

    /// Push a string.
    pub fn string(&mut self, value: &str) -> Result<&mut Self, NativeError> {
        let s = self.context.lua().create_string(value)?;
        self.context.push_value(Value::String(s));
        Ok(self)
    }

    /// Push a host value as an object of bound type `tag`.
    ///
    /// The VM only sees an opaque handle; reading it back requires naming
    /// the payload type (and optionally the tag), see
    /// [`Argument::data`](crate::Argument::data).
    pub fn data<T: 'static>(&mut self, value: T, tag: &str) -> Result<&mut Self, NativeError> {
        self.object(Object::new(value, tag))
    }

    /// Push a host value the embedder keeps a handle to.
    pub fn shared<T: 'static>(
        &mut self,
        value: Rc<RefCell<T>>,
        tag: &str,
    ) -> Result<&mut Self, NativeError> {
        self.object(Object::shared(value, tag))
    }

    fn object(&mut self, object: Object) -> Result<&mut Self, NativeError> {
        let ud = self.context.lua().create_userdata(object)?;
        self.context.push_value(Value::UserData(ud));
        Ok(self)
    }
}

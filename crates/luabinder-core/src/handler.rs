//! Native handler storage and the dispatch trampoline.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use mlua::{Function, Lua, MultiValue};
use tracing::trace;

use crate::{ConversionError, Context, Diagnostics, NativeError, Stack};

/// Trait for callable native handlers.
///
/// Implemented for every closure taking a [`Context`], so handlers are
/// usually written inline:
///
/// ```ignore
/// loader.func("negate", |ctx: &mut Context| {
///     let value = ctx.arg(1).bool()?;
///     ctx.push().bool(!value);
///     Ok(())
/// });
/// ```
pub trait NativeCallable {
    /// Call this handler with the given context.
    fn call(&self, ctx: &mut Context<'_>) -> Result<(), NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut Context<'_>) -> Result<(), NativeError>,
{
    fn call(&self, ctx: &mut Context<'_>) -> Result<(), NativeError> {
        (self)(ctx)
    }
}

/// Type-erased native handler.
///
/// Cloning shares the underlying callable.
#[derive(Clone)]
pub struct Handler {
    inner: Rc<dyn NativeCallable>,
}

impl Handler {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<(), NativeError> + 'static,
    {
        Self { inner: Rc::new(f) }
    }

    /// Wrap any callable, including types implementing [`NativeCallable`] by hand.
    pub fn from_callable<C>(callable: C) -> Self
    where
        C: NativeCallable + 'static,
    {
        Self {
            inner: Rc::new(callable),
        }
    }

    /// Call this handler with the given context.
    pub fn call(&self, ctx: &mut Context<'_>) -> Result<(), NativeError> {
        self.inner.call(ctx)
    }

    /// Build the VM function dispatching to this handler.
    ///
    /// This is the only place host errors become VM failures: the trampoline
    /// gives each call a fresh frame, runs the guard and the handler, and
    /// either returns the values the handler pushed or raises the handler's
    /// error in the VM.
    pub fn into_function(
        self,
        lua: &Lua,
        diagnostics: Rc<Diagnostics>,
        guard: Guard,
    ) -> mlua::Result<Function> {
        lua.create_function(move |lua, args: MultiValue| {
            let frame = RefCell::new(Stack::from_values(args));
            let mut ctx = Context::inbound(lua, &frame);
            trace!(guard = ?guard, arguments = ctx.top(), "dispatching native handler");

            if let Err(err) = guard.check(&ctx).and_then(|()| self.call(&mut ctx)) {
                return Err(ctx.error(err, &diagnostics));
            }

            let pushed = ctx.pushed();
            let returns = frame.borrow_mut().take(pushed);
            Ok(returns.into_iter().collect::<MultiValue>())
        })
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

/// Precondition checked by the trampoline before a handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// No check (global, module and static functions)
    None,
    /// The receiver at position 1 must be a host object tagged `tag`
    Receiver { tag: String },
}

impl Guard {
    /// Require a receiver tagged `tag`.
    pub fn receiver(tag: impl Into<String>) -> Self {
        Guard::Receiver { tag: tag.into() }
    }

    /// Check the guard against the arguments of a call.
    pub fn check(&self, ctx: &Context<'_>) -> Result<(), NativeError> {
        match self {
            Guard::None => Ok(()),
            Guard::Receiver { tag } => {
                let receiver = ctx.arg(1);
                match receiver.tag() {
                    Some(actual) if actual == *tag => Ok(()),
                    Some(actual) => Err(wrong_receiver(tag, actual)),
                    None => Err(wrong_receiver(tag, receiver.kind().to_owned())),
                }
            }
        }
    }
}

fn wrong_receiver(tag: &str, actual: String) -> NativeError {
    ConversionError::WrongType {
        position: 1,
        expected: tag.to_owned(),
        actual,
    }
    .into()
}

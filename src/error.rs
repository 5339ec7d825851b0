//! Errors returned to the embedder.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use luabinder_core::{ConversionError, NativeError};

use crate::ScriptError;

/// Errors that can occur while registering bindings or running scripts.
#[derive(Debug, Error)]
pub enum BinderError {
    /// A chunk failed to compile or run
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// An outbound call failed inside the VM
    #[error("call to '{function}' failed: {message}")]
    Call {
        function: String,
        message: String,
        line: Option<usize>,
    },

    /// An outbound call named a global that is not a function
    #[error("attempt to call '{function}' (a {actual} value)")]
    NotCallable {
        function: String,
        actual: &'static str,
    },

    /// A script file could not be read
    #[error("cannot read '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The engine rejected a state, value or registration
    #[error("engine error: {0}")]
    Engine(#[from] mlua::Error),

    /// A result could not be read as the requested type
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// A value could not be staged as a call argument
    #[error(transparent)]
    Native(#[from] NativeError),

    /// The base loader has already been installed into the VM
    #[error("binder is already materialized - attach further bindings with load()")]
    Sealed,

    /// Values staged for a call are no longer on top of the stack
    #[error("unbalanced stack: expected {expected} staged values on top, found {actual}")]
    Unbalanced { expected: usize, actual: usize },
}

impl BinderError {
    /// 1-based script line of the failure, when one is known.
    pub fn line(&self) -> Option<usize> {
        match self {
            BinderError::Script(err) => err.line(),
            BinderError::Call { line, .. } => *line,
            _ => None,
        }
    }

    /// Check if this is a type-tag identity failure.
    pub fn is_wrong_type(&self) -> bool {
        match self {
            BinderError::Conversion(err) => err.is_wrong_type(),
            BinderError::Native(err) => err.is_wrong_type(),
            _ => false,
        }
    }
}

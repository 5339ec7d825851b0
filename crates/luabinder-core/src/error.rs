//! Error types for native handlers and value conversion.

use thiserror::Error;

/// Errors that can occur when reading a stack position as a host value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The value at the position is not of the requested kind.
    #[error("bad argument #{position}: {expected} expected, got {actual}")]
    TypeMismatch {
        position: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// A tagged host object was expected but the value carries another identity.
    #[error("bad argument #{position}: wrong type, {expected} expected, got {actual}")]
    WrongType {
        position: usize,
        expected: String,
        actual: String,
    },

    /// A string value is not valid UTF-8.
    #[error("bad argument #{position}: invalid UTF-8 string")]
    InvalidUtf8 { position: usize },
}

impl ConversionError {
    /// Check if this is a tagged-object identity failure.
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, ConversionError::WrongType { .. })
    }

    /// Stack position the failed read was made at.
    pub fn position(&self) -> usize {
        match self {
            ConversionError::TypeMismatch { position, .. } => *position,
            ConversionError::WrongType { position, .. } => *position,
            ConversionError::InvalidUtf8 { position } => *position,
        }
    }
}

/// Errors returned by native handlers.
///
/// The dispatch trampoline turns any of these into a VM failure that aborts
/// the running script with the error's message.
#[derive(Debug, Error)]
pub enum NativeError {
    /// An argument could not be converted.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The engine failed while the handler was using it.
    #[error(transparent)]
    Lua(#[from] mlua::Error),

    /// Handler-authored failure.
    #[error("{message}")]
    Other { message: String },
}

impl NativeError {
    /// Create a handler-authored error.
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other {
            message: message.into(),
        }
    }

    /// Check if this error came from a tagged-object identity check.
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, NativeError::Conversion(err) if err.is_wrong_type())
    }
}

impl From<&str> for NativeError {
    fn from(message: &str) -> Self {
        NativeError::other(message)
    }
}

impl From<String> for NativeError {
    fn from(message: String) -> Self {
        NativeError::other(message)
    }
}

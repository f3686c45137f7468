/// zbind Error Types
///
/// A single error type for every failure the binding surfaces. Would-block and
/// context-termination conditions are absorbed below this layer and never
/// appear here.

use thiserror::Error;

/// Main error type for zbind operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZmqError {
    /// The engine reported a failure it cannot recover from
    #[error("{description} ({code})")]
    Native { code: i32, description: String },

    /// Operation attempted on a socket that was already closed
    #[error("Socket closed")]
    Closed,

    /// An argument failed a local precondition before any native call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The call is not valid in the current state of the object
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type alias for zbind operations
pub type Result<T> = std::result::Result<T, ZmqError>;

impl ZmqError {
    /// Create a native error from an engine error code and its description
    pub fn native(code: i32, description: impl Into<String>) -> Self {
        Self::Native {
            code,
            description: description.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// The engine error code, if this error came from the engine
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Native { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Check if this is an engine error with the given code
    #[must_use]
    pub fn is_native(&self, expected: i32) -> bool {
        self.code() == Some(expected)
    }

    /// Check if this error is a local precondition failure (a programming error)
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::InvalidOperation(_))
    }
}

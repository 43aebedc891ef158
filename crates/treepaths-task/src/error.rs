//! Task and callback error types.

use thiserror::Error;
use treepaths_core::{GENERIC_ERROR_CODE, TraversalError};

/// Operation name attached to errors handed to callbacks.
pub const OPERATION_NAME: &str = "Tree.getAllFilepaths";

/// Message used when a failure carries nothing more specific than a status.
pub const GENERIC_FAILURE_MESSAGE: &str = "Method getAllFilepaths has thrown an error.";

/// Errors produced while scheduling or running a task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// The call was malformed. Reported synchronously; nothing is queued.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The walk itself failed.
    #[error(transparent)]
    Traversal(#[from] TraversalError),

    /// A bare non-zero status with no further detail.
    #[error("Operation failed with status {code}")]
    Status { code: i32 },
}

impl TaskError {
    /// Numeric code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::Traversal(err) => err.code(),
            Self::Status { code } => *code,
            Self::InvalidArgument { .. } => GENERIC_ERROR_CODE,
        }
    }
}

/// The single error value a callback receives.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CallbackError {
    /// Error object carrying a message, numeric code and operation name.
    #[error("{message}")]
    Operation {
        message: String,
        errno: i32,
        function: &'static str,
    },

    /// Caller-supplied value forwarded in place of a generic error.
    #[error("{0}")]
    Custom(serde_json::Value),
}

impl CallbackError {
    /// Build the callback error for a failure, at the point it happens.
    ///
    /// A structured error always wins. A bare status is replaced by the
    /// override when one was supplied and is not null, and otherwise becomes
    /// a generic operation error.
    pub fn from_failure(err: TaskError, error_override: Option<&serde_json::Value>) -> Self {
        match err {
            TaskError::Status { code } => match error_override {
                Some(value) if !value.is_null() => Self::Custom(value.clone()),
                _ => Self::operation(GENERIC_FAILURE_MESSAGE, code),
            },
            structured => {
                let errno = structured.code();
                Self::operation(structured.to_string(), errno)
            }
        }
    }

    fn operation(message: impl Into<String>, errno: i32) -> Self {
        Self::Operation {
            message: message.into(),
            errno,
            function: OPERATION_NAME,
        }
    }

    /// Numeric code, if this is an operation error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Operation { errno, .. } => Some(*errno),
            Self::Custom(_) => None,
        }
    }
}

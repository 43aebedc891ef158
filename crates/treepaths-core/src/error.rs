//! Error types for traversal operations.

use thiserror::Error;

use crate::entry::ObjectId;

/// Numeric code reported for failures that carry no source-specific code.
pub const GENERIC_ERROR_CODE: i32 = -1;

/// Errors that abort a traversal.
///
/// Every variant is fatal for the walk that produced it; no partial path
/// list survives one of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TraversalError {
    /// The path buffer could not grow.
    #[error("Failed to grow path buffer to {requested} bytes")]
    Allocation { requested: usize },

    /// A subtree identifier could not be resolved by the source.
    #[error("Failed to look up tree {id} at '{path}': {}", .message.as_deref().unwrap_or("unknown error"))]
    SourceLookupFailed {
        id: ObjectId,
        path: String,
        code: i32,
        message: Option<String>,
    },

    /// The tree nests deeper than the configured limit.
    #[error("Tree depth exceeds limit of {limit} at '{path}'")]
    DepthExceeded { limit: usize, path: String },
}

impl TraversalError {
    /// Numeric code to report to callers.
    pub fn code(&self) -> i32 {
        match self {
            Self::SourceLookupFailed { code, .. } if *code != 0 => *code,
            _ => GENERIC_ERROR_CODE,
        }
    }

    /// Source-provided message, if the failure carried one.
    pub fn source_message(&self) -> Option<&str> {
        match self {
            Self::SourceLookupFailed { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

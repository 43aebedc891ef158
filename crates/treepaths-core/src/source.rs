//! Interface to the object store that holds the trees being walked.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entry::{ObjectId, TreeEntry};

/// Identity of a tree source, used to key shared-access guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId(pub u64);

impl SourceId {
    /// Create a new SourceId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Failure reported by a source, copied out at the failing call.
///
/// Sources commonly keep only a "last error" slot that the next operation
/// overwrites, so implementations must capture it before returning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    /// Numeric error code (non-zero).
    pub code: i32,
    /// Human-readable message, if the source had one.
    pub message: Option<String>,
}

impl SourceError {
    /// Create an error with a code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    /// Create an error that carries only a code.
    pub fn code_only(code: i32) -> Self {
        Self {
            code,
            message: None,
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{message} (code {})", self.code),
            None => write!(f, "error code {}", self.code),
        }
    }
}

impl std::error::Error for SourceError {}

/// A resolved tree whose entries can be enumerated by index.
///
/// Dropping the handle releases it.
pub trait TreeView {
    /// Id of this tree.
    fn id(&self) -> ObjectId;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Entry at `index`, in source-defined order.
    fn entry(&self, index: usize) -> Option<TreeEntry>;

    /// Check if the tree has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An immutable store of trees addressed by [`ObjectId`].
pub trait TreeSource {
    /// Handle type for resolved trees.
    type Tree: TreeView;

    /// Identity of this source.
    fn source_id(&self) -> SourceId;

    /// Resolve a tree by id.
    fn find_tree(&self, id: &ObjectId) -> Result<Self::Tree, SourceError>;
}

impl<S: TreeSource + ?Sized> TreeSource for &S {
    type Tree = S::Tree;

    fn source_id(&self) -> SourceId {
        (**self).source_id()
    }

    fn find_tree(&self, id: &ObjectId) -> Result<Self::Tree, SourceError> {
        (**self).find_tree(id)
    }
}

impl<S: TreeSource + ?Sized> TreeSource for std::sync::Arc<S> {
    type Tree = S::Tree;

    fn source_id(&self) -> SourceId {
        (**self).source_id()
    }

    fn find_tree(&self, id: &ObjectId) -> Result<Self::Tree, SourceError> {
        (**self).find_tree(id)
    }
}

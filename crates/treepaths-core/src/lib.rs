//! Core types and traits for treepaths.
//!
//! This crate provides the fundamental pieces shared by the walker and the
//! task layer: the growable path buffer, the tree-source interface that
//! object stores implement, traversal errors and walk configuration.

mod buffer;
mod config;
mod entry;
mod error;
mod source;

pub use buffer::PathBuffer;
pub use config::{
    DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_DEPTH, DEFAULT_PROGRESS_INTERVAL, WalkConfig,
    WalkConfigBuilder,
};
pub use entry::{EntryKind, ObjectId, ParseObjectIdError, TreeEntry};
pub use error::{GENERIC_ERROR_CODE, TraversalError};
pub use source::{SourceError, SourceId, TreeSource, TreeView};

//! Depth-first tree walking engine for treepaths.
//!
//! This crate walks content-addressed tree snapshots and collects the full
//! path of every file reachable from a root tree.
//!
//! # Overview
//!
//! - **Explicit-stack traversal**, bounded by a configurable depth limit
//! - **Shared path buffer** pushed and restored around every descent
//! - **Progress updates** via broadcast channels
//! - **Sources**: an in-memory store and, with the `git` feature, git
//!   repositories through `git2`
//!
//! # Example
//!
//! ```rust
//! use treepaths_walk::{EntryKind, MemoryStore, TreeEntry, TreeWalker, WalkConfig};
//!
//! let mut store = MemoryStore::new();
//! let sub = store.insert_tree(vec![
//!     TreeEntry::new("c.txt", EntryKind::File, MemoryStore::blob_id(b"c")),
//! ]);
//! let root = store.insert_tree(vec![
//!     TreeEntry::new("a.txt", EntryKind::File, MemoryStore::blob_id(b"a")),
//!     TreeEntry::new("b", EntryKind::Tree, sub),
//! ]);
//!
//! let walker = TreeWalker::new(WalkConfig::default());
//! let output = walker.collect_paths(&store, &root).unwrap();
//! assert_eq!(output.paths, vec!["a.txt", "b/c.txt"]);
//! ```

mod collector;
#[cfg(feature = "git")]
mod git;
mod memory;
mod progress;
mod walker;

pub use collector::PathCollector;
#[cfg(feature = "git")]
pub use git::{GitSource, GitTree};
pub use memory::{MemoryStore, MemoryTree, NOT_FOUND_CODE};
pub use progress::WalkProgress;
pub use walker::{TreeWalker, WalkOutput, WalkStats};

// Re-export core types for convenience
pub use treepaths_core::{
    EntryKind, GENERIC_ERROR_CODE, ObjectId, PathBuffer, SourceError, SourceId, TraversalError,
    TreeEntry, TreeSource, TreeView, WalkConfig,
};

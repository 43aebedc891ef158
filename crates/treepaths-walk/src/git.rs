//! Tree source backed by a git repository.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use compact_str::CompactString;
use git2::{Oid, Repository};

use treepaths_core::{
    EntryKind, ObjectId, SourceError, SourceId, TreeEntry, TreeSource, TreeView,
};

use crate::memory::NOT_FOUND_CODE;

static NEXT_GIT_SOURCE_ID: AtomicU64 = AtomicU64::new(1 << 32);

/// Git repository exposed as a [`TreeSource`].
///
/// `git2::Repository` may be sent between threads but not shared, so lookups
/// serialize on a mutex and copy each tree's entries out before releasing it.
pub struct GitSource {
    id: SourceId,
    repo: Mutex<Repository>,
}

impl GitSource {
    /// Open the repository at `path`, searching parent directories.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        Repository::discover(path)
            .map(Self::from_repository)
            .map_err(source_error)
    }

    /// Wrap an already opened repository.
    pub fn from_repository(repo: Repository) -> Self {
        Self {
            id: SourceId::new(NEXT_GIT_SOURCE_ID.fetch_add(1, Ordering::Relaxed)),
            repo: Mutex::new(repo),
        }
    }

    /// Resolve a revision (`HEAD`, a branch, a commit or tree id) to a tree id.
    pub fn resolve_tree(&self, rev: &str) -> Result<ObjectId, SourceError> {
        let repo = self.lock()?;
        let tree = repo
            .revparse_single(rev)
            .and_then(|object| object.peel_to_tree())
            .map_err(source_error)?;
        Ok(to_object_id(tree.id()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Repository>, SourceError> {
        self.repo
            .lock()
            .map_err(|_| SourceError::new(-1, "repository lock poisoned"))
    }
}

impl std::fmt::Debug for GitSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitSource").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Entries of one git tree, copied out of the repository.
#[derive(Debug, Clone)]
pub struct GitTree {
    id: ObjectId,
    entries: Arc<[TreeEntry]>,
}

impl TreeView for GitTree {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, index: usize) -> Option<TreeEntry> {
        self.entries.get(index).cloned()
    }
}

impl TreeSource for GitSource {
    type Tree = GitTree;

    fn source_id(&self) -> SourceId {
        self.id
    }

    fn find_tree(&self, id: &ObjectId) -> Result<GitTree, SourceError> {
        let oid = Oid::from_bytes(id.as_bytes()).map_err(source_error)?;
        let repo = self.lock()?;
        let tree = repo.find_tree(oid).map_err(source_error)?;

        let entries: Vec<TreeEntry> = tree
            .iter()
            .map(|entry| {
                TreeEntry::new(
                    CompactString::from(String::from_utf8_lossy(entry.name_bytes())),
                    EntryKind::from_mode(entry.filemode() as u32),
                    to_object_id(entry.id()),
                )
            })
            .collect();

        Ok(GitTree {
            id: *id,
            entries: entries.into(),
        })
    }
}

fn to_object_id(oid: Oid) -> ObjectId {
    ObjectId::from_slice(oid.as_bytes()).unwrap_or_else(ObjectId::zero)
}

/// Copy a git2 error out into an owned [`SourceError`].
fn source_error(err: git2::Error) -> SourceError {
    let code = match err.raw_code() {
        0 => NOT_FOUND_CODE,
        code => code,
    };
    SourceError::new(code, err.message())
}

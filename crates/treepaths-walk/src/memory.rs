//! In-memory content-addressed tree store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use treepaths_core::{ObjectId, SourceError, SourceId, TreeEntry, TreeSource, TreeView};

/// Error code reported when an id has no tree behind it.
pub const NOT_FOUND_CODE: i32 = -3;

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Trees held in memory, addressed by the BLAKE3 hash of their entries.
///
/// Inserting the same entries twice yields the same id. Entries may point at
/// ids that were never inserted; looking those up fails, which is how a
/// broken store is modelled.
#[derive(Debug)]
pub struct MemoryStore {
    id: SourceId,
    trees: HashMap<ObjectId, Arc<[TreeEntry]>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            id: SourceId::new(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed)),
            trees: HashMap::new(),
        }
    }

    /// Id for blob content, hashed the same way trees are.
    pub fn blob_id(content: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"blob\0");
        hasher.update(content);
        truncate(hasher.finalize())
    }

    /// Store a tree and return its id.
    pub fn insert_tree(&mut self, entries: Vec<TreeEntry>) -> ObjectId {
        let id = tree_id(&entries);
        self.trees.entry(id).or_insert_with(|| entries.into());
        id
    }

    /// Drop a tree from the store, returning whether it was present.
    pub fn remove_tree(&mut self, id: &ObjectId) -> bool {
        self.trees.remove(id).is_some()
    }

    /// Number of stored trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Check if the store holds no trees.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a tree in a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryTree {
    id: ObjectId,
    entries: Arc<[TreeEntry]>,
}

impl TreeView for MemoryTree {
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

impl TreeSource for MemoryStore {
    type Tree = MemoryTree;

    fn source_id(&self) -> SourceId {
        self.id
    }

    fn find_tree(&self, id: &ObjectId) -> Result<MemoryTree, SourceError> {
        self.trees
            .get(id)
            .map(|entries| MemoryTree {
                id: *id,
                entries: Arc::clone(entries),
            })
            .ok_or_else(|| {
                SourceError::new(NOT_FOUND_CODE, format!("object not found - no match for id ({id})"))
            })
    }
}

/// Hash entries in git's tree layout: `<mode> <name>\0<id>` per entry.
fn tree_id(entries: &[TreeEntry]) -> ObjectId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"tree\0");
    for entry in entries {
        hasher.update(format!("{:o} ", entry.kind.mode()).as_bytes());
        hasher.update(entry.name.as_bytes());
        hasher.update(b"\0");
        hasher.update(entry.id.as_bytes());
    }
    truncate(hasher.finalize())
}

fn truncate(hash: blake3::Hash) -> ObjectId {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[..20]);
    ObjectId::new(bytes)
}

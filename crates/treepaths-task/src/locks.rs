//! Shared-access guards over sources and the trees they hold.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::trace;

use treepaths_core::{ObjectId, SourceId};

/// Object a guard protects.
///
/// Keys order sources before their trees, and acquisition always follows
/// that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    /// A whole tree source.
    Source(SourceId),
    /// One tree inside a source.
    Tree(SourceId, ObjectId),
}

/// Errors acquiring guards.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum LockError {
    /// The registry no longer hands out guards.
    #[error("Lock registry is closed")]
    Closed,
}

enum Guard {
    Shared(#[allow(dead_code)] OwnedRwLockReadGuard<()>),
    Exclusive(#[allow(dead_code)] OwnedRwLockWriteGuard<()>),
}

/// Guards held together; all are released on drop.
pub struct LockSet {
    keys: Vec<LockKey>,
    guards: Vec<Guard>,
}

impl LockSet {
    /// Keys covered by this set, in acquisition order.
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }

    /// Check whether the guards are shared (read) guards.
    pub fn is_shared(&self) -> bool {
        self.guards.iter().all(|g| matches!(g, Guard::Shared(_)))
    }
}

impl std::fmt::Debug for LockSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockSet")
            .field("keys", &self.keys)
            .field("shared", &self.is_shared())
            .finish()
    }
}

/// Registry of read/write locks keyed by [`LockKey`].
///
/// Any number of shared sets may cover a key at once; an exclusive set waits
/// for them to drain and keeps new ones out until it is dropped.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<LockKey, Arc<RwLock<()>>>,
    closed: AtomicBool,
}

impl LockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire shared guards on every key.
    pub async fn shared(&self, keys: &[LockKey]) -> Result<LockSet, LockError> {
        let keys = self.ordered(keys)?;
        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            guards.push(Guard::Shared(self.lock_for(*key).read_owned().await));
        }
        trace!(?keys, "shared guards acquired");
        Ok(LockSet { keys, guards })
    }

    /// Acquire exclusive guards on every key.
    pub async fn exclusive(&self, keys: &[LockKey]) -> Result<LockSet, LockError> {
        let keys = self.ordered(keys)?;
        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            guards.push(Guard::Exclusive(self.lock_for(*key).write_owned().await));
        }
        trace!(?keys, "exclusive guards acquired");
        Ok(LockSet { keys, guards })
    }

    /// Stop handing out guards. Sets already held stay valid.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Check whether the registry is closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Forget locks nobody holds.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Check if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn ordered(&self, keys: &[LockKey]) -> Result<Vec<LockKey>, LockError> {
        if self.is_closed() {
            return Err(LockError::Closed);
        }
        let mut keys = keys.to_vec();
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    fn lock_for(&self, key: LockKey) -> Arc<RwLock<()>> {
        Arc::clone(&self.locks.entry(key).or_default())
    }
}

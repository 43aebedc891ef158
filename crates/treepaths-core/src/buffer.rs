//! Growable path-prefix buffer shared across a single traversal.

use crate::error::TraversalError;

/// Separator appended after every pushed segment.
const SEPARATOR: char = '/';

/// Spare bytes kept past the end of the prefix, so `len < capacity` holds.
const HEADROOM: usize = 1;

/// Smallest capacity that still fits one separator plus headroom.
const MIN_CAPACITY: usize = SEPARATOR.len_utf8() + HEADROOM;

/// The "current directory" prefix of a traversal.
///
/// The buffer holds either nothing (at the root) or a sequence of segments
/// each followed by `/`. Descending into a subtree is a [`push`] that returns
/// the previous length; coming back out is a [`restore`] to that length.
///
/// Capacity is tracked explicitly so growth follows a fixed policy: when an
/// append would not leave at least one spare byte, capacity at least doubles.
/// After any mutation `len() < capacity()` holds. A buffer may carry a
/// ceiling on its capacity; growth past it, like a failed reservation,
/// surfaces as [`TraversalError::Allocation`].
///
/// [`push`]: PathBuffer::push
/// [`restore`]: PathBuffer::restore
#[derive(Debug, Clone)]
pub struct PathBuffer {
    data: String,
    capacity: usize,
    limit: usize,
}

impl PathBuffer {
    /// Create an empty buffer with the given initial capacity.
    ///
    /// Fails with [`TraversalError::Allocation`] when the memory cannot be
    /// reserved.
    pub fn with_capacity(capacity: usize) -> Result<Self, TraversalError> {
        Self::with_limit(capacity, usize::MAX)
    }

    /// Create an empty buffer that never grows past `limit` bytes.
    pub fn with_limit(capacity: usize, limit: usize) -> Result<Self, TraversalError> {
        let capacity = capacity.max(MIN_CAPACITY);
        if capacity > limit {
            return Err(TraversalError::Allocation {
                requested: capacity,
            });
        }

        let mut data = String::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| TraversalError::Allocation {
                requested: capacity,
            })?;
        Ok(Self {
            data,
            capacity,
            limit,
        })
    }

    /// Append `segment` followed by a separator.
    ///
    /// Returns the length before the append, to be handed back to
    /// [`restore`](Self::restore) when the descent ends.
    pub fn push(&mut self, segment: &str) -> Result<usize, TraversalError> {
        let saved = self.data.len();
        let needed = saved
            .saturating_add(segment.len())
            .saturating_add(SEPARATOR.len_utf8() + HEADROOM);
        if needed > self.capacity {
            self.grow(needed)?;
        }

        self.data.push_str(segment);
        self.data.push(SEPARATOR);
        Ok(saved)
    }

    /// Truncate back to a length previously returned by [`push`](Self::push).
    ///
    /// Never reallocates. Restoring to a length beyond the current one is a
    /// no-op.
    pub fn restore(&mut self, saved_len: usize) {
        debug_assert!(
            saved_len <= self.data.len(),
            "restore past end: {saved_len} > {}",
            self.data.len()
        );
        if saved_len < self.data.len() {
            self.data.truncate(saved_len);
        }
    }

    /// Current prefix, empty or ending in `/`.
    pub fn prefix(&self) -> &str {
        &self.data
    }

    /// Full path of `name` under the current prefix.
    pub fn join(&self, name: &str) -> String {
        let mut path = String::with_capacity(self.data.len() + name.len());
        path.push_str(&self.data);
        path.push_str(name);
        path
    }

    /// Length of the current prefix in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether the buffer is at the root.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current capacity under the growth policy.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Capacity ceiling (`usize::MAX` when unbounded).
    pub fn limit(&self) -> usize {
        self.limit
    }

    fn grow(&mut self, needed: usize) -> Result<(), TraversalError> {
        if needed > self.limit {
            return Err(TraversalError::Allocation { requested: needed });
        }

        let target = self.capacity.saturating_mul(2).max(needed).min(self.limit);
        self.data
            .try_reserve_exact(target - self.data.len())
            .map_err(|_| TraversalError::Allocation { requested: target })?;
        self.capacity = target;
        Ok(())
    }
}

impl Default for PathBuffer {
    fn default() -> Self {
        Self {
            data: String::with_capacity(crate::config::DEFAULT_INITIAL_CAPACITY),
            capacity: crate::config::DEFAULT_INITIAL_CAPACITY,
            limit: usize::MAX,
        }
    }
}

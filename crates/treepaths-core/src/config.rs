//! Walk configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::buffer::PathBuffer;
use crate::error::TraversalError;

/// Initial path buffer capacity in bytes.
pub const DEFAULT_INITIAL_CAPACITY: usize = 4096;

/// Deepest nesting a walk accepts before treating the source as corrupt.
pub const DEFAULT_MAX_DEPTH: usize = 4096;

/// Files between progress snapshots.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Configuration for tree walks.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WalkConfig {
    /// Initial capacity of the path buffer.
    #[builder(default = "DEFAULT_INITIAL_CAPACITY")]
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Maximum tree nesting depth.
    #[builder(default = "DEFAULT_MAX_DEPTH")]
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Emit a progress snapshot every N files (0 = never).
    #[builder(default = "DEFAULT_PROGRESS_INTERVAL")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Largest capacity the path buffer may grow to (None = unbounded).
    #[builder(default)]
    #[serde(default)]
    pub buffer_limit: Option<usize>,
}

fn default_initial_capacity() -> usize {
    DEFAULT_INITIAL_CAPACITY
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

impl WalkConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_depth == Some(0) {
            return Err("Max depth must be at least 1".to_string());
        }
        if let (Some(initial), Some(Some(limit))) = (self.initial_capacity, self.buffer_limit) {
            if initial > limit {
                return Err(format!(
                    "Initial capacity {initial} exceeds buffer limit {limit}"
                ));
            }
        }
        Ok(())
    }
}

impl WalkConfig {
    /// Create a new walk config builder.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }

    /// Create an empty path buffer sized for this config.
    pub fn path_buffer(&self) -> Result<PathBuffer, TraversalError> {
        PathBuffer::with_limit(self.initial_capacity, self.buffer_limit.unwrap_or(usize::MAX))
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            buffer_limit: None,
        }
    }
}

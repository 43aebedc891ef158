//! Walk progress reporting.

use std::time::Duration;

/// Progress information during a walk.
#[derive(Debug, Clone, Default)]
pub struct WalkProgress {
    /// Number of file paths collected so far.
    pub files_found: u64,
    /// Number of trees entered so far, root included.
    pub trees_visited: u64,
    /// Prefix of the tree currently being enumerated.
    pub current_prefix: String,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
}

impl WalkProgress {
    /// Calculate the walk rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_found as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

//! Ordered sink for discovered file paths.

/// Append-only, ordered list of full file paths.
///
/// Paths keep the order the walker produced them in: depth-first, siblings
/// in source enumeration order. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathCollector {
    paths: Vec<String>,
}

impl PathCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a path.
    pub fn push(&mut self, path: String) {
        self.paths.push(path);
    }

    /// Number of collected paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Collected paths, in order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Take ownership of the collected paths.
    pub fn into_paths(self) -> Vec<String> {
        self.paths
    }
}

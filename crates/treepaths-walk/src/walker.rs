//! Explicit-stack depth-first tree walker.

use std::ops::Deref;
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use treepaths_core::{
    ObjectId, PathBuffer, TraversalError, TreeEntry, TreeSource, TreeView, WalkConfig,
};

use crate::collector::PathCollector;
use crate::progress::WalkProgress;

/// Summary counters for a finished walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// File entries collected (plain and executable).
    pub files: u64,
    /// Trees entered, root included.
    pub trees: u64,
    /// Entries that were neither files nor trees.
    pub skipped: u64,
    /// Deepest nesting reached (root = 0).
    pub max_depth: usize,
}

/// Paths and counters from a complete walk.
#[derive(Debug, Clone, Default)]
pub struct WalkOutput {
    /// Every file path, in traversal order.
    pub paths: Vec<String>,
    /// Walk statistics.
    pub stats: WalkStats,
}

/// A tree handle on the walk stack: the caller's root, or a subtree the
/// walker resolved and releases when the frame is popped.
enum Handle<'a, T> {
    Root(&'a T),
    Subtree(T),
}

impl<T> Deref for Handle<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Handle::Root(tree) => tree,
            Handle::Subtree(tree) => tree,
        }
    }
}

struct Frame<'a, T> {
    tree: Handle<'a, T>,
    /// Buffer length to restore when leaving this tree.
    saved_len: usize,
    /// Index of the next entry to enumerate.
    cursor: usize,
}

enum Step {
    Visit(TreeEntry),
    Ascend,
    Skip,
}

/// Depth-first walker collecting the path of every file below a tree.
pub struct TreeWalker {
    config: WalkConfig,
    progress_tx: broadcast::Sender<WalkProgress>,
}

impl TreeWalker {
    /// Create a new walker.
    pub fn new(config: WalkConfig) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            config,
            progress_tx,
        }
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkProgress> {
        self.progress_tx.subscribe()
    }

    /// Configuration in use.
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Resolve `root_id` and collect every file path below it.
    ///
    /// Creates a path buffer with the configured initial capacity and limit;
    /// it is released when this call returns, on success or failure. A buffer
    /// that cannot be reserved fails with [`TraversalError::Allocation`].
    pub fn collect_paths<S: TreeSource>(
        &self,
        source: &S,
        root_id: &ObjectId,
    ) -> Result<WalkOutput, TraversalError> {
        let root = source.find_tree(root_id).map_err(|e| {
            warn!(id = %root_id, code = e.code, "root tree lookup failed");
            TraversalError::SourceLookupFailed {
                id: *root_id,
                path: String::new(),
                code: e.code,
                message: e.message,
            }
        })?;

        let mut buffer = self.config.path_buffer()?;
        let mut collector = PathCollector::new();
        let stats = self.walk(source, &root, &mut buffer, &mut collector)?;

        Ok(WalkOutput {
            paths: collector.into_paths(),
            stats,
        })
    }

    /// Walk `root`, appending file paths to `collector`.
    ///
    /// Paths are prefixed with the buffer's current content. On return the
    /// buffer is back at the length it had on entry, whether the walk
    /// succeeded or not. On failure the collector may hold a partial list
    /// that must not be reported.
    pub fn walk<S: TreeSource>(
        &self,
        source: &S,
        root: &S::Tree,
        buffer: &mut PathBuffer,
        collector: &mut PathCollector,
    ) -> Result<WalkStats, TraversalError> {
        let start = Instant::now();
        let mut stats = WalkStats {
            trees: 1,
            ..Default::default()
        };
        let mut stack = vec![Frame {
            tree: Handle::Root(root),
            saved_len: buffer.len(),
            cursor: 0,
        }];

        let result = self.drive(source, &mut stack, buffer, collector, &mut stats, start);

        // Unwind whatever is left so every pending descent is restored
        while let Some(frame) = stack.pop() {
            buffer.restore(frame.saved_len);
        }

        result?;
        debug!(
            root = %root.id(),
            files = stats.files,
            trees = stats.trees,
            skipped = stats.skipped,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tree walk complete"
        );
        Ok(stats)
    }

    fn drive<'a, S: TreeSource>(
        &self,
        source: &S,
        stack: &mut Vec<Frame<'a, S::Tree>>,
        buffer: &mut PathBuffer,
        collector: &mut PathCollector,
        stats: &mut WalkStats,
        start: Instant,
    ) -> Result<(), TraversalError> {
        loop {
            let step = match stack.last_mut() {
                None => return Ok(()),
                Some(frame) if frame.cursor >= frame.tree.len() => Step::Ascend,
                Some(frame) => {
                    let index = frame.cursor;
                    frame.cursor += 1;
                    frame.tree.entry(index).map_or(Step::Skip, Step::Visit)
                }
            };

            let entry = match step {
                Step::Visit(entry) => entry,
                Step::Skip => continue,
                Step::Ascend => {
                    // Dropping the frame releases the subtree handle
                    if let Some(frame) = stack.pop() {
                        buffer.restore(frame.saved_len);
                    }
                    continue;
                }
            };

            if entry.kind.is_file() {
                collector.push(buffer.join(&entry.name));
                stats.files += 1;
                self.report_progress(stats, buffer, start);
            } else if entry.kind.is_tree() {
                let depth = stack.len();
                if depth > self.config.max_depth {
                    return Err(TraversalError::DepthExceeded {
                        limit: self.config.max_depth,
                        path: buffer.join(&entry.name),
                    });
                }

                let subtree = source.find_tree(&entry.id).map_err(|e| {
                    warn!(
                        id = %entry.id,
                        path = %buffer.join(&entry.name),
                        code = e.code,
                        "subtree lookup failed"
                    );
                    TraversalError::SourceLookupFailed {
                        id: entry.id,
                        path: buffer.join(&entry.name),
                        code: e.code,
                        message: e.message,
                    }
                })?;

                let saved_len = buffer.push(&entry.name)?;
                stack.push(Frame {
                    tree: Handle::Subtree(subtree),
                    saved_len,
                    cursor: 0,
                });
                stats.trees += 1;
                stats.max_depth = stats.max_depth.max(depth);
            } else {
                trace!(name = %entry.name, kind = ?entry.kind, "skipping non-file entry");
                stats.skipped += 1;
            }
        }
    }

    fn report_progress(&self, stats: &WalkStats, buffer: &PathBuffer, start: Instant) {
        let interval = self.config.progress_interval;
        if interval == 0 || stats.files % interval != 0 {
            return;
        }

        let _ = self.progress_tx.send(WalkProgress {
            files_found: stats.files,
            trees_visited: stats.trees,
            current_prefix: buffer.prefix().to_string(),
            elapsed: start.elapsed(),
        });
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new(WalkConfig::default())
    }
}

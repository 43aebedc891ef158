//! Deferred "list every file path" task.

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use treepaths_core::{GENERIC_ERROR_CODE, ObjectId, TraversalError, TreeSource};
use treepaths_walk::{PathCollector, TreeWalker, WalkConfig};

use crate::context::{Callback, Context, TaskId};
use crate::error::{CallbackError, TaskError};
use crate::locks::{LockKey, LockRegistry, LockSet};

/// Lifecycle of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Built, not yet holding guards.
    Created,
    /// Shared guards on the tree and source are held.
    LocksAcquired,
    /// The walk is running on the blocking pool.
    Running,
    /// Paths were collected.
    Succeeded,
    /// The task failed; an error will be delivered.
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::LocksAcquired => write!(f, "locks acquired"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "completed (success)"),
            Self::Failed => write!(f, "completed (error)"),
        }
    }
}

/// One request to list every file path under a tree.
///
/// Scheduling moves the task onto the context's runtime: guards are taken
/// there, the walk runs on the blocking pool and the outcome travels back to
/// be delivered by the caller's [`Context`].
pub struct FilepathsTask<S> {
    source: Arc<S>,
    tree: ObjectId,
    config: WalkConfig,
    error_override: Option<serde_json::Value>,
    state: TaskState,
}

impl<S> FilepathsTask<S>
where
    S: TreeSource + Send + Sync + 'static,
{
    /// Create a task listing the files under `tree` in `source`.
    pub fn new(source: Arc<S>, tree: ObjectId) -> Self {
        Self {
            source,
            tree,
            config: WalkConfig::default(),
            error_override: None,
            state: TaskState::Created,
        }
    }

    /// Use a specific walk configuration.
    pub fn with_config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    /// Value to hand to the callback instead of a generic error when the
    /// task fails with a bare status.
    pub fn with_error_override(mut self, value: serde_json::Value) -> Self {
        self.error_override = Some(value);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Queue the task and return immediately.
    ///
    /// Fails synchronously, without queueing anything, when no callback is
    /// supplied.
    pub fn schedule(self, ctx: &mut Context, callback: Option<Callback>) -> Result<TaskId, TaskError> {
        let callback = callback.ok_or_else(|| TaskError::InvalidArgument {
            message: "Callback is required and must be a Function.".to_string(),
        })?;

        let sender = ctx.register(callback);
        let id = sender.id();
        let registry = Arc::clone(ctx.registry());
        debug!(task = %id, tree = %self.tree, "scheduling filepaths task");

        ctx.handle().spawn(async move {
            let outcome = self.run(id, &registry).await;
            sender.complete(outcome);
        });

        Ok(id)
    }

    async fn run(
        mut self,
        id: TaskId,
        registry: &LockRegistry,
    ) -> Result<Vec<String>, CallbackError> {
        let error_override = self.error_override.take();
        let fail = |err: TaskError| CallbackError::from_failure(err, error_override.as_ref());

        let locks = match self.acquire_locks(id, registry).await {
            Ok(locks) => locks,
            Err(err) => {
                self.transition(id, TaskState::Failed);
                return Err(fail(err));
            }
        };

        self.transition(id, TaskState::Running);
        let joined = tokio::task::spawn_blocking(move || {
            let result = self.execute();
            (self, result)
        })
        .await;

        drop(locks);
        registry.prune();

        match joined {
            Ok((mut task, Ok(paths))) => {
                task.transition(id, TaskState::Succeeded);
                Ok(paths)
            }
            Ok((mut task, Err(err))) => {
                task.transition(id, TaskState::Failed);
                Err(fail(err.into()))
            }
            Err(join_err) => {
                warn!(task = %id, error = %join_err, "walk worker did not finish");
                Err(fail(TaskError::Status {
                    code: GENERIC_ERROR_CODE,
                }))
            }
        }
    }

    /// Take shared guards on the source and the tree, sources first.
    async fn acquire_locks(
        &mut self,
        id: TaskId,
        registry: &LockRegistry,
    ) -> Result<LockSet, TaskError> {
        let source_id = self.source.source_id();
        let keys = [
            LockKey::Source(source_id),
            LockKey::Tree(source_id, self.tree),
        ];
        let locks = registry.shared(&keys).await.map_err(|err| {
            warn!(task = %id, error = %err, "failed to acquire guards");
            TaskError::Status {
                code: GENERIC_ERROR_CODE,
            }
        })?;

        self.transition(id, TaskState::LocksAcquired);
        Ok(locks)
    }

    /// Resolve the root and walk it. Runs on the blocking pool.
    fn execute(&self) -> Result<Vec<String>, TraversalError> {
        let root = self.source.find_tree(&self.tree).map_err(|e| {
            TraversalError::SourceLookupFailed {
                id: self.tree,
                path: String::new(),
                code: e.code,
                message: e.message,
            }
        })?;

        let walker = TreeWalker::new(self.config.clone());
        let mut buffer = self.config.path_buffer()?;
        let mut collector = PathCollector::new();
        walker.walk(self.source.as_ref(), &root, &mut buffer, &mut collector)?;

        Ok(collector.into_paths())
    }

    fn transition(&mut self, id: TaskId, next: TaskState) {
        debug!(task = %id, from = %self.state, to = %next, "task state change");
        self.state = next;
    }
}

/// Schedule a task and drive `ctx` until its outcome arrives.
///
/// Other tasks pending on the same context are delivered along the way.
pub async fn get_all_filepaths<S>(
    ctx: &mut Context,
    source: Arc<S>,
    tree: ObjectId,
) -> Result<Vec<String>, CallbackError>
where
    S: TreeSource + Send + Sync + 'static,
{
    let (tx, mut rx) = oneshot::channel();
    let callback: Callback = Box::new(move |outcome| {
        let _ = tx.send(outcome);
    });
    FilepathsTask::new(source, tree)
        .schedule(ctx, Some(callback))
        .map_err(|err| CallbackError::from_failure(err, None))?;

    loop {
        if let Ok(outcome) = rx.try_recv() {
            return outcome;
        }
        if ctx.next().await.is_none() {
            return rx.try_recv().unwrap_or_else(|_| {
                Err(CallbackError::from_failure(
                    TaskError::Status {
                        code: GENERIC_ERROR_CODE,
                    },
                    None,
                ))
            });
        }
    }
}

//! Caller-side context: hands work to the runtime and delivers results.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use treepaths_core::GENERIC_ERROR_CODE;

use crate::error::{CallbackError, TaskError};
use crate::locks::LockRegistry;

/// Callback invoked exactly once with a task's outcome.
pub type Callback = Box<dyn FnOnce(Result<Vec<String>, CallbackError>) + Send + 'static>;

/// Identifier of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// A finished task waiting to be delivered on the caller's context.
pub(crate) struct Completion {
    id: TaskId,
    callback: Callback,
    outcome: Result<Vec<String>, CallbackError>,
}

/// Worker-side end of a task's delivery channel.
///
/// Sends at most one completion. If dropped before [`complete`] is called
/// (the worker was cancelled or panicked) it sends a generic failure, so the
/// callback still fires exactly once.
///
/// [`complete`]: CompletionSender::complete
pub(crate) struct CompletionSender {
    id: TaskId,
    tx: mpsc::UnboundedSender<Completion>,
    callback: Option<Callback>,
}

impl CompletionSender {
    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn complete(mut self, outcome: Result<Vec<String>, CallbackError>) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: Result<Vec<String>, CallbackError>) {
        if let Some(callback) = self.callback.take() {
            let completion = Completion {
                id: self.id,
                callback,
                outcome,
            };
            if self.tx.send(completion).is_err() {
                debug!(task = %self.id, "context dropped before delivery");
            }
        }
    }
}

impl Drop for CompletionSender {
    fn drop(&mut self) {
        if self.callback.is_some() {
            warn!(task = %self.id, "task abandoned before completion");
            let err = TaskError::Status {
                code: GENERIC_ERROR_CODE,
            };
            self.send(Err(CallbackError::from_failure(err, None)));
        }
    }
}

/// Scheduling and delivery context, owned by the caller.
///
/// Work runs on the runtime behind `handle`. Results come back through a
/// queue and callbacks only run when the caller drives the context with
/// [`run_pending`], [`next`] or [`run_until_idle`], one at a time.
///
/// [`run_pending`]: Context::run_pending
/// [`next`]: Context::next
/// [`run_until_idle`]: Context::run_until_idle
pub struct Context {
    handle: Handle,
    registry: Arc<LockRegistry>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    next_id: u64,
    pending: usize,
}

impl Context {
    /// Create a context that runs work on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self::with_registry(handle, Arc::new(LockRegistry::new()))
    }

    /// Create a context sharing an existing lock registry.
    pub fn with_registry(handle: Handle, registry: Arc<LockRegistry>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            handle,
            registry,
            completion_tx,
            completion_rx,
            next_id: 0,
            pending: 0,
        }
    }

    /// Create a context on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Lock registry guarding sources and trees.
    pub fn registry(&self) -> &Arc<LockRegistry> {
        &self.registry
    }

    /// Number of tasks scheduled but not yet delivered.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Deliver every completion that is already available, without waiting.
    pub fn run_pending(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.deliver(completion);
            delivered += 1;
        }
        delivered
    }

    /// Wait for the next completion and deliver it.
    ///
    /// Returns `None` when no task is pending.
    pub async fn next(&mut self) -> Option<TaskId> {
        if self.pending == 0 {
            return None;
        }
        let completion = self.completion_rx.recv().await?;
        Some(self.deliver(completion))
    }

    /// Deliver completions until no task is pending.
    pub async fn run_until_idle(&mut self) -> usize {
        let mut delivered = 0;
        while self.next().await.is_some() {
            delivered += 1;
        }
        delivered
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.handle
    }

    pub(crate) fn register(&mut self, callback: Callback) -> CompletionSender {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending += 1;
        CompletionSender {
            id,
            tx: self.completion_tx.clone(),
            callback: Some(callback),
        }
    }

    fn deliver(&mut self, completion: Completion) -> TaskId {
        self.pending = self.pending.saturating_sub(1);
        debug!(
            task = %completion.id,
            success = completion.outcome.is_ok(),
            "delivering task outcome"
        );
        (completion.callback)(completion.outcome);
        completion.id
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("pending", &self.pending)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

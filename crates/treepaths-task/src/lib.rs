//! Off-thread path listing for treepaths.
//!
//! A [`FilepathsTask`] walks one tree away from the caller: shared guards on
//! the tree and its source are taken on the runtime, the walk itself runs on
//! the blocking pool, and the outcome is queued back to the caller's
//! [`Context`]. The callback fires exactly once, with either every file path
//! or a single error.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use treepaths_task::{Context, FilepathsTask};
//! use treepaths_walk::{MemoryStore, ObjectId};
//!
//! # async fn demo(store: Arc<MemoryStore>, root: ObjectId) {
//! let mut ctx = Context::current();
//! FilepathsTask::new(store, root)
//!     .schedule(
//!         &mut ctx,
//!         Some(Box::new(|outcome| match outcome {
//!             Ok(paths) => println!("{} files", paths.len()),
//!             Err(err) => eprintln!("{err}"),
//!         })),
//!     )
//!     .unwrap();
//! ctx.run_until_idle().await;
//! # }
//! ```

mod context;
mod error;
mod locks;
mod task;

pub use context::{Callback, Context, TaskId};
pub use error::{CallbackError, GENERIC_FAILURE_MESSAGE, OPERATION_NAME, TaskError};
pub use locks::{LockError, LockKey, LockRegistry, LockSet};
pub use task::{FilepathsTask, TaskState, get_all_filepaths};

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::json;
use treepaths_task::{
    Callback, CallbackError, Context, FilepathsTask, GENERIC_FAILURE_MESSAGE, LockKey,
    OPERATION_NAME, TaskError, TaskState, get_all_filepaths,
};
use treepaths_walk::{
    EntryKind, GENERIC_ERROR_CODE, MemoryStore, ObjectId, TreeEntry, TreeSource, WalkConfig,
};

type Outcomes = Arc<Mutex<Vec<Result<Vec<String>, CallbackError>>>>;

fn file(name: &str) -> TreeEntry {
    TreeEntry::new(name, EntryKind::File, MemoryStore::blob_id(name.as_bytes()))
}

fn dir(name: &str, id: ObjectId) -> TreeEntry {
    TreeEntry::new(name, EntryKind::Tree, id)
}

fn sample_store() -> (Arc<MemoryStore>, ObjectId) {
    let mut store = MemoryStore::new();
    let b = store.insert_tree(vec![file("c.txt")]);
    let d = store.insert_tree(vec![]);
    let root = store.insert_tree(vec![file("a.txt"), dir("b", b), dir("d", d)]);
    (Arc::new(store), root)
}

fn broken_store() -> (Arc<MemoryStore>, ObjectId) {
    let mut store = MemoryStore::new();
    let root = store.insert_tree(vec![file("a.txt"), dir("x", ObjectId::new([0x99; 20]))]);
    (Arc::new(store), root)
}

fn recorder() -> (Outcomes, impl Fn() -> Callback) {
    let outcomes: Outcomes = Arc::new(Mutex::new(Vec::new()));
    let shared = Arc::clone(&outcomes);
    let make = move || -> Callback {
        let sink = Arc::clone(&shared);
        Box::new(move |outcome| sink.lock().unwrap().push(outcome))
    };
    (outcomes, make)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_success_delivered_once() {
    let (store, root) = sample_store();
    let (outcomes, callback) = recorder();
    let mut ctx = Context::current();

    FilepathsTask::new(store, root)
        .schedule(&mut ctx, Some(callback()))
        .unwrap();
    assert_eq!(ctx.pending(), 1);
    assert_eq!(ctx.run_until_idle().await, 1);
    assert_eq!(ctx.pending(), 0);

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].as_ref().unwrap(), &vec!["a.txt", "b/c.txt"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unresolvable_subtree_delivers_single_error() {
    let (store, root) = broken_store();
    let (outcomes, callback) = recorder();
    let mut ctx = Context::current();

    FilepathsTask::new(store, root)
        .schedule(&mut ctx, Some(callback()))
        .unwrap();
    ctx.run_until_idle().await;

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    match &outcomes[0] {
        Err(CallbackError::Operation { message, errno, function }) => {
            assert!(!message.is_empty());
            assert_ne!(*errno, 0);
            assert_eq!(*function, OPERATION_NAME);
        }
        other => panic!("expected operation error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_callback_rejected_synchronously() {
    let (store, root) = sample_store();
    let mut ctx = Context::current();

    let err = FilepathsTask::new(store, root)
        .schedule(&mut ctx, None)
        .unwrap_err();
    assert!(matches!(err, TaskError::InvalidArgument { .. }));
    assert_eq!(ctx.pending(), 0);
    assert_eq!(ctx.run_pending(), 0);
    assert!(ctx.next().await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_callback_runs_on_caller_context() {
    let (store, root) = sample_store();
    let caller = thread::current().id();
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let mut ctx = Context::current();

    FilepathsTask::new(store, root)
        .schedule(
            &mut ctx,
            Some(Box::new(move |_| {
                *sink.lock().unwrap() = Some(thread::current().id());
            })),
        )
        .unwrap();
    ctx.run_until_idle().await;

    assert_eq!(*seen.lock().unwrap(), Some(caller));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_shared_walks() {
    let (store, root) = sample_store();
    let (outcomes, callback) = recorder();
    let mut ctx = Context::current();

    for _ in 0..8 {
        FilepathsTask::new(Arc::clone(&store), root)
            .schedule(&mut ctx, Some(callback()))
            .unwrap();
    }
    assert_eq!(ctx.run_until_idle().await, 8);

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 8);
    for outcome in outcomes.iter() {
        assert_eq!(outcome.as_ref().unwrap(), &vec!["a.txt", "b/c.txt"]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_exclusive_guard_holds_back_walk() {
    let (store, root) = sample_store();
    let (outcomes, callback) = recorder();
    let mut ctx = Context::current();

    let exclusive = ctx
        .registry()
        .exclusive(&[LockKey::Source(store.source_id())])
        .await
        .unwrap();

    FilepathsTask::new(Arc::clone(&store), root)
        .schedule(&mut ctx, Some(callback()))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(ctx.run_pending(), 0);
    assert!(outcomes.lock().unwrap().is_empty());

    drop(exclusive);
    assert_eq!(ctx.run_until_idle().await, 1);
    assert!(outcomes.lock().unwrap()[0].is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lock_failure_uses_override() {
    let (store, root) = sample_store();
    let (outcomes, callback) = recorder();
    let mut ctx = Context::current();
    ctx.registry().close();

    FilepathsTask::new(Arc::clone(&store), root)
        .with_error_override(json!({"code": "ECUSTOM"}))
        .schedule(&mut ctx, Some(callback()))
        .unwrap();
    FilepathsTask::new(store, root)
        .schedule(&mut ctx, Some(callback()))
        .unwrap();
    assert_eq!(ctx.run_until_idle().await, 2);

    let outcomes = outcomes.lock().unwrap();
    let custom = outcomes
        .iter()
        .filter(|o| matches!(o, Err(CallbackError::Custom(_))))
        .count();
    assert_eq!(custom, 1);

    let generic = outcomes
        .iter()
        .find_map(|o| match o {
            Err(CallbackError::Operation { message, errno, .. }) => Some((message.clone(), *errno)),
            _ => None,
        })
        .unwrap();
    assert_eq!(generic.0, GENERIC_FAILURE_MESSAGE);
    assert_ne!(generic.1, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_structured_error_ignores_override() {
    let (store, root) = broken_store();
    let (outcomes, callback) = recorder();
    let mut ctx = Context::current();

    FilepathsTask::new(store, root)
        .with_error_override(json!("ignored"))
        .schedule(&mut ctx, Some(callback()))
        .unwrap();
    ctx.run_until_idle().await;

    let outcomes = outcomes.lock().unwrap();
    assert!(matches!(outcomes[0], Err(CallbackError::Operation { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_buffer_growth_failure_delivers_single_error() {
    let mut store = MemoryStore::new();
    let leaf = store.insert_tree(vec![file("never.txt")]);
    let root = store.insert_tree(vec![
        file("a.txt"),
        dir("directory-name-past-the-buffer-limit", leaf),
    ]);
    let config = WalkConfig::builder()
        .initial_capacity(8usize)
        .buffer_limit(16usize)
        .build()
        .unwrap();
    let (outcomes, callback) = recorder();
    let mut ctx = Context::current();

    FilepathsTask::new(Arc::new(store), root)
        .with_config(config)
        .with_error_override(json!("unused for structured errors"))
        .schedule(&mut ctx, Some(callback()))
        .unwrap();
    assert_eq!(ctx.run_until_idle().await, 1);

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    match &outcomes[0] {
        Err(CallbackError::Operation { message, errno, function }) => {
            assert!(message.contains("path buffer"));
            assert_eq!(*errno, GENERIC_ERROR_CODE);
            assert_eq!(*function, OPERATION_NAME);
        }
        other => panic!("expected allocation error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreservable_initial_capacity_is_structured() {
    let (store, root) = sample_store();
    let config = WalkConfig::builder()
        .initial_capacity(usize::MAX)
        .build()
        .unwrap();
    let (outcomes, callback) = recorder();
    let mut ctx = Context::current();

    FilepathsTask::new(store, root)
        .with_config(config)
        .schedule(&mut ctx, Some(callback()))
        .unwrap();
    ctx.run_until_idle().await;

    let outcomes = outcomes.lock().unwrap();
    match &outcomes[0] {
        Err(CallbackError::Operation { message, .. }) => {
            assert_ne!(message, GENERIC_FAILURE_MESSAGE);
            assert!(message.contains("path buffer"));
        }
        other => panic!("expected allocation error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_all_filepaths_is_idempotent() {
    let (store, root) = sample_store();
    let mut ctx = Context::current();

    let first = get_all_filepaths(&mut ctx, Arc::clone(&store), root).await.unwrap();
    let second = get_all_filepaths(&mut ctx, store, root).await.unwrap();
    assert_eq!(first, vec!["a.txt", "b/c.txt"]);
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_all_filepaths_error() {
    let (store, root) = broken_store();
    let mut ctx = Context::current();

    let err = get_all_filepaths(&mut ctx, store, root).await.unwrap_err();
    assert!(err.errno().is_some_and(|code| code != 0));
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_new_task_state() {
    let (store, root) = sample_store();
    let task = FilepathsTask::new(store, root);
    assert_eq!(task.state(), TaskState::Created);
}

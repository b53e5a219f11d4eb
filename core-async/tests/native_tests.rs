//! Integration tests for core-async on native platforms.

use core_async::sync::{OnceCell, Semaphore};
use core_async::task::{self, TaskGroup};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    let result = handle.await.unwrap();
    assert_eq!(result, 42);
}

#[tokio::test]
async fn test_task_group_preserves_spawn_order() {
    let mut group = TaskGroup::new();
    for delay in [30u64, 10, 20] {
        group.spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay
        });
    }

    assert_eq!(group.len(), 3);
    let results = group.join_all().await.unwrap();
    assert_eq!(results, vec![30, 10, 20]);
}

#[tokio::test]
async fn test_task_group_empty() {
    let group: TaskGroup<u8> = TaskGroup::default();
    assert!(group.is_empty());
    assert!(group.join_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_task_group_waits_for_siblings_after_panic() {
    let finished = Arc::new(AtomicUsize::new(0));
    let mut group = TaskGroup::new();

    group.spawn(async { panic!("subtree exploded") });
    for _ in 0..3 {
        let finished = Arc::clone(&finished);
        group.spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            finished.fetch_add(1, Ordering::SeqCst);
        });
    }

    let result = group.join_all().await;
    assert!(result.unwrap_err().is_panic());
    assert_eq!(finished.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_once_cell_single_flight() {
    let cell = Arc::new(OnceCell::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut group = TaskGroup::new();
    for _ in 0..16 {
        let cell = Arc::clone(&cell);
        let calls = Arc::clone(&calls);
        group.spawn(async move {
            *cell
                .get_or_try_init(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok::<_, ()>(99u32)
                })
                .await
                .unwrap()
        });
    }

    let values = group.join_all().await.unwrap();
    assert!(values.iter().all(|v| *v == 99));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_semaphore_limits() {
    let semaphore = Arc::new(Semaphore::new(2));
    let permit1 = semaphore.clone().acquire_owned().await.unwrap();
    let _permit2 = semaphore.clone().acquire_owned().await.unwrap();
    assert_eq!(semaphore.available_permits(), 0);

    drop(permit1);
    assert_eq!(semaphore.available_permits(), 1);
}

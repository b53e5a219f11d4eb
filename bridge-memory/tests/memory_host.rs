//! Integration tests for the in-memory storage host.

use bridge_memory::MemoryStorageHost;
use bridge_traits::{
    AccessMode, EntryKind, ManualClock, PermissionState, StorageHost, WriteMode,
};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use core_async::io::AsyncReadExt;
use std::sync::Arc;

async fn write(host: &MemoryStorageHost, name: &str, data: &'static str) {
    let root = host.root().await.unwrap();
    let file = root.file_child(name, true).await.unwrap();
    let mut sink = file.open_write(WriteMode::Truncate).await.unwrap();
    sink.write(Bytes::from_static(data.as_bytes())).await.unwrap();
    sink.close().await.unwrap();
}

#[tokio::test]
async fn test_root_is_stable() {
    let host = MemoryStorageHost::new();
    let first = host.root().await.unwrap();
    first.directory_child("docs", true).await.unwrap();

    let second = host.root().await.unwrap();
    let children = second.children().await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].kind, EntryKind::Directory);
}

#[tokio::test]
async fn test_missing_child_without_create() {
    let host = MemoryStorageHost::new();
    let root = host.root().await.unwrap();

    let err = root.file_child("absent.txt", false).await.err().unwrap();
    assert!(err.is_not_found());
    let err = root.directory_child("absent", false).await.err().unwrap();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_kind_mismatch() {
    let host = MemoryStorageHost::new();
    let root = host.root().await.unwrap();
    root.directory_child("docs", true).await.unwrap();

    let err = root.file_child("docs", true).await.err().unwrap();
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_sink_commits_only_on_close() {
    let host = MemoryStorageHost::new();
    let root = host.root().await.unwrap();
    let file = root.file_child("draft.txt", true).await.unwrap();

    let mut sink = file.open_write(WriteMode::Truncate).await.unwrap();
    sink.write(Bytes::from_static(b"pending")).await.unwrap();
    assert_eq!(file.metadata().await.unwrap().size, 0);

    sink.close().await.unwrap();
    assert_eq!(file.metadata().await.unwrap().size, 7);

    let mut aborted = file.open_write(WriteMode::Truncate).await.unwrap();
    aborted.write(Bytes::from_static(b"gone")).await.unwrap();
    aborted.abort().await.unwrap();
    assert_eq!(file.read_range(0, 7).await.unwrap(), Bytes::from_static(b"pending"));
}

#[tokio::test]
async fn test_keep_existing_with_seek() {
    let host = MemoryStorageHost::new();
    write(&host, "log.txt", "abc").await;

    let root = host.root().await.unwrap();
    let file = root.file_child("log.txt", false).await.unwrap();
    let mut sink = file.open_write(WriteMode::KeepExisting).await.unwrap();
    sink.seek(3).await.unwrap();
    sink.write(Bytes::from_static(b"def")).await.unwrap();
    sink.close().await.unwrap();

    let mut source = file.open_read().await.unwrap();
    let mut text = String::new();
    source.reader.read_to_string(&mut text).await.unwrap();
    assert_eq!(text, "abcdef");
    assert_eq!(source.metadata.content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn test_remove_child_rules() {
    let host = MemoryStorageHost::new();
    let root = host.root().await.unwrap();
    let docs = root.directory_child("docs", true).await.unwrap();
    docs.file_child("a.txt", true).await.unwrap();

    assert!(root.remove_child("docs", false).await.is_err());
    root.remove_child("docs", true).await.unwrap();
    assert!(root.remove_child("docs", true).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_injected_write_failure() {
    let host = MemoryStorageHost::new();
    host.fail_writes_to("flaky.bin");
    let root = host.root().await.unwrap();
    let file = root.file_child("flaky.bin", true).await.unwrap();

    let mut sink = file.open_write(WriteMode::Truncate).await.unwrap();
    sink.write(Bytes::from_static(b"data")).await.unwrap();
    assert!(sink.close().await.is_err());
    assert_eq!(file.metadata().await.unwrap().size, 0);

    host.clear_write_failures();
    write(&host, "flaky.bin", "data").await;
    assert_eq!(file.metadata().await.unwrap().size, 4);
}

#[tokio::test]
async fn test_usage_estimate() {
    let host = MemoryStorageHost::new();
    assert!(host.estimate_usage().await.unwrap().is_none());

    let host = MemoryStorageHost::new().with_quota(100);
    write(&host, "a.txt", "12345").await;
    let usage = host.estimate_usage().await.unwrap().unwrap();
    assert_eq!(usage.used, 5);
    assert_eq!(usage.quota, 100);
}

#[tokio::test]
async fn test_permission_override() {
    let host = MemoryStorageHost::new();
    let root = host.root().await.unwrap();
    assert_eq!(
        root.query_permission(AccessMode::ReadWrite).await.unwrap(),
        PermissionState::Granted
    );

    host.set_permission(AccessMode::ReadWrite, PermissionState::Denied);
    assert_eq!(
        root.request_permission(AccessMode::ReadWrite).await.unwrap(),
        PermissionState::Denied
    );
    assert!(root.query_permission(AccessMode::Read).await.unwrap().is_granted());
}

#[tokio::test]
async fn test_clock_stamps_modification() {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    let host = MemoryStorageHost::with_clock(clock.clone());

    let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    clock.set(later);
    write(&host, "stamped.txt", "x").await;

    let root = host.root().await.unwrap();
    let file = root.file_child("stamped.txt", false).await.unwrap();
    assert_eq!(file.metadata().await.unwrap().last_modified, Some(later));
}

#[tokio::test]
async fn test_sink_writes_past_the_size_cap_fail() {
    let host = MemoryStorageHost::new().with_max_file_size(8);
    write(&host, "small.bin", "1234").await;
    let root = host.root().await.unwrap();
    let file = root.file_child("small.bin", false).await.unwrap();

    let mut sink = file.open_write(WriteMode::KeepExisting).await.unwrap();
    sink.seek(u64::MAX).await.unwrap();
    let err = sink.write(Bytes::from_static(b"x")).await.unwrap_err();
    assert!(matches!(err, bridge_traits::BridgeError::OperationFailed(_)));

    sink.seek(4).await.unwrap();
    sink.write(Bytes::from_static(b"5678")).await.unwrap();
    assert!(sink.write(Bytes::from_static(b"9")).await.is_err());
    sink.close().await.unwrap();

    assert_eq!(file.read_range(0, 100).await.unwrap().as_ref(), b"12345678");
}

//! Integration tests for the Tokio-backed storage host.

use bridge_desktop::TokioStorageHost;
use bridge_traits::{AccessMode, EntryKind, PermissionState, StorageHost, WriteMode};
use bytes::Bytes;
use core_async::io::AsyncReadExt;

fn host() -> (tempfile::TempDir, TokioStorageHost) {
    let temp = tempfile::tempdir().unwrap();
    let host = TokioStorageHost::new(temp.path().join("sandbox"));
    (temp, host)
}

#[tokio::test]
async fn test_write_commit_and_read_back() {
    let (_temp, host) = host();
    let root = host.root().await.unwrap();
    let docs = root.directory_child("docs", true).await.unwrap();
    let file = docs.file_child("note.md", true).await.unwrap();

    let mut sink = file.open_write(WriteMode::Truncate).await.unwrap();
    sink.write(Bytes::from_static(b"# Title")).await.unwrap();

    // Staged content is invisible, and so is the swap file.
    assert_eq!(file.metadata().await.unwrap().size, 0);
    let listing = docs.children().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "note.md");

    sink.close().await.unwrap();

    let mut source = file.open_read().await.unwrap();
    let mut text = String::new();
    source.reader.read_to_string(&mut text).await.unwrap();
    assert_eq!(text, "# Title");
    assert_eq!(source.metadata.content_type.as_deref(), Some("text/markdown"));
    assert!(source.metadata.last_modified.is_some());
}

#[tokio::test]
async fn test_keep_existing_appends_at_offset() {
    let (_temp, host) = host();
    let root = host.root().await.unwrap();
    let file = root.file_child("log.txt", true).await.unwrap();

    let mut sink = file.open_write(WriteMode::Truncate).await.unwrap();
    sink.write(Bytes::from_static(b"one,")).await.unwrap();
    sink.close().await.unwrap();

    let size = file.metadata().await.unwrap().size;
    let mut sink = file.open_write(WriteMode::KeepExisting).await.unwrap();
    sink.seek(size).await.unwrap();
    sink.write(Bytes::from_static(b"two")).await.unwrap();
    sink.close().await.unwrap();

    assert_eq!(file.read_range(0, 100).await.unwrap(), Bytes::from_static(b"one,two"));
    assert_eq!(file.read_range(4, 7).await.unwrap(), Bytes::from_static(b"two"));
}

#[tokio::test]
async fn test_abort_discards() {
    let (_temp, host) = host();
    let root = host.root().await.unwrap();
    let file = root.file_child("keep.txt", true).await.unwrap();

    let mut sink = file.open_write(WriteMode::Truncate).await.unwrap();
    sink.write(Bytes::from_static(b"nope")).await.unwrap();
    sink.abort().await.unwrap();

    assert_eq!(file.metadata().await.unwrap().size, 0);
    assert_eq!(root.children().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_children_kinds_and_order() {
    let (_temp, host) = host();
    let root = host.root().await.unwrap();
    root.file_child("b.txt", true).await.unwrap();
    root.directory_child("a", true).await.unwrap();

    let children = root.children().await.unwrap();
    let summary: Vec<_> = children.iter().map(|c| (c.name.as_str(), c.kind)).collect();
    assert_eq!(summary, vec![("a", EntryKind::Directory), ("b.txt", EntryKind::File)]);
    assert!(children[0].metadata.is_none());
    assert_eq!(children[1].metadata.as_ref().unwrap().size, 0);
}

#[tokio::test]
async fn test_missing_and_mismatched_children() {
    let (_temp, host) = host();
    let root = host.root().await.unwrap();
    root.directory_child("dir", true).await.unwrap();

    assert!(root.file_child("ghost.txt", false).await.err().unwrap().is_not_found());
    assert!(root.directory_child("ghost", false).await.err().unwrap().is_not_found());
    assert!(!root.file_child("dir", false).await.err().unwrap().is_not_found());
}

#[tokio::test]
async fn test_remove_child() {
    let (_temp, host) = host();
    let root = host.root().await.unwrap();
    let dir = root.directory_child("tree", true).await.unwrap();
    dir.file_child("leaf.txt", true).await.unwrap();

    assert!(root.remove_child("tree", false).await.is_err());
    root.remove_child("tree", true).await.unwrap();
    assert!(root.remove_child("tree", true).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_permissions_follow_readonly_flag() {
    let (_temp, host) = host();
    let root = host.root().await.unwrap();
    let file = root.file_child("locked.txt", true).await.unwrap();
    assert_eq!(
        file.query_permission(AccessMode::ReadWrite).await.unwrap(),
        PermissionState::Granted
    );

    let path = host.base_dir().join("locked.txt");
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_readonly(true);
    std::fs::set_permissions(&path, permissions).unwrap();

    assert_eq!(
        file.query_permission(AccessMode::ReadWrite).await.unwrap(),
        PermissionState::Denied
    );
    assert!(file.query_permission(AccessMode::Read).await.unwrap().is_granted());
}

#[tokio::test]
async fn test_usage_estimation() {
    let (_temp, host) = host();
    assert!(host.estimate_usage().await.unwrap().is_none());

    let temp = tempfile::tempdir().unwrap();
    let host = TokioStorageHost::new(temp.path()).with_quota(1_000);
    let root = host.root().await.unwrap();
    let nested = root.directory_child("nested", true).await.unwrap();
    let file = nested.file_child("data.bin", true).await.unwrap();
    let mut sink = file.open_write(WriteMode::Truncate).await.unwrap();
    sink.write(Bytes::from(vec![0u8; 128])).await.unwrap();
    sink.close().await.unwrap();

    let usage = host.estimate_usage().await.unwrap().unwrap();
    assert_eq!(usage.used, 128);
    assert_eq!(usage.quota, 1_000);
}

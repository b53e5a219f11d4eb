//! Recursive operations built on the tree walker.

use bridge_memory::MemoryStorageHost;
use core_runtime::config::StorageConfig;
use core_storage::{EntryKind, Storage, StorageError};
use std::collections::BTreeSet;
use std::sync::Arc;

async fn seeded() -> (Storage, Arc<MemoryStorageHost>) {
    let host = Arc::new(MemoryStorageHost::new());
    let storage = Storage::with_host(host.clone());
    storage.write("a/x.txt", "x").await.unwrap();
    storage.write("a/b/y.txt", "yy").await.unwrap();
    storage.write("a/b/c/z.txt", "zzz").await.unwrap();
    storage.create_directory("a/empty").await.unwrap();
    storage.write("top.txt", "top").await.unwrap();
    (storage, host)
}

fn set(items: Vec<String>) -> BTreeSet<String> {
    items.into_iter().collect()
}

#[tokio::test]
async fn test_recursive_file_enumeration() {
    let (storage, _) = seeded().await;

    let files = storage.list_files_recursive("a").await.unwrap();
    assert_eq!(
        set(files),
        set(vec![
            "a/x.txt".into(),
            "a/b/y.txt".into(),
            "a/b/c/z.txt".into()
        ])
    );

    let all = storage.list_files_recursive("").await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.contains(&"top.txt".to_string()));
}

#[tokio::test]
async fn test_recursive_directory_enumeration_includes_root() {
    let (storage, _) = seeded().await;
    let dirs = storage.list_directories_recursive("a").await.unwrap();
    assert_eq!(
        set(dirs),
        set(vec![
            "a".into(),
            "a/b".into(),
            "a/b/c".into(),
            "a/empty".into()
        ])
    );
}

#[tokio::test]
async fn test_enumeration_of_missing_directory() {
    let (storage, _) = seeded().await;
    let err = storage.list_files_recursive("nowhere").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_snapshot_keeps_listing_order() {
    let (storage, _) = seeded().await;
    let tree = storage.tree_snapshot("").await.unwrap();
    assert_eq!(tree.kind, EntryKind::Directory);

    let names: Vec<_> = tree.children.iter().map(|c| c.name.as_str()).collect();
    let listed: Vec<_> = storage
        .list_directory("")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, listed);

    let a = tree.children.iter().find(|c| c.name == "a").unwrap();
    let a_names: Vec<_> = a.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(a_names, vec!["b", "empty", "x.txt"]);
}

#[tokio::test]
async fn test_render_tree() {
    let (storage, _) = seeded().await;
    let rendered = storage.render_tree("a").await.unwrap();
    let expected = "\
a/
├── b/
│   ├── c/
│   │   └── z.txt
│   └── y.txt
├── empty/
└── x.txt";
    assert_eq!(rendered, expected);
}

#[tokio::test]
async fn test_directory_size_and_export() {
    let (storage, _) = seeded().await;
    assert_eq!(storage.directory_size("a").await.unwrap(), 6);
    assert_eq!(storage.directory_size("").await.unwrap(), 9);

    let mut exported = storage.export_directory("a/b").await.unwrap();
    exported.sort_by(|l, r| l.path.cmp(&r.path));
    let paths: Vec<_> = exported.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["c/z.txt", "y.txt"]);
    assert_eq!(exported[0].contents.as_ref(), b"zzz");
}

#[tokio::test]
async fn test_rename_directory_moves_everything() {
    let (storage, _) = seeded().await;
    storage.rename_directory("a", "moved/a2").await.unwrap();

    assert!(!storage.exists("a").await);
    assert_eq!(storage.read_text("moved/a2/x.txt").await.unwrap(), "x");
    assert_eq!(storage.read_text("moved/a2/b/y.txt").await.unwrap(), "yy");
    assert_eq!(storage.read_text("moved/a2/b/c/z.txt").await.unwrap(), "zzz");
    assert!(storage.directory_exists("moved/a2/empty").await);
    assert!(storage.exists("top.txt").await);
}

#[tokio::test]
async fn test_rename_directory_rejects_root_and_own_subtree() {
    let (storage, _) = seeded().await;

    let err = storage.rename_directory("", "elsewhere").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidOperation(_)));

    let err = storage.rename_directory("a", "a/b/inner").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidOperation(_)));
    assert!(storage.exists("a/b/c/z.txt").await);

    storage.rename_directory("a", "a/.").await.unwrap();
    assert!(storage.exists("a/x.txt").await);

    let err = storage.rename_directory("ghost", "spirit").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_rename_directory_into_ancestor_is_rejected() {
    let (storage, _) = seeded().await;
    storage.write("a/b/b/f.txt", "precious").await.unwrap();

    let err = storage.rename_directory("a/b", "a").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidOperation(_)));
    let err = storage.rename_directory("a/b", "").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidOperation(_)));

    assert_eq!(storage.read_text("a/b/b/f.txt").await.unwrap(), "precious");
    assert_eq!(storage.read_text("a/b/y.txt").await.unwrap(), "yy");
    assert_eq!(storage.list_files_recursive("a/b").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_copy_directory_rejects_overlapping_trees() {
    let (storage, _) = seeded().await;
    storage.write("a/b/b/y.txt", "inner").await.unwrap();

    let err = storage.copy_directory("a/b", "a").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidOperation(_)));
    let err = storage.copy_directory("a", "a/b/copy").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidOperation(_)));

    assert_eq!(storage.read_text("a/b/y.txt").await.unwrap(), "yy");
    assert_eq!(storage.read_text("a/b/b/y.txt").await.unwrap(), "inner");
    assert!(!storage.exists("a/b/copy").await);
}

#[tokio::test]
async fn test_rename_directory_partial_failure_keeps_source() {
    let (storage, host) = seeded().await;
    host.fail_writes_to("y.txt");

    let err = storage.rename_directory("a", "dest").await.unwrap_err();
    assert!(matches!(err, StorageError::Host(_)));

    // Source untouched.
    assert_eq!(storage.read_text("a/x.txt").await.unwrap(), "x");
    assert_eq!(storage.read_text("a/b/y.txt").await.unwrap(), "yy");
    assert_eq!(storage.read_text("a/b/c/z.txt").await.unwrap(), "zzz");

    // Destination holds the copies that committed; the failed one stays empty.
    assert_eq!(storage.read_text("dest/x.txt").await.unwrap(), "x");
    assert_eq!(storage.read_text("dest/b/c/z.txt").await.unwrap(), "zzz");
    assert_eq!(storage.read_bytes("dest/b/y.txt").await.unwrap().len(), 0);

    host.clear_write_failures();
    storage.rename_directory("a", "dest").await.unwrap();
    assert_eq!(storage.read_text("dest/b/y.txt").await.unwrap(), "yy");
    assert!(!storage.exists("a").await);
}

#[tokio::test]
async fn test_copy_directory_merges() {
    let (storage, _) = seeded().await;
    storage.write("backup/existing.txt", "e").await.unwrap();

    let copied = storage.copy_directory("a/b", "backup").await.unwrap();
    assert_eq!(copied, 2);
    assert_eq!(storage.read_text("backup/y.txt").await.unwrap(), "yy");
    assert_eq!(storage.read_text("backup/c/z.txt").await.unwrap(), "zzz");
    assert!(storage.exists("backup/existing.txt").await);
    assert!(storage.exists("a/b/y.txt").await);

    assert_eq!(storage.copy_directory("a", "a").await.unwrap(), 0);
}

#[tokio::test]
async fn test_bounded_fan_out_completes() {
    let host = Arc::new(MemoryStorageHost::new());
    let config = StorageConfig::builder()
        .host(host)
        .max_concurrent_tasks(1)
        .build()
        .unwrap();
    let storage = Storage::new(config).unwrap();

    for i in 0..5 {
        for j in 0..3 {
            storage
                .write(&format!("deep/{i}/{j}/leaf.txt"), format!("{i}-{j}"))
                .await
                .unwrap();
        }
    }

    let files = storage.list_files_recursive("deep").await.unwrap();
    assert_eq!(files.len(), 15);
    storage.rename_directory("deep", "shallow").await.unwrap();
    assert_eq!(storage.read_text("shallow/4/2/leaf.txt").await.unwrap(), "4-2");
}

//! # Tree Walker
//!
//! Recursive traversal shared by the tree-shaped operations.
//!
//! Each directory is listed exactly once. Its subdirectories are then walked
//! concurrently, one task per subtree in a [`TaskGroup`], and the group is
//! joined before the level returns. Results are reassembled in listing
//! order, so the output does not depend on task completion order.
//!
//! Host calls made by the walker hold a permit from the context's I/O
//! semaphore. Permits are never held across a join, so deep trees cannot
//! starve their own subtrees.
//!
//! Every task of a group is joined. The first failure is returned; further
//! failures are logged so that none of them vanishes silently.

use bridge_traits::storage::{DirectoryHandle, EntryKind};
use core_async::TaskGroup;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::entry::ExportedFile;
use crate::error::{Result, StorageError};
use crate::navigator::StorageContext;
use crate::path::StoragePath;
use crate::tree::TreeNode;

/// Snapshot of the directory tree rooted at `path`.
pub(crate) async fn tree_at(ctx: &Arc<StorageContext>, path: &StoragePath) -> Result<TreeNode> {
    let dir = ctx.directory_at(path, false).await?;
    snapshot(Arc::clone(ctx), dir, path.clone()).await
}

fn snapshot(
    ctx: Arc<StorageContext>,
    dir: Arc<dyn DirectoryHandle>,
    path: StoragePath,
) -> BoxFuture<'static, Result<TreeNode>> {
    async move {
        let shown = path.to_string();
        let listing = ctx
            .throttled(dir.children())
            .await?
            .map_err(|e| StorageError::from_host(&shown, e))?;

        let mut slots = Vec::with_capacity(listing.len());
        let mut group: TaskGroup<Result<TreeNode>> = TaskGroup::new();
        for child in listing {
            let child_path = path.child(&child.name);
            match child.kind {
                EntryKind::File => slots.push(Some(TreeNode {
                    name: child.name,
                    path: child_path.to_string(),
                    kind: EntryKind::File,
                    metadata: child.metadata,
                    children: Vec::new(),
                })),
                EntryKind::Directory => {
                    slots.push(None);
                    let ctx = Arc::clone(&ctx);
                    let parent = Arc::clone(&dir);
                    group.spawn(async move {
                        let subdir = ctx
                            .throttled(parent.directory_child(&child.name, false))
                            .await?
                            .map_err(|e| StorageError::from_host(&child_path.to_string(), e))?;
                        snapshot(ctx, subdir, child_path).await
                    });
                }
            }
        }

        let mut subtrees = join_group(group, "snapshot").await?.into_iter();
        let children = slots
            .into_iter()
            .filter_map(|slot| slot.or_else(|| subtrees.next()))
            .collect();

        Ok(TreeNode {
            name: path.name().unwrap_or_default().to_string(),
            path: shown,
            kind: EntryKind::Directory,
            metadata: None,
            children,
        })
    }
    .boxed()
}

/// Joins every task of `group`, returning the first failure.
pub(crate) async fn join_group<T>(
    group: TaskGroup<Result<T>>,
    operation: &'static str,
) -> Result<Vec<T>>
where
    T: Send + 'static,
{
    let outcomes = group.join_all().await?;
    let mut values = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    let mut failures = 0usize;

    for outcome in outcomes {
        match outcome {
            Ok(value) => values.push(value),
            Err(err) => {
                failures += 1;
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    warn!(operation, error = %err, "Additional subtree failure");
                }
            }
        }
    }

    match first_error {
        Some(err) => {
            warn!(operation, failures, "Tree operation failed");
            Err(err)
        }
        None => Ok(values),
    }
}

/// Copies the tree at `src` to `dest`, returning the number of files copied.
///
/// Files are copied concurrently; each destination parent is created on
/// demand. Empty directories are recreated as well. The source is never
/// modified. `src` and `dest` must not contain one another.
pub(crate) async fn copy_tree(
    ctx: &Arc<StorageContext>,
    src: &StoragePath,
    dest: &StoragePath,
) -> Result<usize> {
    ensure_disjoint(src, dest)?;
    let tree = tree_at(ctx, src).await?;
    ctx.directory_at(dest, true).await?;

    let mut group: TaskGroup<Result<()>> = TaskGroup::new();
    let mut copied = 0usize;
    for node in tree.files() {
        let from = StoragePath::parse(&node.path);
        let to = relocate(&from, src, dest)?;
        let ctx = Arc::clone(ctx);
        copied += 1;
        group.spawn(async move {
            ctx.throttled(async {
                let data = ctx.read_all(&from).await?;
                ctx.write_all(&to, data).await
            })
            .await?
        });
    }
    for node in tree.directories() {
        if !node.children.is_empty() || node.path == tree.path {
            continue;
        }
        let to = relocate(&StoragePath::parse(&node.path), src, dest)?;
        let ctx = Arc::clone(ctx);
        group.spawn(async move {
            ctx.throttled(ctx.directory_at(&to, true)).await??;
            Ok(())
        });
    }

    join_group(group, "copy_tree").await?;
    debug!(files = copied, "Copied directory tree");
    Ok(copied)
}

/// Rejects trees where either path lies inside the other.
///
/// Copies out of such a tree can land back inside the source, where they
/// would overwrite files still being read or be removed with the source.
fn ensure_disjoint(src: &StoragePath, dest: &StoragePath) -> Result<()> {
    if dest.starts_with(src) {
        return Err(StorageError::InvalidOperation(format!(
            "{dest} is inside {src}"
        )));
    }
    if src.starts_with(dest) {
        return Err(StorageError::InvalidOperation(format!(
            "{dest} contains {src}"
        )));
    }
    Ok(())
}

fn relocate(path: &StoragePath, src: &StoragePath, dest: &StoragePath) -> Result<StoragePath> {
    let relative = path.strip_prefix(src).ok_or_else(|| {
        StorageError::InvalidOperation(format!("{path} is outside of {src}"))
    })?;
    Ok(relative
        .segments()
        .iter()
        .fold(dest.clone(), |acc, segment| acc.child(segment)))
}

/// Copy-then-delete move of a directory tree.
///
/// Not atomic. If a copy fails, the error is returned after every other copy
/// has finished: the destination holds whatever was copied and the source is
/// untouched. The source is removed only once every copy succeeded; if that
/// removal fails both trees are left populated.
pub(crate) async fn move_tree(
    ctx: &Arc<StorageContext>,
    src: &StoragePath,
    dest: &StoragePath,
) -> Result<usize> {
    let Some(name) = src.name() else {
        return Err(StorageError::InvalidOperation(
            "cannot rename the storage root".to_string(),
        ));
    };
    if src == dest {
        ctx.directory_at(src, false).await?;
        return Ok(0);
    }
    ensure_disjoint(src, dest)?;

    let copied = copy_tree(ctx, src, dest).await?;

    let parent = match src.parent() {
        Some(parent) => ctx.directory_at(&parent, false).await?,
        None => ctx.root().await?,
    };
    parent
        .remove_child(name, true)
        .await
        .map_err(|e| StorageError::from_host(&src.to_string(), e))?;

    info!(from = %src, to = %dest, files = copied, "Moved directory tree");
    Ok(copied)
}

/// Contents of every file under `path`, paths relative to `path`.
pub(crate) async fn export_tree(
    ctx: &Arc<StorageContext>,
    path: &StoragePath,
) -> Result<Vec<ExportedFile>> {
    let tree = tree_at(ctx, path).await?;

    let mut group: TaskGroup<Result<ExportedFile>> = TaskGroup::new();
    for node in tree.files() {
        let full = StoragePath::parse(&node.path);
        let relative = full
            .strip_prefix(path)
            .map(|p| p.to_string())
            .unwrap_or_else(|| full.to_string());
        let ctx = Arc::clone(ctx);
        group.spawn(async move {
            let contents = ctx.throttled(ctx.read_all(&full)).await??;
            Ok(ExportedFile {
                path: relative,
                contents,
            })
        });
    }

    join_group(group, "export").await
}

/// Removes every entry below the root, leaving the root itself in place.
pub(crate) async fn clear_root(ctx: &Arc<StorageContext>) -> Result<usize> {
    let root = ctx.root().await?;
    let listing = root
        .children()
        .await
        .map_err(|e| StorageError::from_host("", e))?;

    let mut group: TaskGroup<Result<()>> = TaskGroup::new();
    for child in listing {
        let ctx = Arc::clone(ctx);
        let root = Arc::clone(&root);
        group.spawn(async move {
            ctx.throttled(root.remove_child(&child.name, true))
                .await?
                .map_err(|e| StorageError::from_host(&child.name, e))
        });
    }

    let removed = join_group(group, "clear_all").await?.len();
    info!(entries = removed, "Cleared storage root");
    Ok(removed)
}

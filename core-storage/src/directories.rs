//! # Directory Operations
//!
//! Listing, creation, removal and the recursive operations built on the
//! tree walker.
//!
//! `rename_directory` and `copy_directory` copy file by file. A move is not
//! atomic: on failure the destination may hold a partial copy while the
//! source stays intact.

use bridge_traits::storage::EntryKind;
use tracing::{debug, info, instrument};

use crate::entry::{DirectoryEntry, ExportedFile};
use crate::error::{Result, StorageError};
use crate::path::StoragePath;
use crate::storage::Storage;
use crate::tree::TreeNode;
use crate::walker;

impl Storage {
    /// Immediate children of the directory at `path`.
    ///
    /// Files carry their metadata, directories only their kind.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<DirectoryEntry>> {
        let path = StoragePath::parse(path);
        let dir = self.context().directory_at(&path, false).await?;
        let children = dir
            .children()
            .await
            .map_err(|e| StorageError::from_host(&path.to_string(), e))?;
        Ok(children
            .into_iter()
            .map(|child| DirectoryEntry::from_child(&path, child))
            .collect())
    }

    /// Creates the directory at `path` and any missing parents. Idempotent.
    #[instrument(skip(self))]
    pub async fn create_directory(&self, path: &str) -> Result<()> {
        self.context().resolve_directory(path, true).await?;
        Ok(())
    }

    /// `true` when a directory exists at `path`. Never fails.
    pub async fn directory_exists(&self, path: &str) -> bool {
        self.context()
            .resolve(path, EntryKind::Directory, false)
            .await
            .is_ok()
    }

    /// Removes the directory at `path` together with its contents.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidOperation`] for the root; use
    ///   [`clear_all`](Self::clear_all) to empty it
    /// - [`StorageError::NotFound`] when the directory is absent
    #[instrument(skip(self))]
    pub async fn delete_directory(&self, path: &str) -> Result<()> {
        let path = StoragePath::parse(path);
        if path.is_root() {
            return Err(StorageError::InvalidOperation(
                "cannot delete the storage root".to_string(),
            ));
        }
        // Make sure the entry really is a directory before removing it.
        self.context().directory_at(&path, false).await?;
        let (parent, name) = self
            .context()
            .resolve_parent(&path.to_string(), false)
            .await?;
        parent
            .remove_child(&name, true)
            .await
            .map_err(|e| StorageError::from_host(&path.to_string(), e))?;
        debug!(path = %path, "Deleted directory");
        Ok(())
    }

    /// Moves a directory tree by copying it and removing the original.
    ///
    /// Not atomic. A failed copy leaves the source untouched and a partial
    /// tree at `new_path`; the error is returned once every copy finished.
    #[instrument(skip(self))]
    pub async fn rename_directory(&self, old_path: &str, new_path: &str) -> Result<()> {
        let (old, new) = (StoragePath::parse(old_path), StoragePath::parse(new_path));
        walker::move_tree(self.context(), &old, &new).await?;
        Ok(())
    }

    /// Copies a directory tree to `dest`, merging into it if it exists.
    ///
    /// Returns the number of files copied.
    #[instrument(skip(self))]
    pub async fn copy_directory(&self, src: &str, dest: &str) -> Result<usize> {
        let (src, dest) = (StoragePath::parse(src), StoragePath::parse(dest));
        if src == dest {
            self.context().directory_at(&src, false).await?;
            return Ok(0);
        }
        let copied = walker::copy_tree(self.context(), &src, &dest).await?;
        info!(from = %src, to = %dest, files = copied, "Copied directory");
        Ok(copied)
    }

    /// Paths of every file under `path`, at any depth.
    pub async fn list_files_recursive(&self, path: &str) -> Result<Vec<String>> {
        let tree = self.tree_snapshot(path).await?;
        Ok(tree.files().into_iter().map(|n| n.path.clone()).collect())
    }

    /// Paths of `path` itself and every directory under it.
    pub async fn list_directories_recursive(&self, path: &str) -> Result<Vec<String>> {
        let tree = self.tree_snapshot(path).await?;
        Ok(tree
            .directories()
            .into_iter()
            .map(|n| n.path.clone())
            .collect())
    }

    /// Snapshot of the tree rooted at `path`.
    pub async fn tree_snapshot(&self, path: &str) -> Result<TreeNode> {
        walker::tree_at(self.context(), &StoragePath::parse(path)).await
    }

    /// Box-drawing rendering of the tree rooted at `path`.
    pub async fn render_tree(&self, path: &str) -> Result<String> {
        Ok(self.tree_snapshot(path).await?.render())
    }

    /// Relative path and bytes of every file under `path`.
    #[instrument(skip(self))]
    pub async fn export_directory(&self, path: &str) -> Result<Vec<ExportedFile>> {
        let exported = walker::export_tree(self.context(), &StoragePath::parse(path)).await?;
        debug!(files = exported.len(), "Exported directory");
        Ok(exported)
    }

    /// Total size in bytes of the files under `path`.
    pub async fn directory_size(&self, path: &str) -> Result<u64> {
        Ok(self.tree_snapshot(path).await?.total_size())
    }
}

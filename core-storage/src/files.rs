//! # File Operations
//!
//! Path-based file operations on [`Storage`]. Each call resolves its handles
//! from the root; nothing is cached between calls.
//!
//! `rename` is a copy followed by a delete and is not atomic: if the delete
//! fails after the copy committed, both paths hold the content.

use bridge_traits::storage::{EntryKind, WriteMode};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, instrument};

use crate::content::FileContent;
use crate::entry::EntryMetadata;
use crate::error::{Result, StorageError};
use crate::navigator::commit;
use crate::path::StoragePath;
use crate::payload::Payload;
use crate::storage::Storage;
use crate::stream::FileWriter;

impl Storage {
    /// Replaces the content of the file at `path`, creating the file and any
    /// missing parent directories.
    ///
    /// # Errors
    ///
    /// [`StorageError::UnsupportedType`] for a structured payload. The file
    /// is still created in that case; a new file is left empty and an
    /// existing one keeps its content.
    #[instrument(skip(self, data))]
    pub async fn write(&self, path: &str, data: impl Into<Payload>) -> Result<()> {
        let path = StoragePath::parse(path);
        let data: Payload = data.into();
        let file = self.context().file_at(&path, true).await?;
        let bytes = data.into_bytes()?;
        let size = bytes.len();

        let sink = file
            .open_write(WriteMode::Truncate)
            .await
            .map_err(|e| StorageError::from_host(&path.to_string(), e))?;
        commit(sink, None, bytes)
            .await
            .map_err(|e| StorageError::from_host(&path.to_string(), e))?;

        debug!(path = %path, size, "Wrote file");
        Ok(())
    }

    /// Serializes `value` as JSON and writes it to `path`.
    pub async fn write_json<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<()> {
        self.write(path, Payload::json(value)?).await
    }

    /// Appends to an existing file without touching its current bytes.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] when the file does not exist
    /// - [`StorageError::UnsupportedType`] for a structured payload
    #[instrument(skip(self, data))]
    pub async fn append(&self, path: &str, data: impl Into<Payload>) -> Result<()> {
        let path = StoragePath::parse(path);
        let data: Payload = data.into();
        let shown = path.to_string();
        let file = self.context().file_at(&path, false).await?;
        let bytes = data.into_bytes()?;

        let current = file
            .metadata()
            .await
            .map_err(|e| StorageError::from_host(&shown, e))?;
        let sink = file
            .open_write(WriteMode::KeepExisting)
            .await
            .map_err(|e| StorageError::from_host(&shown, e))?;
        let appended = bytes.len();
        commit(sink, Some(current.size), bytes)
            .await
            .map_err(|e| StorageError::from_host(&shown, e))?;

        debug!(path = %shown, offset = current.size, appended, "Appended to file");
        Ok(())
    }

    /// Lazy content view of the file at `path`.
    pub async fn read(&self, path: &str) -> Result<FileContent> {
        let path = StoragePath::parse(path);
        let file = self.context().file_at(&path, false).await?;
        Ok(FileContent::new(file, path.to_string()))
    }

    pub async fn read_bytes(&self, path: &str) -> Result<Bytes> {
        self.read(path).await?.as_bytes().await
    }

    pub async fn read_text(&self, path: &str) -> Result<String> {
        self.read(path).await?.as_text().await
    }

    pub async fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.read(path).await?.as_json().await
    }

    /// Bytes in `[start, end)` of the file at `path`.
    ///
    /// The range is clamped to the file; an empty or inverted range yields
    /// empty bytes rather than an error.
    pub async fn read_file_chunk(&self, path: &str, start: u64, end: u64) -> Result<Bytes> {
        let path = StoragePath::parse(path);
        let shown = path.to_string();
        let file = self.context().file_at(&path, false).await?;
        let size = file
            .metadata()
            .await
            .map_err(|e| StorageError::from_host(&shown, e))?
            .size;

        let start = start.min(size);
        let end = end.min(size);
        if start >= end {
            return Ok(Bytes::new());
        }
        file.read_range(start, end)
            .await
            .map_err(|e| StorageError::from_host(&shown, e))
    }

    /// Removes the file or empty directory at `path`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidOperation`] for the root
    /// - [`StorageError::NotFound`] when the entry is absent
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<()> {
        let (parent, name) = self.context().resolve_parent(path, false).await?;
        parent
            .remove_child(&name, false)
            .await
            .map_err(|e| StorageError::from_host(&resolve_display(path), e))?;
        debug!(path, "Deleted entry");
        Ok(())
    }

    /// Copies the bytes of `src` to `dest`, replacing `dest`.
    #[instrument(skip(self))]
    pub async fn copy(&self, src: &str, dest: &str) -> Result<()> {
        let (src, dest) = (StoragePath::parse(src), StoragePath::parse(dest));
        let data = self.context().read_all(&src).await?;
        if src == dest {
            return Ok(());
        }
        self.context().write_all(&dest, data).await
    }

    /// Moves a file by copying it to `new_path` and deleting `old_path`.
    ///
    /// Not atomic: if the delete fails, both paths hold the content and the
    /// error is returned.
    #[instrument(skip(self))]
    pub async fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        let (old, new) = (StoragePath::parse(old_path), StoragePath::parse(new_path));
        let data = self.context().read_all(&old).await?;
        if old == new {
            return Ok(());
        }
        self.context().write_all(&new, data).await?;
        self.delete(&old.to_string()).await?;
        info!(from = %old, to = %new, "Renamed file");
        Ok(())
    }

    /// `true` when a file or directory exists at `path`. Never fails.
    pub async fn exists(&self, path: &str) -> bool {
        self.context()
            .resolve_entry(&StoragePath::parse(path))
            .await
            .is_ok()
    }

    /// `true` when a file exists at `path`. Never fails.
    pub async fn file_exists(&self, path: &str) -> bool {
        self.context()
            .resolve(path, EntryKind::File, false)
            .await
            .is_ok()
    }

    /// Metadata of the file at `path`.
    pub async fn file_meta(&self, path: &str) -> Result<EntryMetadata> {
        let path = StoragePath::parse(path);
        let file = self.context().file_at(&path, false).await?;
        let metadata = file
            .metadata()
            .await
            .map_err(|e| StorageError::from_host(&path.to_string(), e))?;
        Ok(EntryMetadata::file(&path, metadata))
    }

    /// Metadata of whatever entry lives at `path`.
    pub async fn metadata(&self, path: &str) -> Result<EntryMetadata> {
        let path = StoragePath::parse(path);
        match self.context().resolve_entry(&path).await? {
            bridge_traits::Handle::File(file) => {
                let metadata = file
                    .metadata()
                    .await
                    .map_err(|e| StorageError::from_host(&path.to_string(), e))?;
                Ok(EntryMetadata::file(&path, metadata))
            }
            bridge_traits::Handle::Directory(_) => Ok(EntryMetadata::directory(&path)),
        }
    }

    /// Streaming reader over the committed content of the file at `path`.
    pub async fn open_read_stream(
        &self,
        path: &str,
    ) -> Result<Box<bridge_traits::DynAsyncRead>> {
        let path = StoragePath::parse(path);
        let file = self.context().file_at(&path, false).await?;
        let source = file
            .open_read()
            .await
            .map_err(|e| StorageError::from_host(&path.to_string(), e))?;
        Ok(source.reader)
    }

    /// Staged writer for the file at `path`, created if absent.
    ///
    /// Nothing is visible until [`FileWriter::close`]; dropping or aborting
    /// the writer discards the staged bytes.
    pub async fn open_write_stream(&self, path: &str, mode: WriteMode) -> Result<FileWriter> {
        let path = StoragePath::parse(path);
        let file = self.context().file_at(&path, true).await?;
        let sink = file
            .open_write(mode)
            .await
            .map_err(|e| StorageError::from_host(&path.to_string(), e))?;
        Ok(FileWriter::new(path.to_string(), sink))
    }
}

fn resolve_display(path: &str) -> String {
    StoragePath::parse(path).to_string()
}

//! # Handle Navigator
//!
//! Turns paths into host handles by walking from the root directory handle.
//!
//! The root handle is fetched from the host on first use and then held for
//! the lifetime of the [`StorageContext`]. Concurrent first accesses share a
//! single initialization.
//!
//! Navigation with `create == true` creates the missing segments on the way,
//! so even a "read-looking" call is a write in that mode.

use bridge_traits::{
    error::BridgeError,
    storage::{DirectoryHandle, EntryKind, FileHandle, Handle, StorageHost, WriteMode},
    WritableSink,
};
use bytes::Bytes;
use core_async::io::AsyncReadExt;
use core_async::sync::{OnceCell, Semaphore};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Result, StorageError};
use crate::path::StoragePath;

/// Shared state behind every [`Storage`](crate::Storage) operation.
pub struct StorageContext {
    host: Arc<dyn StorageHost>,
    root: OnceCell<Arc<dyn DirectoryHandle>>,
    io_permits: Semaphore,
    max_concurrent_tasks: usize,
}

impl StorageContext {
    /// Context over `host`; tree operations keep at most
    /// `max_concurrent_tasks` host calls in flight.
    pub fn new(host: Arc<dyn StorageHost>, max_concurrent_tasks: usize) -> Self {
        let limit = max_concurrent_tasks.max(1);
        Self {
            host,
            root: OnceCell::new(),
            io_permits: Semaphore::new(limit),
            max_concurrent_tasks: limit,
        }
    }

    pub fn host(&self) -> &Arc<dyn StorageHost> {
        &self.host
    }

    pub fn max_concurrent_tasks(&self) -> usize {
        self.max_concurrent_tasks
    }

    /// The root directory handle, initialized once.
    pub async fn root(&self) -> Result<Arc<dyn DirectoryHandle>> {
        let root = self
            .root
            .get_or_try_init(|| async {
                debug!("Initializing storage root handle");
                self.host.root().await
            })
            .await
            .map_err(StorageError::Host)?;
        Ok(Arc::clone(root))
    }

    /// Resolves `path` to a handle of the requested `kind`.
    ///
    /// Intermediate segments are always directories. With `create == false`
    /// an absent segment fails with [`StorageError::NotFound`] naming `path`
    /// exactly as given.
    pub async fn resolve(&self, path: &str, kind: EntryKind, create: bool) -> Result<Handle> {
        self.resolve_at(&StoragePath::parse(path), kind, create)
            .await
            .map_err(|e| e.for_path(path))
    }

    pub async fn resolve_at(
        &self,
        path: &StoragePath,
        kind: EntryKind,
        create: bool,
    ) -> Result<Handle> {
        let Some((name, _)) = path.segments().split_last() else {
            return match kind {
                EntryKind::Directory => Ok(Handle::Directory(self.root().await?)),
                EntryKind::File => Err(StorageError::InvalidOperation(
                    "the storage root is not a file".to_string(),
                )),
            };
        };

        let parent = self.parent_of(path, create).await?;
        let shown = path.to_string();
        let handle = match kind {
            EntryKind::File => Handle::File(
                parent
                    .file_child(name, create)
                    .await
                    .map_err(|e| StorageError::from_host(&shown, e))?,
            ),
            EntryKind::Directory => Handle::Directory(
                parent
                    .directory_child(name, create)
                    .await
                    .map_err(|e| StorageError::from_host(&shown, e))?,
            ),
        };
        Ok(handle)
    }

    pub async fn resolve_file(&self, path: &str, create: bool) -> Result<Arc<dyn FileHandle>> {
        self.file_at(&StoragePath::parse(path), create)
            .await
            .map_err(|e| e.for_path(path))
    }

    pub async fn resolve_directory(
        &self,
        path: &str,
        create: bool,
    ) -> Result<Arc<dyn DirectoryHandle>> {
        self.directory_at(&StoragePath::parse(path), create)
            .await
            .map_err(|e| e.for_path(path))
    }

    pub async fn file_at(&self, path: &StoragePath, create: bool) -> Result<Arc<dyn FileHandle>> {
        match self.resolve_at(path, EntryKind::File, create).await? {
            Handle::File(file) => Ok(file),
            Handle::Directory(_) => Err(mismatch(path, EntryKind::File)),
        }
    }

    pub async fn directory_at(
        &self,
        path: &StoragePath,
        create: bool,
    ) -> Result<Arc<dyn DirectoryHandle>> {
        match self.resolve_at(path, EntryKind::Directory, create).await? {
            Handle::Directory(dir) => Ok(dir),
            Handle::File(_) => Err(mismatch(path, EntryKind::Directory)),
        }
    }

    /// Parent directory handle of `path` together with the final segment.
    ///
    /// Fails with [`StorageError::InvalidOperation`] for the root, which has
    /// no parent.
    pub async fn resolve_parent(
        &self,
        path: &str,
        create: bool,
    ) -> Result<(Arc<dyn DirectoryHandle>, String)> {
        let parsed = StoragePath::parse(path);
        let name = parsed.name().map(str::to_string).ok_or_else(|| {
            StorageError::InvalidOperation("the storage root has no parent".to_string())
        })?;
        let parent = self
            .parent_of(&parsed, create)
            .await
            .map_err(|e| e.for_path(path))?;
        Ok((parent, name))
    }

    /// Resolves whichever kind of entry lives at `path`.
    pub async fn resolve_entry(&self, path: &StoragePath) -> Result<Handle> {
        let Some(name) = path.name() else {
            return Ok(Handle::Directory(self.root().await?));
        };
        let parent = self.parent_of(path, false).await?;
        let shown = path.to_string();
        match parent.file_child(name, false).await {
            Ok(file) => Ok(Handle::File(file)),
            Err(BridgeError::TypeMismatch(_)) => parent
                .directory_child(name, false)
                .await
                .map(Handle::Directory)
                .map_err(|e| StorageError::from_host(&shown, e)),
            Err(e) => Err(StorageError::from_host(&shown, e)),
        }
    }

    /// Walks every segment but the last as a directory.
    async fn parent_of(
        &self,
        path: &StoragePath,
        create: bool,
    ) -> Result<Arc<dyn DirectoryHandle>> {
        let mut current = self.root().await?;
        let Some((_, intermediate)) = path.segments().split_last() else {
            return Ok(current);
        };
        for segment in intermediate {
            current = current
                .directory_child(segment, create)
                .await
                .map_err(|e| StorageError::from_host(&path.to_string(), e))?;
        }
        Ok(current)
    }

    /// Runs one host call while holding an I/O permit.
    pub(crate) async fn throttled<F>(&self, call: F) -> Result<F::Output>
    where
        F: Future,
    {
        let _permit = self
            .io_permits
            .acquire()
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?;
        Ok(call.await)
    }

    /// Full content of the file at `path`.
    pub(crate) async fn read_all(&self, path: &StoragePath) -> Result<Bytes> {
        let file = self.file_at(path, false).await?;
        read_handle(file.as_ref(), &path.to_string()).await
    }

    /// Replaces the content of the file at `path`, creating it and any
    /// missing parents.
    pub(crate) async fn write_all(&self, path: &StoragePath, data: Bytes) -> Result<()> {
        let file = self.file_at(path, true).await?;
        let sink = file
            .open_write(WriteMode::Truncate)
            .await
            .map_err(|e| StorageError::from_host(&path.to_string(), e))?;
        commit(sink, None, data)
            .await
            .map_err(|e| StorageError::from_host(&path.to_string(), e))
    }
}

impl std::fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageContext")
            .field("root_initialized", &self.root.initialized())
            .field("max_concurrent_tasks", &self.max_concurrent_tasks)
            .finish()
    }
}

fn mismatch(path: &StoragePath, wanted: EntryKind) -> StorageError {
    StorageError::Host(BridgeError::TypeMismatch(format!(
        "{path} is not a {wanted}"
    )))
}

pub(crate) async fn read_handle(file: &dyn FileHandle, path: &str) -> Result<Bytes> {
    let mut source = file
        .open_read()
        .await
        .map_err(|e| StorageError::from_host(path, e))?;
    let mut buffer = Vec::with_capacity(source.metadata.size as usize);
    source
        .reader
        .read_to_end(&mut buffer)
        .await
        .map_err(|e| StorageError::from_host(path, BridgeError::Io(e)))?;
    Ok(Bytes::from(buffer))
}

/// Writes `data` at `offset` (or the sink's start) and commits. On a write
/// failure the sink is aborted before the error is returned.
pub(crate) async fn commit(
    mut sink: Box<dyn WritableSink>,
    offset: Option<u64>,
    data: Bytes,
) -> std::result::Result<(), BridgeError> {
    let staged = async {
        if let Some(offset) = offset {
            sink.seek(offset).await?;
        }
        sink.write(data).await
    }
    .await;

    match staged {
        Ok(()) => sink.close().await,
        Err(err) => {
            if let Err(abort_err) = sink.abort().await {
                warn!(error = %abort_err, "Failed to discard staged write");
            }
            Err(err)
        }
    }
}

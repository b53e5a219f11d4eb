//! Sandboxed storage host backed by a local directory, using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{
        guess_content_type, validate_name, AccessMode, ChildEntry, DirectoryHandle, FileHandle,
        FileMetadata, PermissionState, ReadableSource, StorageHost, UsageEstimate, WritableSink,
        WriteMode,
    },
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use crate::sink::{is_swap_file, TokioSink};

/// Tokio-based storage host
///
/// Every handle it hands out addresses a path under `base`. Entry names are
/// validated before they are joined, so navigation cannot leave the sandbox.
pub struct TokioStorageHost {
    base: PathBuf,
    quota: Option<u64>,
}

impl TokioStorageHost {
    /// Host rooted at `base`; the directory is created on first access.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            quota: None,
        }
    }

    /// Host rooted at `<platform data dir>/<app_name>/sandbox`.
    pub fn in_data_dir(app_name: &str) -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join(app_name)
            .join("sandbox");
        Self::new(data_dir)
    }

    /// Enables usage estimation against a budget of `bytes`.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }
}

impl std::fmt::Debug for TokioStorageHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioStorageHost")
            .field("base", &self.base)
            .field("quota", &self.quota)
            .finish()
    }
}

#[async_trait]
impl StorageHost for TokioStorageHost {
    async fn root(&self) -> Result<Arc<dyn DirectoryHandle>> {
        fs::create_dir_all(&self.base).await?;
        debug!(path = ?self.base, "Opened sandbox root");
        let root: Arc<dyn DirectoryHandle> = Arc::new(TokioDirectory {
            path: self.base.clone(),
            name: String::new(),
        });
        Ok(root)
    }

    async fn estimate_usage(&self) -> Result<Option<UsageEstimate>> {
        let Some(quota) = self.quota else {
            return Ok(None);
        };
        let used = match fs::metadata(&self.base).await {
            Ok(_) => directory_size(&self.base).await?,
            Err(err) if err.kind() == ErrorKind::NotFound => 0,
            Err(err) => return Err(err.into()),
        };
        debug!(path = ?self.base, used, quota, "Estimated usage");
        Ok(Some(UsageEstimate { used, quota }))
    }
}

/// Sum of regular file sizes below `path`, swap files excluded.
async fn directory_size(path: &Path) -> Result<u64> {
    let mut total = 0u64;
    let mut pending = vec![path.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut read_dir = fs::read_dir(&dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() && !is_swap_file(&entry.file_name().to_string_lossy()) {
                total += entry.metadata().await?.len();
            }
        }
    }

    Ok(total)
}

fn not_found(path: &Path) -> BridgeError {
    BridgeError::NotFound(path.display().to_string())
}

fn file_metadata(name: &str, metadata: &std::fs::Metadata) -> FileMetadata {
    FileMetadata {
        size: metadata.len(),
        last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        content_type: guess_content_type(name).map(str::to_string),
    }
}

async fn permission_for(path: &Path, mode: AccessMode) -> Result<PermissionState> {
    let metadata = fs::metadata(path).await.map_err(|err| match err.kind() {
        ErrorKind::NotFound => not_found(path),
        _ => BridgeError::Io(err),
    })?;
    let state = match mode {
        AccessMode::Read => PermissionState::Granted,
        AccessMode::ReadWrite if metadata.permissions().readonly() => PermissionState::Denied,
        AccessMode::ReadWrite => PermissionState::Granted,
    };
    Ok(state)
}

/// Directory handle
pub struct TokioDirectory {
    path: PathBuf,
    name: String,
}

impl TokioDirectory {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectoryHandle for TokioDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn file_child(&self, name: &str, create: bool) -> Result<Arc<dyn FileHandle>> {
        validate_name(name)?;
        let path = self.path.join(name);

        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(BridgeError::TypeMismatch(path.display().to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound && create => {
                fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .open(&path)
                    .await?;
                debug!(path = ?path, "Created file");
            }
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found(&path)),
            Err(err) => return Err(err.into()),
        }

        let file: Arc<dyn FileHandle> = Arc::new(TokioFile {
            path,
            name: name.to_string(),
        });
        Ok(file)
    }

    async fn directory_child(
        &self,
        name: &str,
        create: bool,
    ) -> Result<Arc<dyn DirectoryHandle>> {
        validate_name(name)?;
        let path = self.path.join(name);

        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(BridgeError::TypeMismatch(path.display().to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound && create => {
                match fs::create_dir(&path).await {
                    Ok(()) => debug!(path = ?path, "Created directory"),
                    // Lost a race with another creator; the directory is there.
                    Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
                    Err(err) => return Err(err.into()),
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found(&path)),
            Err(err) => return Err(err.into()),
        }

        let dir: Arc<dyn DirectoryHandle> = Arc::new(TokioDirectory {
            path,
            name: name.to_string(),
        });
        Ok(dir)
    }

    async fn children(&self) -> Result<Vec<ChildEntry>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&self.path).await.map_err(|err| match err.kind() {
            ErrorKind::NotFound => not_found(&self.path),
            _ => BridgeError::Io(err),
        })?;

        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_swap_file(&name) {
                continue;
            }
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                entries.push(ChildEntry::directory(name));
            } else if file_type.is_file() {
                let metadata = entry.metadata().await?;
                let metadata = file_metadata(&name, &metadata);
                entries.push(ChildEntry::file(name, metadata));
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(path = ?self.path, count = entries.len(), "Listed directory");
        Ok(entries)
    }

    async fn remove_child(&self, name: &str, recursive: bool) -> Result<()> {
        validate_name(name)?;
        let path = self.path.join(name);
        let metadata = fs::symlink_metadata(&path)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => not_found(&path),
                _ => BridgeError::Io(err),
            })?;

        if metadata.is_dir() {
            if recursive {
                fs::remove_dir_all(&path).await?;
            } else {
                fs::remove_dir(&path).await.map_err(|err| {
                    BridgeError::OperationFailed(format!("{}: {err}", path.display()))
                })?;
            }
        } else {
            fs::remove_file(&path).await?;
        }

        debug!(path = ?path, recursive, "Removed entry");
        Ok(())
    }

    async fn query_permission(&self, mode: AccessMode) -> Result<PermissionState> {
        permission_for(&self.path, mode).await
    }
}

/// File handle
pub struct TokioFile {
    path: PathBuf,
    name: String,
}

impl TokioFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> Result<fs::File> {
        fs::File::open(&self.path)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => not_found(&self.path),
                _ => BridgeError::Io(err),
            })
    }
}

#[async_trait]
impl FileHandle for TokioFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn metadata(&self) -> Result<FileMetadata> {
        let metadata = fs::metadata(&self.path)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => not_found(&self.path),
                _ => BridgeError::Io(err),
            })?;
        Ok(file_metadata(&self.name, &metadata))
    }

    async fn open_read(&self) -> Result<ReadableSource> {
        let file = self.open().await?;
        let metadata = file_metadata(&self.name, &file.metadata().await?);
        debug!(path = ?self.path, size = metadata.size, "Opened file for reading");
        Ok(ReadableSource {
            metadata,
            reader: Box::new(file),
        })
    }

    async fn open_write(&self, mode: WriteMode) -> Result<Box<dyn WritableSink>> {
        let sink = TokioSink::open(&self.path, &self.name, mode).await?;
        debug!(path = ?self.path, ?mode, "Opened file for writing");
        Ok(Box::new(sink))
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Bytes> {
        let mut file = self.open().await?;
        let len = end.saturating_sub(start);
        file.seek(SeekFrom::Start(start)).await?;

        let mut buffer = Vec::new();
        file.take(len).read_to_end(&mut buffer).await?;
        debug!(path = ?self.path, start, end, read = buffer.len(), "Read byte range");
        Ok(Bytes::from(buffer))
    }

    async fn query_permission(&self, mode: AccessMode) -> Result<PermissionState> {
        permission_for(&self.path, mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_created_on_demand() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().join("nested").join("sandbox");
        let host = TokioStorageHost::new(&base);

        let root = host.root().await.unwrap();
        assert_eq!(root.name(), "");
        assert!(base.is_dir());
    }

    #[tokio::test]
    async fn test_rejects_escaping_names() {
        let temp = tempfile::tempdir().unwrap();
        let host = TokioStorageHost::new(temp.path());
        let root = host.root().await.unwrap();

        assert!(root.file_child("..", true).await.is_err());
        assert!(root.directory_child("a/b", true).await.is_err());
    }

    #[tokio::test]
    async fn test_in_data_dir_layout() {
        let host = TokioStorageHost::in_data_dir("sandboxfs-test");
        assert!(host.base_dir().ends_with("sandboxfs-test/sandbox"));
    }
}

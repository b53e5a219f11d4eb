//! Sandboxed Storage Host Abstractions
//!
//! Handle-based contract for a hierarchical, sandboxed byte store (an
//! OPFS-style origin-private file system). The store is only reachable by
//! navigating from a root directory handle; there are no raw paths here.
//!
//! Implementations:
//! - Desktop: a directory on the local disk (`bridge-desktop`)
//! - Tests / embedding: an in-process tree (`bridge-memory`)
//!
//! Hosts own durability and atomicity. In particular a [`WritableSink`]
//! stages its writes and only makes them visible on [`WritableSink::close`].
//!
//! # Example
//!
//! ```ignore
//! use bridge_traits::storage::{StorageHost, WriteMode};
//!
//! async fn touch(host: &dyn StorageHost) -> Result<()> {
//!     let root = host.root().await?;
//!     let file = root.file_child("hello.txt", true).await?;
//!     let mut sink = file.open_write(WriteMode::Truncate).await?;
//!     sink.write("hi".into()).await?;
//!     sink.close().await
//! }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{BridgeError, Result};

/// Dynamic async reader handed out by hosts.
pub type DynAsyncRead = dyn core_async::io::AsyncRead + Send + Unpin;

/// Kind of a store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a file's metadata taken when it was queried.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileMetadata {
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    /// MIME type hint, usually derived from the file extension
    pub content_type: Option<String>,
}

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Present for files only
    pub metadata: Option<FileMetadata>,
}

impl ChildEntry {
    pub fn file(name: impl Into<String>, metadata: FileMetadata) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            metadata: Some(metadata),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            metadata: None,
        }
    }
}

/// Access level requested from the host's permission model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    ReadWrite,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::ReadWrite => f.write_str("readwrite"),
        }
    }
}

/// Outcome of a permission query or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// The host would have to ask the user
    Prompt,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// How a writable sink treats the existing file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Start from an empty file
    Truncate,
    /// Start from the current content; writes land at the sink's cursor
    KeepExisting,
}

/// Storage usage reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEstimate {
    pub used: u64,
    pub quota: u64,
}

/// An open read stream plus the metadata captured when it was opened.
pub struct ReadableSource {
    pub metadata: FileMetadata,
    pub reader: Box<DynAsyncRead>,
}

impl fmt::Debug for ReadableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadableSource")
            .field("metadata", &self.metadata)
            .field("reader", &"AsyncRead { ... }")
            .finish()
    }
}

/// Checks that `name` is usable as a single entry name.
///
/// Rejects empty names, `.` and `..`, and names containing a path separator
/// or a NUL byte.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(BridgeError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// MIME type hint for a file name, derived from its extension.
pub fn guess_content_type(name: &str) -> Option<&'static str> {
    let (_, extension) = name.rsplit_once('.')?;
    let content_type = match extension.to_ascii_lowercase().as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(content_type)
}

/// Entry point into a sandboxed store.
#[async_trait]
pub trait StorageHost: Send + Sync {
    /// Root directory handle; stable for the lifetime of the host.
    async fn root(&self) -> Result<Arc<dyn DirectoryHandle>>;

    /// Current usage and quota, or `None` when the host cannot estimate.
    async fn estimate_usage(&self) -> Result<Option<UsageEstimate>> {
        Ok(None)
    }
}

/// Handle to a directory node.
#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    /// Entry name; empty for the root.
    fn name(&self) -> &str;

    /// Resolves a child file.
    ///
    /// Fails with `NotFound` when absent and `create` is false, and with
    /// `TypeMismatch` when the child is a directory.
    async fn file_child(&self, name: &str, create: bool) -> Result<Arc<dyn FileHandle>>;

    /// Resolves a child directory, with the same failure contract as
    /// [`file_child`](Self::file_child).
    async fn directory_child(&self, name: &str, create: bool)
        -> Result<Arc<dyn DirectoryHandle>>;

    /// Immediate children, in host order.
    async fn children(&self) -> Result<Vec<ChildEntry>>;

    /// Removes a child. Fails with `NotFound` when absent and with
    /// `OperationFailed` for a non-empty directory unless `recursive`.
    async fn remove_child(&self, name: &str, recursive: bool) -> Result<()>;

    async fn query_permission(&self, mode: AccessMode) -> Result<PermissionState>;

    /// Asks for `mode`; hosts without an interactive prompt answer like a query.
    async fn request_permission(&self, mode: AccessMode) -> Result<PermissionState> {
        self.query_permission(mode).await
    }
}

/// Handle to a file node.
#[async_trait]
pub trait FileHandle: Send + Sync {
    fn name(&self) -> &str;

    async fn metadata(&self) -> Result<FileMetadata>;

    /// Opens a stream over the committed content.
    async fn open_read(&self) -> Result<ReadableSource>;

    /// Opens a staged writer. The sink must be closed or aborted.
    async fn open_write(&self, mode: WriteMode) -> Result<Box<dyn WritableSink>>;

    /// Reads `[start, end)`; the caller keeps the range inside the file.
    async fn read_range(&self, start: u64, end: u64) -> Result<Bytes>;

    async fn query_permission(&self, mode: AccessMode) -> Result<PermissionState>;

    async fn request_permission(&self, mode: AccessMode) -> Result<PermissionState> {
        self.query_permission(mode).await
    }
}

/// Staged writer returned by [`FileHandle::open_write`].
///
/// Writes become visible only after [`close`](Self::close). Dropping a sink
/// without closing it discards the staged content.
#[async_trait]
pub trait WritableSink: Send {
    /// Moves the write cursor.
    async fn seek(&mut self, position: u64) -> Result<()>;

    /// Writes at the cursor and advances it.
    async fn write(&mut self, data: Bytes) -> Result<()>;

    /// Commits the staged content.
    async fn close(self: Box<Self>) -> Result<()>;

    /// Discards the staged content.
    async fn abort(self: Box<Self>) -> Result<()>;
}

/// A resolved handle of either kind.
#[derive(Clone)]
pub enum Handle {
    File(Arc<dyn FileHandle>),
    Directory(Arc<dyn DirectoryHandle>),
}

impl Handle {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::File(_) => EntryKind::File,
            Self::Directory(_) => EntryKind::Directory,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File(file) => file.name(),
            Self::Directory(dir) => dir.name(),
        }
    }

    pub fn into_file(self) -> Option<Arc<dyn FileHandle>> {
        match self {
            Self::File(file) => Some(file),
            Self::Directory(_) => None,
        }
    }

    pub fn into_directory(self) -> Option<Arc<dyn DirectoryHandle>> {
        match self {
            Self::Directory(dir) => Some(dir),
            Self::File(_) => None,
        }
    }

    pub async fn query_permission(&self, mode: AccessMode) -> Result<PermissionState> {
        match self {
            Self::File(file) => file.query_permission(mode).await,
            Self::Directory(dir) => dir.query_permission(mode).await,
        }
    }

    pub async fn request_permission(&self, mode: AccessMode) -> Result<PermissionState> {
        match self {
            Self::File(file) => file.request_permission(mode).await,
            Self::Directory(dir) => dir.request_permission(mode).await,
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

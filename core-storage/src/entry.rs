//! Entry descriptions returned by listing and metadata queries.

use bridge_traits::storage::{ChildEntry, EntryKind, FileMetadata};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::path::StoragePath;

/// Snapshot of one entry, taken at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryMetadata {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    /// Byte size; zero for directories
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
}

impl EntryMetadata {
    pub(crate) fn file(path: &StoragePath, metadata: FileMetadata) -> Self {
        Self {
            name: path.name().unwrap_or_default().to_string(),
            path: path.to_string(),
            kind: EntryKind::File,
            size: metadata.size,
            last_modified: metadata.last_modified,
            content_type: metadata.content_type,
        }
    }

    pub(crate) fn directory(path: &StoragePath) -> Self {
        Self {
            name: path.name().unwrap_or_default().to_string(),
            path: path.to_string(),
            kind: EntryKind::Directory,
            size: 0,
            last_modified: None,
            content_type: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Immediate child reported by `list_directory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    /// Full storage path of the child
    pub path: String,
    pub kind: EntryKind,
    /// Present for files only
    pub metadata: Option<FileMetadata>,
}

impl DirectoryEntry {
    pub(crate) fn from_child(parent: &StoragePath, child: ChildEntry) -> Self {
        Self {
            path: parent.child(&child.name).to_string(),
            name: child.name,
            kind: child.kind,
            metadata: child.metadata,
        }
    }
}

/// Storage usage with the remaining headroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaInfo {
    pub used: u64,
    pub quota: u64,
    /// `quota - used`, never negative
    pub available: u64,
}

/// One file captured by `export_directory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// Path relative to the exported directory
    pub path: String,
    pub contents: Bytes,
}

//! Directory, file and sink nodes of the in-memory tree.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{
        guess_content_type, validate_name, AccessMode, ChildEntry, DirectoryHandle, FileHandle,
        FileMetadata, PermissionState, ReadableSource, WritableSink, WriteMode,
    },
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::HostState;

fn poisoned() -> BridgeError {
    BridgeError::OperationFailed("in-memory tree lock poisoned".to_string())
}

#[derive(Clone)]
enum Node {
    File(Arc<MemoryFile>),
    Directory(Arc<MemoryDirectory>),
}

/// Directory node.
pub struct MemoryDirectory {
    name: String,
    children: RwLock<BTreeMap<String, Node>>,
    state: Arc<HostState>,
}

impl MemoryDirectory {
    pub(crate) fn new_root(state: Arc<HostState>) -> Arc<Self> {
        Self::new(String::new(), state)
    }

    fn new(name: String, state: Arc<HostState>) -> Arc<Self> {
        Arc::new(Self {
            name,
            children: RwLock::new(BTreeMap::new()),
            state,
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Node>>> {
        self.children.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Node>>> {
        self.children.write().map_err(|_| poisoned())
    }

    /// Sum of committed file sizes in this subtree.
    pub(crate) fn total_size(&self) -> u64 {
        let Ok(children) = self.children.read() else {
            return 0;
        };
        children
            .values()
            .map(|node| match node {
                Node::File(file) => file.size(),
                Node::Directory(dir) => dir.total_size(),
            })
            .sum()
    }
}

#[async_trait]
impl DirectoryHandle for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn file_child(&self, name: &str, create: bool) -> Result<Arc<dyn FileHandle>> {
        validate_name(name)?;
        let mut children = self.write()?;
        let file = match children.get(name) {
            Some(Node::File(file)) => Arc::clone(file),
            Some(Node::Directory(_)) => {
                return Err(BridgeError::TypeMismatch(format!("{name} is a directory")))
            }
            None if create => {
                let file = MemoryFile::new(name.to_string(), Arc::clone(&self.state));
                children.insert(name.to_string(), Node::File(Arc::clone(&file)));
                debug!(name, "Created in-memory file");
                file
            }
            None => return Err(BridgeError::NotFound(name.to_string())),
        };
        let file: Arc<dyn FileHandle> = file;
        Ok(file)
    }

    async fn directory_child(
        &self,
        name: &str,
        create: bool,
    ) -> Result<Arc<dyn DirectoryHandle>> {
        validate_name(name)?;
        let mut children = self.write()?;
        let dir = match children.get(name) {
            Some(Node::Directory(dir)) => Arc::clone(dir),
            Some(Node::File(_)) => {
                return Err(BridgeError::TypeMismatch(format!("{name} is a file")))
            }
            None if create => {
                let dir = MemoryDirectory::new(name.to_string(), Arc::clone(&self.state));
                children.insert(name.to_string(), Node::Directory(Arc::clone(&dir)));
                debug!(name, "Created in-memory directory");
                dir
            }
            None => return Err(BridgeError::NotFound(name.to_string())),
        };
        let dir: Arc<dyn DirectoryHandle> = dir;
        Ok(dir)
    }

    async fn children(&self) -> Result<Vec<ChildEntry>> {
        let children = self.read()?;
        children
            .iter()
            .map(|(name, node)| match node {
                Node::File(file) => Ok(ChildEntry::file(name.clone(), file.snapshot()?)),
                Node::Directory(_) => Ok(ChildEntry::directory(name.clone())),
            })
            .collect()
    }

    async fn remove_child(&self, name: &str, recursive: bool) -> Result<()> {
        let mut children = self.write()?;
        let occupied = match children.get(name) {
            None => return Err(BridgeError::NotFound(name.to_string())),
            Some(Node::Directory(dir)) => !dir.read()?.is_empty(),
            Some(Node::File(_)) => false,
        };
        if occupied && !recursive {
            return Err(BridgeError::OperationFailed(format!(
                "directory {name} is not empty"
            )));
        }
        children.remove(name);
        debug!(name, recursive, "Removed in-memory entry");
        Ok(())
    }

    async fn query_permission(&self, mode: AccessMode) -> Result<PermissionState> {
        Ok(self.state.permission(mode))
    }
}

struct Content {
    data: Bytes,
    modified: DateTime<Utc>,
}

/// File node.
pub struct MemoryFile {
    name: String,
    content: Arc<RwLock<Content>>,
    state: Arc<HostState>,
}

impl MemoryFile {
    fn new(name: String, state: Arc<HostState>) -> Arc<Self> {
        let modified = state.clock.now();
        Arc::new(Self {
            name,
            content: Arc::new(RwLock::new(Content {
                data: Bytes::new(),
                modified,
            })),
            state,
        })
    }

    fn size(&self) -> u64 {
        self.content
            .read()
            .map(|content| content.data.len() as u64)
            .unwrap_or(0)
    }

    fn data(&self) -> Result<Bytes> {
        Ok(self.content.read().map_err(|_| poisoned())?.data.clone())
    }

    fn snapshot(&self) -> Result<FileMetadata> {
        let content = self.content.read().map_err(|_| poisoned())?;
        Ok(FileMetadata {
            size: content.data.len() as u64,
            last_modified: Some(content.modified),
            content_type: guess_content_type(&self.name).map(str::to_string),
        })
    }
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn metadata(&self) -> Result<FileMetadata> {
        self.snapshot()
    }

    async fn open_read(&self) -> Result<ReadableSource> {
        let metadata = self.snapshot()?;
        let data = self.data()?;
        Ok(ReadableSource {
            metadata,
            reader: Box::new(Cursor::new(data)),
        })
    }

    async fn open_write(&self, mode: WriteMode) -> Result<Box<dyn WritableSink>> {
        let buffer = match mode {
            WriteMode::Truncate => Vec::new(),
            WriteMode::KeepExisting => self.data()?.to_vec(),
        };
        Ok(Box::new(MemorySink {
            name: self.name.clone(),
            target: Arc::clone(&self.content),
            state: Arc::clone(&self.state),
            buffer,
            cursor: 0,
        }))
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Bytes> {
        let data = self.data()?;
        let len = data.len();
        let start = usize::try_from(start).unwrap_or(len).min(len);
        let end = usize::try_from(end).unwrap_or(len).min(len);
        if start >= end {
            return Ok(Bytes::new());
        }
        Ok(data.slice(start..end))
    }

    async fn query_permission(&self, mode: AccessMode) -> Result<PermissionState> {
        Ok(self.state.permission(mode))
    }
}

/// Staged writer for a [`MemoryFile`]. Content is swapped in on `close`.
pub struct MemorySink {
    name: String,
    target: Arc<RwLock<Content>>,
    state: Arc<HostState>,
    buffer: Vec<u8>,
    cursor: usize,
}

#[async_trait]
impl WritableSink for MemorySink {
    async fn seek(&mut self, position: u64) -> Result<()> {
        self.cursor = usize::try_from(position)
            .map_err(|_| BridgeError::OperationFailed(format!("seek past {position}")))?;
        Ok(())
    }

    async fn write(&mut self, data: Bytes) -> Result<()> {
        let limit = self.state.max_file_size();
        let end = self
            .cursor
            .checked_add(data.len())
            .filter(|end| *end <= limit)
            .ok_or_else(|| {
                BridgeError::OperationFailed(format!(
                    "{} would exceed the {limit} byte file limit",
                    self.name
                ))
            })?;
        if self.buffer.len() < end {
            self.buffer.resize(end, 0);
        }
        self.buffer[self.cursor..end].copy_from_slice(&data);
        self.cursor = end;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let MemorySink {
            name,
            target,
            state,
            buffer,
            ..
        } = *self;
        if state.write_should_fail(&name) {
            debug!(name = %name, "Injected write failure");
            return Err(BridgeError::OperationFailed(format!(
                "injected write failure for {name}"
            )));
        }
        let modified = state.clock.now();
        let mut content = target.write().map_err(|_| poisoned())?;
        content.data = Bytes::from(buffer);
        content.modified = modified;
        debug!(name = %name, size = content.data.len(), "Committed in-memory write");
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        debug!(name = %self.name, "Discarded in-memory write");
        Ok(())
    }
}

//! # Core Storage Module
//!
//! Path-based, async file and directory operations over a sandboxed,
//! handle-based store.
//!
//! ## Overview
//!
//! The store itself is a [`StorageHost`](bridge_traits::StorageHost): it is
//! only reachable by navigating handles from a root directory. This crate
//! layers the conveniences on top:
//!
//! - **Path Resolver** ([`path`]): normalization of slash-delimited paths
//! - **Handle Navigator** ([`navigator`]): path to handle, with optional
//!   creation of missing segments
//! - **Entry Operations** ([`Storage`]): read, write, append, copy, rename,
//!   delete, listing, metadata, streams and permissions
//! - **Tree Walker**: recursive enumeration, directory rename and copy,
//!   export and text rendering, fanned out over a task group
//! - **Content View** ([`FileContent`]): text, JSON, bytes, blob and data
//!   URL views of a file, re-read on every call
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_memory::MemoryStorageHost;
//! use core_storage::Storage;
//! use std::sync::Arc;
//!
//! let storage = Storage::with_host(Arc::new(MemoryStorageHost::new()));
//! storage.write("notes/todo.txt", "buy milk").await?;
//! storage.append("notes/todo.txt", "\nwalk dog").await?;
//! println!("{}", storage.render_tree("").await?);
//! ```
//!
//! ## Atomicity
//!
//! Single-file writes commit atomically through the host's sinks. The
//! composite operations (`rename`, `rename_directory`) are copy-then-delete
//! sequences and can leave both copies behind on failure. There is no
//! rollback.

pub mod content;
mod directories;
pub mod entry;
pub mod error;
mod files;
pub mod navigator;
pub mod path;
pub mod payload;
mod storage;
pub mod stream;
pub mod tree;
mod walker;

pub use content::FileContent;
pub use entry::{DirectoryEntry, EntryMetadata, ExportedFile, QuotaInfo};
pub use error::{Result, StorageError};
pub use navigator::StorageContext;
pub use path::{join_path, normalize, parent_directory, resolve_path, StoragePath};
pub use payload::{Blob, Payload};
pub use storage::Storage;
pub use stream::FileWriter;
pub use tree::TreeNode;

pub use bridge_traits::storage::{AccessMode, EntryKind, FileMetadata, PermissionState, WriteMode};
pub use core_runtime::config::StorageConfig;

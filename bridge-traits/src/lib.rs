//! # Host Bridge Traits
//!
//! Contract between the sandboxfs storage core and the storage hosts it
//! drives.
//!
//! ## Traits
//!
//! ### Storage
//! - [`StorageHost`](storage::StorageHost) - Root handle and quota estimation
//! - [`DirectoryHandle`](storage::DirectoryHandle) - Child navigation, listing, removal
//! - [`FileHandle`](storage::FileHandle) - Metadata, streams, ranged reads
//! - [`WritableSink`](storage::WritableSink) - Staged, commit-on-close writes
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to the embedder
//!
//! ## Implementations
//!
//! | Host | Crate |
//! |------|-------|
//! | Local directory | `bridge-desktop` |
//! | In-process tree | `bridge-memory` |
//!
//! ## Error Handling
//!
//! Every host reports failures as [`BridgeError`](error::BridgeError).
//! Hosts must report an absent entry as `NotFound` (or an `io::Error` of kind
//! `NotFound`) so the core can translate it into its own domain error.
//!
//! ## Thread Safety
//!
//! Hosts and handles are `Send + Sync` so tree operations can fan out across
//! spawned tasks.

pub mod error;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use storage::{
    guess_content_type, validate_name, AccessMode, ChildEntry, DirectoryHandle, DynAsyncRead,
    EntryKind, FileHandle, FileMetadata, Handle, PermissionState, ReadableSource, StorageHost,
    UsageEstimate, WritableSink, WriteMode,
};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};

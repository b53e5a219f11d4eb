//! # Desktop Bridge Implementations
//!
//! Storage host for desktop platforms (macOS, Windows, Linux) backed by a
//! directory on the local disk.
//!
//! ## Overview
//!
//! [`TokioStorageHost`] maps the handle-based storage contract from
//! `bridge-traits` onto `tokio::fs`:
//! - the sandbox root is a single directory; nothing outside it is reachable
//! - writable sinks stage into a hidden swap file next to the target and
//!   commit with a rename, so readers never observe a half-written file
//! - usage estimation is available when a quota budget is configured
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::TokioStorageHost;
//! use std::sync::Arc;
//!
//! let host = Arc::new(TokioStorageHost::new("/var/lib/my-app/sandbox"));
//! let root = host.root().await?;
//! ```

mod filesystem;
mod sink;

pub use filesystem::{TokioDirectory, TokioFile, TokioStorageHost};
pub use sink::TokioSink;

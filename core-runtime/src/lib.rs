//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the sandboxfs crates:
//! - Logging and tracing setup
//! - Storage configuration and host selection
//!
//! ## Overview
//!
//! Hosts are injected through [`config::StorageConfig`]. With the
//! `desktop-shims` feature a directory-backed host is provided when none is
//! injected.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{StorageConfig, StorageConfigBuilder, DEFAULT_MAX_CONCURRENT_TASKS};
pub use error::{Error, Result};

//! # In-Memory Storage Host
//!
//! A [`StorageHost`](bridge_traits::StorageHost) that keeps the whole tree in
//! process memory. Useful for tests and for embedding sandboxfs where no
//! persistent backing store exists.
//!
//! Besides the plain host contract it exposes a few knobs that a real host
//! controls on its own:
//!
//! - a quota, so usage estimation is supported ([`MemoryStorageHost::with_quota`])
//! - permission overrides ([`MemoryStorageHost::set_permission`])
//! - write-failure injection by file name ([`MemoryStorageHost::fail_writes_to`]),
//!   which makes every sink for that name fail on commit
//! - a per-file size cap ([`MemoryStorageHost::with_max_file_size`]); sink
//!   writes that would grow a file past it fail instead of allocating
//!
//! ```ignore
//! use bridge_memory::MemoryStorageHost;
//! use std::sync::Arc;
//!
//! let host = Arc::new(MemoryStorageHost::new().with_quota(1024 * 1024));
//! host.fail_writes_to("flaky.bin");
//! ```

mod tree;

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    storage::{AccessMode, DirectoryHandle, PermissionState, StorageHost, UsageEstimate},
    time::{Clock, SystemClock},
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub use tree::{MemoryDirectory, MemoryFile, MemorySink};

/// Default cap on the size of a single file.
pub const DEFAULT_MAX_FILE_SIZE: usize = 1 << 30;

/// Settings shared by every node of one host.
pub(crate) struct HostState {
    pub(crate) clock: Arc<dyn Clock>,
    failing_names: Mutex<HashSet<String>>,
    permissions: Mutex<HashMap<AccessMode, PermissionState>>,
    max_file_size: AtomicUsize,
}

impl HostState {
    pub(crate) fn max_file_size(&self) -> usize {
        self.max_file_size.load(Ordering::Relaxed)
    }

    pub(crate) fn write_should_fail(&self, name: &str) -> bool {
        self.failing_names
            .lock()
            .map(|names| names.contains(name))
            .unwrap_or(false)
    }

    pub(crate) fn permission(&self, mode: AccessMode) -> PermissionState {
        self.permissions
            .lock()
            .ok()
            .and_then(|overrides| overrides.get(&mode).copied())
            .unwrap_or(PermissionState::Granted)
    }
}

/// In-process storage host.
pub struct MemoryStorageHost {
    root: Arc<MemoryDirectory>,
    state: Arc<HostState>,
    quota: Option<u64>,
}

impl MemoryStorageHost {
    /// Empty store using the system clock and no quota.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty store stamping modification times from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let state = Arc::new(HostState {
            clock,
            failing_names: Mutex::new(HashSet::new()),
            permissions: Mutex::new(HashMap::new()),
            max_file_size: AtomicUsize::new(DEFAULT_MAX_FILE_SIZE),
        });
        Self {
            root: MemoryDirectory::new_root(Arc::clone(&state)),
            state,
            quota: None,
        }
    }

    /// Enables usage estimation against a quota of `bytes`.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Caps every file at `bytes`.
    pub fn with_max_file_size(self, bytes: usize) -> Self {
        self.state.max_file_size.store(bytes, Ordering::Relaxed);
        self
    }

    /// Makes every sink for a file called `name` fail when it commits.
    pub fn fail_writes_to(&self, name: impl Into<String>) {
        if let Ok(mut names) = self.state.failing_names.lock() {
            names.insert(name.into());
        }
    }

    /// Clears all injected write failures.
    pub fn clear_write_failures(&self) {
        if let Ok(mut names) = self.state.failing_names.lock() {
            names.clear();
        }
    }

    /// Overrides the answer to permission queries for `mode` on every handle.
    pub fn set_permission(&self, mode: AccessMode, state: PermissionState) {
        if let Ok(mut overrides) = self.state.permissions.lock() {
            overrides.insert(mode, state);
        }
    }

    /// Total bytes stored under the root.
    pub fn used_bytes(&self) -> u64 {
        self.root.total_size()
    }
}

impl Default for MemoryStorageHost {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStorageHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorageHost")
            .field("quota", &self.quota)
            .field("used", &self.used_bytes())
            .finish()
    }
}

#[async_trait]
impl StorageHost for MemoryStorageHost {
    async fn root(&self) -> Result<Arc<dyn DirectoryHandle>> {
        debug!("Handing out in-memory root");
        let root: Arc<dyn DirectoryHandle> = self.root.clone();
        Ok(root)
    }

    async fn estimate_usage(&self) -> Result<Option<UsageEstimate>> {
        Ok(self.quota.map(|quota| UsageEstimate {
            used: self.used_bytes(),
            quota,
        }))
    }
}

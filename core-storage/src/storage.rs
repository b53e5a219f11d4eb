//! # Storage Facade
//!
//! [`Storage`] is the public entry point. It owns an `Arc<StorageContext>`
//! and is cheap to clone; clones share the root handle and the I/O limit.
//!
//! File operations live in [`crate::files`], directory and tree operations in
//! [`crate::directories`]; both extend this type.

use bridge_traits::storage::{AccessMode, StorageHost};
use core_runtime::config::StorageConfig;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::entry::QuotaInfo;
use crate::error::{Result, StorageError};
use crate::navigator::StorageContext;
use crate::path::StoragePath;
use crate::walker;

/// Async, path-based access to a sandboxed store.
#[derive(Clone)]
pub struct Storage {
    ctx: Arc<StorageContext>,
}

impl Storage {
    /// Storage over the host and limits described by `config`.
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            max_concurrent_tasks = config.max_concurrent_tasks,
            "Creating storage"
        );
        Ok(Self {
            ctx: Arc::new(StorageContext::new(
                config.host,
                config.max_concurrent_tasks,
            )),
        })
    }

    /// Storage over `host` with the default limits.
    pub fn with_host(host: Arc<dyn StorageHost>) -> Self {
        Self {
            ctx: Arc::new(StorageContext::new(
                host,
                core_runtime::DEFAULT_MAX_CONCURRENT_TASKS,
            )),
        }
    }

    pub fn context(&self) -> &Arc<StorageContext> {
        &self.ctx
    }

    /// Used and available bytes as estimated by the host.
    ///
    /// # Errors
    ///
    /// [`StorageError::Unavailable`] when the host cannot estimate usage.
    #[instrument(skip(self))]
    pub async fn quota(&self) -> Result<QuotaInfo> {
        let estimate = self
            .ctx
            .host()
            .estimate_usage()
            .await?
            .ok_or_else(|| {
                StorageError::Unavailable("the host does not support usage estimation".to_string())
            })?;
        Ok(QuotaInfo {
            used: estimate.used,
            quota: estimate.quota,
            available: estimate.quota.saturating_sub(estimate.used),
        })
    }

    /// Removes every entry under the root. The root itself stays.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<()> {
        walker::clear_root(&self.ctx).await?;
        Ok(())
    }

    /// `true` when the entry at `path` exists and read access is granted.
    pub async fn is_readable(&self, path: &str) -> bool {
        self.permission_granted(path, AccessMode::Read).await
    }

    /// `true` when the entry at `path` exists and write access is granted.
    pub async fn is_writable(&self, path: &str) -> bool {
        self.permission_granted(path, AccessMode::ReadWrite).await
    }

    async fn permission_granted(&self, path: &str, mode: AccessMode) -> bool {
        let Ok(handle) = self.ctx.resolve_entry(&StoragePath::parse(path)).await else {
            return false;
        };
        handle
            .query_permission(mode)
            .await
            .map(|state| state.is_granted())
            .unwrap_or(false)
    }

    /// Queries `mode` on the entry at `path` and requests it when not yet
    /// granted.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] when the entry is absent
    /// - [`StorageError::PermissionDenied`] when the host does not grant `mode`
    #[instrument(skip(self))]
    pub async fn ensure_permission(&self, path: &str, mode: AccessMode) -> Result<()> {
        let handle = self.ctx.resolve_entry(&StoragePath::parse(path)).await?;
        let current = handle
            .query_permission(mode)
            .await
            .map_err(|e| StorageError::from_host(path, e))?;
        if current.is_granted() {
            return Ok(());
        }

        let requested = handle
            .request_permission(mode)
            .await
            .map_err(|e| StorageError::from_host(path, e))?;
        if requested.is_granted() {
            return Ok(());
        }
        Err(StorageError::PermissionDenied(format!(
            "{mode} access to {path} was not granted"
        )))
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("ctx", &self.ctx).finish()
    }
}

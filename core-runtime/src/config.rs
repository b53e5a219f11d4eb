//! # Storage Configuration
//!
//! Builder for the [`StorageConfig`] handed to the storage core.
//!
//! The configuration owns the [`StorageHost`] every operation resolves
//! against, the fan-out bound used by tree walks, and the logging settings
//! installed by [`StorageConfig::install_logging`].
//!
//! ## Required Dependencies
//!
//! - `StorageHost` - the sandboxed store. With the `desktop-shims` feature a
//!   directory-backed host is created from `root_directory` or `app_name`
//!   when none is injected.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::StorageConfig;
//!
//! let config = StorageConfig::builder()
//!     .root_directory("/tmp/sandbox")
//!     .max_concurrent_tasks(8)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Building without a host or a location for the desktop default fails fast:
//!
//! ```should_panic
//! use core_runtime::config::StorageConfig;
//!
//! let config = StorageConfig::builder()
//!     .build()
//!     .expect("Should fail - no storage host");
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;

use bridge_traits::StorageHost;
use std::path::PathBuf;
use std::sync::Arc;

/// Default bound on concurrently running host calls during tree walks.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 16;

/// Runtime configuration for the storage core.
#[derive(Clone)]
pub struct StorageConfig {
    /// Host providing the root directory handle
    pub host: Arc<dyn StorageHost>,
    /// Upper bound on in-flight host calls during tree fan-out
    pub max_concurrent_tasks: usize,
    pub logging: LoggingConfig,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("host", &"StorageHost { ... }")
            .field("max_concurrent_tasks", &self.max_concurrent_tasks)
            .field("logging", &self.logging)
            .finish()
    }
}

impl StorageConfig {
    pub fn builder() -> StorageConfigBuilder {
        StorageConfigBuilder::default()
    }

    /// Configuration around an already constructed host with default settings.
    pub fn with_host(host: Arc<dyn StorageHost>) -> Self {
        Self {
            host,
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            logging: LoggingConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_tasks == 0 {
            return Err(Error::Config(
                "max_concurrent_tasks must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Installs the global `tracing` subscriber described by `logging`.
    ///
    /// Storage never does this on its own; call it once from the binary
    /// that owns the process.
    pub fn install_logging(&self) -> Result<()> {
        crate::logging::init_logging(self.logging.clone())
    }
}

/// Builder for [`StorageConfig`].
#[derive(Default)]
pub struct StorageConfigBuilder {
    host: Option<Arc<dyn StorageHost>>,
    root_directory: Option<PathBuf>,
    app_name: Option<String>,
    quota_bytes: Option<u64>,
    max_concurrent_tasks: Option<usize>,
    logging: Option<LoggingConfig>,
}

impl StorageConfigBuilder {
    /// Injects the storage host. Takes precedence over the desktop defaults.
    pub fn host(mut self, host: Arc<dyn StorageHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Directory backing the default desktop host.
    pub fn root_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.root_directory = Some(path.into());
        self
    }

    /// Places the default desktop host under the platform data directory.
    ///
    /// Ignored when `root_directory` is set.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Quota reported by the default desktop host's usage estimate.
    pub fn quota_bytes(mut self, bytes: u64) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Default: [`DEFAULT_MAX_CONCURRENT_TASKS`]
    pub fn max_concurrent_tasks(mut self, limit: usize) -> Self {
        self.max_concurrent_tasks = Some(limit);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds the final `StorageConfig`.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when no host was injected and no
    ///   desktop default can be provided
    /// - [`Error::Config`] for invalid values
    pub fn build(self) -> Result<StorageConfig> {
        let host = match self.host {
            Some(host) => host,
            None => provide_default_host(
                self.root_directory,
                self.app_name.as_deref(),
                self.quota_bytes,
            )?,
        };

        let config = StorageConfig {
            host,
            max_concurrent_tasks: self
                .max_concurrent_tasks
                .unwrap_or(DEFAULT_MAX_CONCURRENT_TASKS),
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_host(
    root_directory: Option<PathBuf>,
    app_name: Option<&str>,
    quota_bytes: Option<u64>,
) -> Result<Arc<dyn StorageHost>> {
    use bridge_desktop::TokioStorageHost;

    let host = match (root_directory, app_name) {
        (Some(dir), _) => TokioStorageHost::new(dir),
        (None, Some(app)) => TokioStorageHost::in_data_dir(app),
        (None, None) => {
            return Err(Error::Config(
                "Desktop storage needs a location. Use .root_directory() or .app_name()."
                    .to_string(),
            ))
        }
    };
    let host = match quota_bytes {
        Some(bytes) => host.with_quota(bytes),
        None => host,
    };
    Ok(Arc::new(host))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_host(
    _root_directory: Option<PathBuf>,
    _app_name: Option<&str>,
    _quota_bytes: Option<u64>,
) -> Result<Arc<dyn StorageHost>> {
    Err(Error::CapabilityMissing {
        capability: "StorageHost".to_string(),
        message: "A StorageHost implementation is required. Inject one with .host() \
                  or enable the `desktop-shims` feature for a directory-backed default."
            .to_string(),
    })
}

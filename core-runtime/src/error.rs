use thiserror::Error;

/// Failures while assembling the storage runtime.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No storage host was injected and none can be provided on this platform.
    #[error("no {capability} available: {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The global subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Failures surfaced by storage operations.
///
/// Callers can tell an absent entry ([`NotFound`](Self::NotFound)) apart
/// from a refused one ([`PermissionDenied`](Self::PermissionDenied)) and a
/// malformed payload ([`ParseError`](Self::ParseError)).
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Entry not found: {path}")]
    NotFound { path: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unsupported payload type: {0}")]
    UnsupportedType(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Host error: {0}")]
    Host(#[from] BridgeError),

    #[error(transparent)]
    Config(#[from] core_runtime::Error),

    #[error("Task failed: {0}")]
    Task(String),
}

impl StorageError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Translates a host failure observed while working on `path`.
    pub fn from_host(path: &str, err: BridgeError) -> Self {
        if err.is_not_found() {
            return Self::not_found(path);
        }
        match err {
            BridgeError::PermissionDenied(message) => {
                Self::PermissionDenied(format!("{path}: {message}"))
            }
            other => Self::Host(other),
        }
    }

    /// Reports a `NotFound` against `path` as the caller spelled it.
    pub fn for_path(self, path: &str) -> Self {
        match self {
            Self::NotFound { .. } => Self::not_found(path),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    /// `true` when the path exists with the other entry kind.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::Host(BridgeError::TypeMismatch(_)))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<core_async::task::JoinError> for StorageError {
    fn from(err: core_async::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

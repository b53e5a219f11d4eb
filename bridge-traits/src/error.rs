use thiserror::Error;

/// Failures reported by a storage host.
///
/// Host adapters translate their native failures into these variants so the
/// storage core can tell "entry absent" apart from every other failure.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry has the wrong kind: {0}")]
    TypeMismatch(String),

    #[error("Invalid entry name: {0:?}")]
    InvalidName(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` when the failure means the requested entry is absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(BridgeError::NotFound("a.txt".into()).is_not_found());
        assert!(BridgeError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)).is_not_found());
        assert!(!BridgeError::TypeMismatch("a".into()).is_not_found());
        assert!(!BridgeError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied))
            .is_not_found());
    }
}

use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Backend-specific cause.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The compare-and-swap version check failed: somebody else wrote the
    /// room since it was loaded. The caller must re-read before retrying.
    #[error("version conflict on room `{code}`")]
    Conflict {
        /// Code of the contested room.
        code: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a version-conflict error for a room code.
    pub fn conflict(code: impl Into<String>) -> Self {
        StorageError::Conflict { code: code.into() }
    }
}

//! Cache store errors.

use thiserror::Error;

/// Errors from a key/value store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error during store operations.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to acquire the store lock.
    #[error("failed to acquire store lock")]
    Lock,

    /// The backend is unreachable or misconfigured.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

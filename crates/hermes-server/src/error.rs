//! Server errors.

use thiserror::Error;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is invalid or cannot be bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// The listener failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

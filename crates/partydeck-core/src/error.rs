// Domain errors surfaced by the catalog and session store.

use thiserror::Error;

/// Failures a caller can cause. Both variants carry a human-readable message
/// that is safe to show to end users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The request payload is malformed or insufficient (e.g. fewer than two
    /// colors).
    #[error("{0}")]
    InvalidInput(String),

    /// No session with the given id, or no card survives the filters.
    #[error("{0}")]
    NotFound(String),
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

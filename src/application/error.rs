//! Application-level error umbrella.

use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::DomainError;

/// Failure of a read or write operation against the content backend.
///
/// Cache faults never surface here; they are absorbed into degraded
/// results by the cache layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// True when the operation failed because the record does not exist,
    /// regardless of which layer reported it.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Domain(DomainError::NotFound { .. }) => true,
            Self::Repo(err) => err.is_not_found(),
            _ => false,
        }
    }
}

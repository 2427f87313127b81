use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain entity `{entity}` not found")]
    NotFound { entity: &'static str },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
    #[error("conflicting state: {message}")]
    Conflict { message: String },
    #[error("domain invariant violated: {message}")]
    Invariant { message: String },
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The write collides with existing state, e.g. enrolling twice in the
    /// same course.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }
}

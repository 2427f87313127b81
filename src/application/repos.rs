//! Repository traits describing persistence adapters.
//!
//! Canonical record storage is an external collaborator; the consistency
//! layer only sees these narrow interfaces. A repository error during a
//! write is fatal to the triggering request, unlike cache errors, which
//! degrade.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{CourseRecord, OrderRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("record not found")]
    NotFound,
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("storage timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

#[async_trait]
pub trait CoursesRepo: Send + Sync {
    /// Load a single course; `RepoError::NotFound` when absent.
    async fn load(&self, id: Uuid) -> Result<CourseRecord, RepoError>;

    /// All courses, newest first.
    async fn load_all(&self) -> Result<Vec<CourseRecord>, RepoError>;

    /// Courses matching `ids`, newest first. Missing ids are skipped.
    async fn load_many(&self, ids: &[Uuid]) -> Result<Vec<CourseRecord>, RepoError>;

    /// Durably create or replace the full record.
    async fn save(&self, course: &CourseRecord) -> Result<(), RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait OrdersRepo: Send + Sync {
    async fn create(&self, order: &OrderRecord) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    /// Load a single account; `RepoError::NotFound` when absent.
    async fn load(&self, id: Uuid) -> Result<UserRecord, RepoError>;

    /// Durably create or replace the full record.
    async fn save(&self, user: &UserRecord) -> Result<(), RepoError>;
}

//! Domain entities mirrored from persistent storage.
//!
//! These are the canonical records owned by the content repository. Cache
//! entries are derived projections of them, never authoritative.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{CourseLevel, UserRole};

/// One lesson inside a course, including instructor-only material.
///
/// The public catalog projection strips `video_url`, `suggestion` and
/// `resource_links`; only enrolled readers ever see them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseUnitRecord {
    pub id: Uuid,
    pub title: String,
    pub section: String,
    pub description: String,
    pub video_length_minutes: u32,
    pub video_url: String,
    pub suggestion: Option<String>,
    pub resource_links: Vec<ResourceLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub level: CourseLevel,
    pub price_cents: i64,
    pub estimated_price_cents: Option<i64>,
    /// Instructor account that owns this course.
    pub created_by: Uuid,
    pub units: Vec<CourseUnitRecord>,
    pub rating: f32,
    /// Accounts currently enrolled. Membership drives per-user listing
    /// invalidation, so this set must stay accurate on the write path.
    pub enrolled: Vec<Uuid>,
    pub enrolled_count: u64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl CourseRecord {
    pub fn is_enrolled(&self, user_id: Uuid) -> bool {
        self.enrolled.contains(&user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    /// Opaque reference into the external payment collaborator.
    pub payment_ref: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Courses this account is enrolled in, newest last.
    pub courses: Vec<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

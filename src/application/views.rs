//! View projections stored in the cache.
//!
//! Cache values are full serialized snapshots of these types, written once
//! and never patched in place; invalidation reconstructs the whole entry.
//! Projections strip instructor-only unit material (video URLs, suggestions,
//! resource links) so a cached view is always safe to serve publicly.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{CourseRecord, UserRecord};
use crate::domain::types::{CourseLevel, UserRole};

/// Public subset of a course unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOutline {
    pub id: Uuid,
    pub title: String,
    pub section: String,
    pub description: String,
    pub video_length_minutes: u32,
}

/// The per-course detail blob served on `course:{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDetailView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub level: CourseLevel,
    pub price_cents: i64,
    pub estimated_price_cents: Option<i64>,
    pub created_by: Uuid,
    pub units: Vec<UnitOutline>,
    pub rating: f32,
    pub enrolled_count: u64,
    pub updated_at: OffsetDateTime,
}

impl CourseDetailView {
    pub fn project(record: &CourseRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            tags: record.tags.clone(),
            level: record.level,
            price_cents: record.price_cents,
            estimated_price_cents: record.estimated_price_cents,
            created_by: record.created_by,
            units: record
                .units
                .iter()
                .map(|unit| UnitOutline {
                    id: unit.id,
                    title: unit.title.clone(),
                    section: unit.section.clone(),
                    description: unit.description.clone(),
                    video_length_minutes: unit.video_length_minutes,
                })
                .collect(),
            rating: record.rating,
            enrolled_count: record.enrolled_count,
            updated_at: record.updated_at,
        }
    }
}

/// One catalog card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub level: CourseLevel,
    pub price_cents: i64,
    pub rating: f32,
    pub enrolled_count: u64,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
}

impl CatalogItem {
    fn project(record: &CourseRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            category: record.category.clone(),
            tags: record.tags.clone(),
            level: record.level,
            price_cents: record.price_cents,
            rating: record.rating,
            enrolled_count: record.enrolled_count,
            created_by: record.created_by,
            created_at: record.created_at,
        }
    }
}

/// The global collection served on `listing:all:course`, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogListing {
    pub items: Vec<CatalogItem>,
}

impl CatalogListing {
    pub fn project(records: &[CourseRecord]) -> Self {
        let mut items: Vec<_> = records.iter().map(CatalogItem::project).collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { items }
    }
}

/// The per-user enrolled listing served on `listing:user:{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentListing {
    pub user_id: Uuid,
    pub items: Vec<CatalogItem>,
}

impl EnrollmentListing {
    pub fn project(user_id: Uuid, records: &[CourseRecord]) -> Self {
        let listing = CatalogListing::project(records);
        Self {
            user_id,
            items: listing.items,
        }
    }
}

/// The per-account profile snapshot served on `user:{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub courses: Vec<Uuid>,
}

impl ProfileView {
    pub fn project(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
            role: record.role,
            courses: record.courses.clone(),
        }
    }
}

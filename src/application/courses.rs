//! Write path for course records.
//!
//! Every committed course mutation flows through the invalidation
//! coordinator in the same call, with the affected owner and member sets
//! taken from the record itself. Cache failures degrade; they never roll
//! back the repository write.

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{CoursesRepo, RepoError};
use crate::application::views::CatalogListing;
use crate::cache::{CacheSync, InvalidationCoordinator, Mutation};
use crate::domain::entities::{CourseRecord, CourseUnitRecord};
use crate::domain::types::CourseLevel;

/// Instructor-supplied course content, without any identity or
/// enrollment state.
#[derive(Debug, Clone)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub level: CourseLevel,
    pub price_cents: i64,
    pub estimated_price_cents: Option<i64>,
    pub units: Vec<CourseUnitRecord>,
}

/// A committed write plus the cache work it triggered.
#[derive(Debug)]
pub struct CourseWriteOutcome {
    pub course: CourseRecord,
    pub cache: CacheSync,
}

pub struct CourseAdminService {
    courses: Arc<dyn CoursesRepo>,
    coordinator: Arc<InvalidationCoordinator>,
}

impl CourseAdminService {
    pub fn new(courses: Arc<dyn CoursesRepo>, coordinator: Arc<InvalidationCoordinator>) -> Self {
        Self {
            courses,
            coordinator,
        }
    }

    pub async fn create_course(
        &self,
        instructor_id: Uuid,
        draft: CourseDraft,
    ) -> Result<CourseWriteOutcome, AppError> {
        let now = OffsetDateTime::now_utc();
        let course = CourseRecord {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            tags: draft.tags,
            level: draft.level,
            price_cents: draft.price_cents,
            estimated_price_cents: draft.estimated_price_cents,
            created_by: instructor_id,
            units: draft.units,
            rating: 0.0,
            enrolled: Vec::new(),
            enrolled_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.courses.save(&course).await?;

        let cache = self.invalidate(&course).await;
        Ok(CourseWriteOutcome { course, cache })
    }

    /// Replace the content fields of an existing course; identity and
    /// enrollment state are preserved.
    pub async fn update_course(
        &self,
        course_id: Uuid,
        draft: CourseDraft,
    ) -> Result<CourseWriteOutcome, AppError> {
        let mut course = self.courses.load(course_id).await?;
        course.title = draft.title;
        course.description = draft.description;
        course.category = draft.category;
        course.tags = draft.tags;
        course.level = draft.level;
        course.price_cents = draft.price_cents;
        course.estimated_price_cents = draft.estimated_price_cents;
        course.units = draft.units;
        course.updated_at = OffsetDateTime::now_utc();
        self.courses.save(&course).await?;

        let cache = self.invalidate(&course).await;
        Ok(CourseWriteOutcome { course, cache })
    }

    /// Delete a course. The affected key set is enumerated from the record
    /// as it stood before deletion, so enrolled readers' listings purge too.
    pub async fn delete_course(&self, course_id: Uuid) -> Result<CacheSync, AppError> {
        let course = self.courses.load(course_id).await?;
        self.courses.delete(course_id).await?;

        Ok(self.invalidate(&course).await)
    }

    async fn invalidate(&self, course: &CourseRecord) -> CacheSync {
        let mutation = Mutation::course(course.id)
            .with_owner(course.created_by)
            .with_members(course.enrolled.iter().copied());
        self.coordinator
            .on_mutation_with_refresh(&mutation, || self.load_catalog())
            .await
    }

    async fn load_catalog(&self) -> Result<CatalogListing, RepoError> {
        let records = self.courses.load_all().await?;
        Ok(CatalogListing::project(&records))
    }
}

#[cfg(test)]
mod tests {
    use crate::application::testkit::{MemoryCoursesRepo, sample_course};
    use crate::cache::{CacheKey, KeyValueStore, MemoryStore};

    use super::*;

    fn draft() -> CourseDraft {
        CourseDraft {
            title: "Async Rust".to_string(),
            description: "Futures in practice".to_string(),
            category: "programming".to_string(),
            tags: vec!["rust".to_string()],
            level: CourseLevel::Advanced,
            price_cents: 7900,
            estimated_price_cents: None,
            units: Vec::new(),
        }
    }

    fn service(
        courses: Arc<MemoryCoursesRepo>,
        store: Arc<MemoryStore>,
    ) -> CourseAdminService {
        CourseAdminService::new(courses, Arc::new(InvalidationCoordinator::new(store)))
    }

    #[tokio::test]
    async fn create_refreshes_the_global_listing_eagerly() {
        let courses = Arc::new(MemoryCoursesRepo::new());
        let store = Arc::new(MemoryStore::new());
        let service = service(courses.clone(), store.clone());

        let outcome = service
            .create_course(Uuid::new_v4(), draft())
            .await
            .expect("create");
        assert!(outcome.cache.is_clean());
        assert!(outcome.cache.refreshed_global);

        let bytes = store
            .get(&CacheKey::course_catalog().to_string())
            .await
            .expect("get")
            .expect("listing present");
        let listing: CatalogListing = serde_json::from_slice(&bytes).expect("decode");
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].id, outcome.course.id);
    }

    #[tokio::test]
    async fn update_purges_detail_and_enrolled_listings() {
        let courses = Arc::new(MemoryCoursesRepo::new());
        let store = Arc::new(MemoryStore::new());
        let service = service(courses.clone(), store.clone());

        let buyer = Uuid::new_v4();
        let mut course = sample_course(Uuid::new_v4());
        course.enrolled.push(buyer);
        courses.insert(course.clone()).await;

        for key in [
            CacheKey::course(course.id),
            CacheKey::user_listing(buyer),
        ] {
            store
                .set(&key.to_string(), b"stale".to_vec(), None)
                .await
                .expect("seed");
        }

        let outcome = service.update_course(course.id, draft()).await.expect("update");
        assert!(outcome.cache.is_clean());
        assert_eq!(outcome.course.enrolled, vec![buyer]);

        for key in [
            CacheKey::course(course.id),
            CacheKey::user_listing(buyer),
        ] {
            assert!(
                store.get(&key.to_string()).await.expect("get").is_none(),
                "{key} should be purged"
            );
        }
    }

    #[tokio::test]
    async fn delete_uses_the_pre_deletion_member_set() {
        let courses = Arc::new(MemoryCoursesRepo::new());
        let store = Arc::new(MemoryStore::new());
        let service = service(courses.clone(), store.clone());

        let buyer = Uuid::new_v4();
        let mut course = sample_course(Uuid::new_v4());
        course.enrolled.push(buyer);
        courses.insert(course.clone()).await;

        let listing_key = CacheKey::user_listing(buyer);
        store
            .set(&listing_key.to_string(), b"stale".to_vec(), None)
            .await
            .expect("seed");

        let sync = service.delete_course(course.id).await.expect("delete");
        assert!(sync.is_clean());
        assert_eq!(courses.count().await, 0);
        assert!(
            store
                .get(&listing_key.to_string())
                .await
                .expect("get")
                .is_none()
        );
    }

    #[tokio::test]
    async fn delete_of_missing_course_is_not_found() {
        let service = service(
            Arc::new(MemoryCoursesRepo::new()),
            Arc::new(MemoryStore::new()),
        );
        let err = service
            .delete_course(Uuid::new_v4())
            .await
            .expect_err("absent course");
        assert!(err.is_not_found());
    }
}

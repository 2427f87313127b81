//! Cached read path for catalog and account views.
//!
//! Every read goes through the cache-aside reader; the repositories are only
//! reached on a miss. Absent records propagate as errors and are never
//! cached, so newly created content shows up on the next read.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{CoursesRepo, UsersRepo};
use crate::application::views::{CatalogListing, CourseDetailView, EnrollmentListing, ProfileView};
use crate::cache::{CacheAsideReader, CacheKey};

pub struct CatalogService {
    courses: Arc<dyn CoursesRepo>,
    users: Arc<dyn UsersRepo>,
    reader: Arc<CacheAsideReader>,
}

impl CatalogService {
    pub fn new(
        courses: Arc<dyn CoursesRepo>,
        users: Arc<dyn UsersRepo>,
        reader: Arc<CacheAsideReader>,
    ) -> Self {
        Self {
            courses,
            users,
            reader,
        }
    }

    /// Single-course detail, served from `course:{id}`.
    pub async fn course_detail(&self, course_id: Uuid) -> Result<CourseDetailView, AppError> {
        let key = CacheKey::course(course_id);
        let courses = self.courses.clone();
        let view = self
            .reader
            .read(&key, move || async move {
                let record = courses.load(course_id).await?;
                Ok(CourseDetailView::project(&record))
            })
            .await?;
        Ok(view)
    }

    /// The full course catalog, served from `listing:all:course`.
    pub async fn catalog(&self) -> Result<CatalogListing, AppError> {
        let key = CacheKey::course_catalog();
        let courses = self.courses.clone();
        let listing = self
            .reader
            .read(&key, move || async move {
                let records = courses.load_all().await?;
                Ok(CatalogListing::project(&records))
            })
            .await?;
        Ok(listing)
    }

    /// Courses the account is enrolled in, served from `listing:user:{id}`.
    ///
    /// The membership list comes from the account record, so a stale cached
    /// listing here is exactly what enrollment invalidation purges.
    pub async fn enrollments(&self, user_id: Uuid) -> Result<EnrollmentListing, AppError> {
        let key = CacheKey::user_listing(user_id);
        let courses = self.courses.clone();
        let users = self.users.clone();
        let listing = self
            .reader
            .read(&key, move || async move {
                let account = users.load(user_id).await?;
                let records = courses.load_many(&account.courses).await?;
                Ok(EnrollmentListing::project(user_id, &records))
            })
            .await?;
        Ok(listing)
    }

    /// Account profile, served from `user:{id}`.
    pub async fn profile(&self, user_id: Uuid) -> Result<ProfileView, AppError> {
        let key = CacheKey::user_profile(user_id);
        let users = self.users.clone();
        let view = self
            .reader
            .read(&key, move || async move {
                let record = users.load(user_id).await?;
                Ok(ProfileView::project(&record))
            })
            .await?;
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use crate::application::testkit::{
        MemoryCoursesRepo, MemoryUsersRepo, sample_course, sample_user,
    };
    use crate::cache::{KeyValueStore, MemoryStore, TtlPolicy};

    use super::*;

    fn service(
        courses: Arc<MemoryCoursesRepo>,
        users: Arc<MemoryUsersRepo>,
        store: Arc<MemoryStore>,
    ) -> CatalogService {
        let reader = Arc::new(CacheAsideReader::new(store, TtlPolicy::default()));
        CatalogService::new(courses, users, reader)
    }

    #[tokio::test]
    async fn detail_read_populates_cache_then_serves_from_it() {
        let courses = Arc::new(MemoryCoursesRepo::new());
        let users = Arc::new(MemoryUsersRepo::new());
        let store = Arc::new(MemoryStore::new());
        let course = sample_course(Uuid::new_v4());
        courses.insert(course.clone()).await;

        let service = service(courses.clone(), users, store.clone());
        let first = service.course_detail(course.id).await.expect("first read");
        assert_eq!(first.id, course.id);
        assert_eq!(store.len(), 1);

        // A repo-side change without invalidation is invisible: the cached
        // snapshot wins until something purges it.
        courses.remove(course.id).await;
        let second = service.course_detail(course.id).await.expect("cached read");
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn missing_course_propagates_not_found() {
        let service = service(
            Arc::new(MemoryCoursesRepo::new()),
            Arc::new(MemoryUsersRepo::new()),
            Arc::new(MemoryStore::new()),
        );

        let err = service
            .course_detail(Uuid::new_v4())
            .await
            .expect_err("absent course");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn enrollments_join_account_membership_with_courses() {
        let courses = Arc::new(MemoryCoursesRepo::new());
        let users = Arc::new(MemoryUsersRepo::new());
        let store = Arc::new(MemoryStore::new());

        let enrolled = sample_course(Uuid::new_v4());
        let other = sample_course(Uuid::new_v4());
        courses.insert(enrolled.clone()).await;
        courses.insert(other).await;

        let mut account = sample_user();
        account.courses.push(enrolled.id);
        users.insert(account.clone()).await;

        let service = service(courses, users, store);
        let listing = service.enrollments(account.id).await.expect("listing");

        assert_eq!(listing.user_id, account.id);
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].id, enrolled.id);
    }

    #[tokio::test]
    async fn profile_is_cached_under_the_user_key() {
        let courses = Arc::new(MemoryCoursesRepo::new());
        let users = Arc::new(MemoryUsersRepo::new());
        let store = Arc::new(MemoryStore::new());
        let account = sample_user();
        users.insert(account.clone()).await;

        let service = service(courses, users, store.clone());
        let profile = service.profile(account.id).await.expect("profile");
        assert_eq!(profile.email, account.email);

        let cached = store
            .get(&CacheKey::user_profile(account.id).to_string())
            .await
            .expect("get");
        assert!(cached.is_some());
    }
}

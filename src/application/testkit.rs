//! In-memory repository fakes and record builders for tests.
//!
//! Compiled only for tests and for downstream crates that opt into the
//! `testkit` feature.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::repos::{CoursesRepo, OrdersRepo, RepoError, UsersRepo};
use crate::domain::entities::{CourseRecord, OrderRecord, UserRecord};
use crate::domain::types::{CourseLevel, UserRole};

#[derive(Default)]
pub struct MemoryCoursesRepo {
    courses: RwLock<HashMap<Uuid, CourseRecord>>,
}

impl MemoryCoursesRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, course: CourseRecord) {
        self.courses.write().await.insert(course.id, course);
    }

    pub async fn remove(&self, id: Uuid) -> Option<CourseRecord> {
        self.courses.write().await.remove(&id)
    }

    pub async fn count(&self) -> usize {
        self.courses.read().await.len()
    }
}

#[async_trait]
impl CoursesRepo for MemoryCoursesRepo {
    async fn load(&self, id: Uuid) -> Result<CourseRecord, RepoError> {
        self.courses
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn load_all(&self) -> Result<Vec<CourseRecord>, RepoError> {
        let mut records: Vec<_> = self.courses.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn load_many(&self, ids: &[Uuid]) -> Result<Vec<CourseRecord>, RepoError> {
        let guard = self.courses.read().await;
        let mut records: Vec<_> = ids.iter().filter_map(|id| guard.get(id).cloned()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn save(&self, course: &CourseRecord) -> Result<(), RepoError> {
        self.courses
            .write()
            .await
            .insert(course.id, course.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.courses
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryOrdersRepo {
    orders: RwLock<Vec<OrderRecord>>,
}

impl MemoryOrdersRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<OrderRecord> {
        self.orders.read().await.clone()
    }
}

#[async_trait]
impl OrdersRepo for MemoryOrdersRepo {
    async fn create(&self, order: &OrderRecord) -> Result<(), RepoError> {
        let mut guard = self.orders.write().await;
        if guard.iter().any(|existing| existing.id == order.id) {
            return Err(RepoError::Duplicate {
                constraint: "orders.id".to_string(),
            });
        }
        guard.push(order.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUsersRepo {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl MemoryUsersRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: UserRecord) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UsersRepo for MemoryUsersRepo {
    async fn load(&self, id: Uuid) -> Result<UserRecord, RepoError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn save(&self, user: &UserRecord) -> Result<(), RepoError> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }
}

pub fn sample_course(created_by: Uuid) -> CourseRecord {
    let now = OffsetDateTime::now_utc();
    CourseRecord {
        id: Uuid::new_v4(),
        title: "Practical Caching".to_string(),
        description: "Cache-aside reads and explicit invalidation".to_string(),
        category: "programming".to_string(),
        tags: vec!["backend".to_string()],
        level: CourseLevel::Intermediate,
        price_cents: 4900,
        estimated_price_cents: None,
        created_by,
        units: Vec::new(),
        rating: 0.0,
        enrolled: Vec::new(),
        enrolled_count: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_user() -> UserRecord {
    let now = OffsetDateTime::now_utc();
    let id = Uuid::new_v4();
    UserRecord {
        id,
        name: "Test Learner".to_string(),
        email: format!("{id}@example.test"),
        role: UserRole::Learner,
        courses: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

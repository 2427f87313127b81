//! Enrollment write path.
//!
//! `enroll` is an ordered pipeline of independently fallible steps: validate
//! against the canonical records, commit the order and membership, purge and
//! rebuild the affected cache keys, then notify the instructor. A repository
//! failure aborts the request; cache and notification failures only degrade
//! the already-committed enrollment.

use std::sync::Arc;

use serde_json::json;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{CoursesRepo, OrdersRepo, RepoError, UsersRepo};
use crate::application::views::CatalogListing;
use crate::cache::{CacheSync, InvalidationCoordinator, Mutation};
use crate::domain::DomainError;
use crate::domain::entities::OrderRecord;
use crate::realtime::{DeliveryOutcome, NotificationEvent, NotificationRouter};

/// Everything a committed enrollment produced: the durable order plus the
/// degraded-success records of the cache and notification steps.
#[derive(Debug)]
pub struct EnrollmentOutcome {
    pub order: OrderRecord,
    pub cache: CacheSync,
    pub delivery: DeliveryOutcome,
}

pub struct EnrollmentService {
    courses: Arc<dyn CoursesRepo>,
    orders: Arc<dyn OrdersRepo>,
    users: Arc<dyn UsersRepo>,
    coordinator: Arc<InvalidationCoordinator>,
    router: Arc<NotificationRouter>,
}

impl EnrollmentService {
    pub fn new(
        courses: Arc<dyn CoursesRepo>,
        orders: Arc<dyn OrdersRepo>,
        users: Arc<dyn UsersRepo>,
        coordinator: Arc<InvalidationCoordinator>,
        router: Arc<NotificationRouter>,
    ) -> Self {
        Self {
            courses,
            orders,
            users,
            coordinator,
            router,
        }
    }

    pub async fn enroll(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        payment_ref: Option<String>,
    ) -> Result<EnrollmentOutcome, AppError> {
        let mut course = self.courses.load(course_id).await?;
        let mut account = self.users.load(user_id).await?;
        if course.is_enrolled(user_id) {
            return Err(DomainError::conflict("account is already enrolled in this course").into());
        }

        let now = OffsetDateTime::now_utc();
        let order = OrderRecord {
            id: Uuid::new_v4(),
            course_id,
            user_id,
            payment_ref,
            created_at: now,
        };
        self.orders.create(&order).await?;

        course.enrolled.push(user_id);
        course.enrolled_count += 1;
        course.updated_at = now;
        self.courses.save(&course).await?;

        account.courses.push(course_id);
        account.updated_at = now;
        self.users.save(&account).await?;

        // Canonical state is committed from here on; the remaining steps
        // degrade instead of failing the request.
        let course_mutation = Mutation::course(course_id)
            .with_owner(course.created_by)
            .with_members(course.enrolled.iter().copied());
        let cache = self
            .coordinator
            .on_mutation_with_refresh(&course_mutation, || self.load_catalog())
            .await;

        let account_mutation = Mutation::user(user_id).with_members([user_id]);
        let cache = cache.merge(self.coordinator.on_mutation(&account_mutation).await);

        let delivery = self.router.deliver(NotificationEvent::targeted(
            course.created_by,
            json!({
                "title": "New Order",
                "message": format!("You have a new order for {}", course.title),
                "course_id": course_id,
                "order_id": order.id,
            }),
        ));

        info!(
            order_id = %order.id,
            course_id = %course_id,
            user_id = %user_id,
            cache = %cache,
            notified = delivery.is_delivered(),
            "Enrollment committed"
        );
        Ok(EnrollmentOutcome {
            order,
            cache,
            delivery,
        })
    }

    async fn load_catalog(&self) -> Result<CatalogListing, RepoError> {
        let records = self.courses.load_all().await?;
        Ok(CatalogListing::project(&records))
    }
}

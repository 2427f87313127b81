//! Application services over the cache and realtime layers.
//!
//! Reads go through [`catalog::CatalogService`] and the cache-aside reader;
//! writes go through [`courses::CourseAdminService`] and
//! [`enrollment::EnrollmentService`], each of which invalidates synchronously
//! after committing. Persistence is abstracted behind the [`repos`] traits.

pub mod catalog;
pub mod courses;
pub mod enrollment;
pub mod error;
pub mod repos;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod views;

pub use error::AppError;

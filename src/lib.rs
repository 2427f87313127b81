//! Aula: cache-aside consistency and targeted notification fan-out for a
//! course-catalog backend.
//!
//! The crate has two independent subsystems wired together by the write
//! path. The cache layer keeps computed views in an external key-value
//! store and purges exactly the keys a committed mutation makes stale. The
//! realtime layer pushes write-triggered events to the one operator session
//! they name, with no queue and no replay.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod realtime;
pub(crate) mod util;

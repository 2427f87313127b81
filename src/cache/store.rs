//! Key-value storage boundary.
//!
//! The cache service is external; this module defines the minimal protocol
//! surface the consistency layer needs (GET / SET with optional TTL / DEL)
//! and a process-local implementation for single-node deployments and tests.
//! The Redis-backed implementation lives in [`crate::cache::redis`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

/// Errors surfaced by a key-value store.
///
/// `Unavailable` is the degradation signal: readers fall back to loading
/// from the repository, writers report degraded success. Neither retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache service unavailable: {message}")]
    Unavailable { message: String },
    #[error("cache value could not be encoded or decoded: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Async GET/SET/DEL against the external cache service.
///
/// Values are opaque serialized snapshots; the store never interprets them.
/// An expired entry must be indistinguishable from an absent one.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
    -> Result<(), StoreError>;

    /// Idempotent removal; deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Process-local key-value store.
///
/// Used when the deployment runs without an external cache service, and by
/// every test that exercises the consistency layer. TTL expiry is lazy: an
/// expired entry is dropped on the next read of its key.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired(Instant::now()) {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .insert(key.to_string(), MemoryEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

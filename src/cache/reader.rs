//! Cache-aside read path.
//!
//! Readers check the key-value store first and fall back to a caller-supplied
//! loader on miss, repopulating the store with the loaded view. The store is
//! never authoritative: any cache failure degrades to a repository load.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::application::repos::RepoError;

use super::keys::{CacheKey, TtlPolicy};
use super::store::KeyValueStore;

const METRIC_CACHE_HIT: &str = "aula_cache_hit_total";
const METRIC_CACHE_MISS: &str = "aula_cache_miss_total";
const METRIC_CACHE_DEGRADED: &str = "aula_cache_degraded_total";

pub struct CacheAsideReader {
    store: Arc<dyn KeyValueStore>,
    ttl: TtlPolicy,
}

impl CacheAsideReader {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: TtlPolicy) -> Self {
        Self { store, ttl }
    }

    /// Serve `key` from cache, or load, store and return.
    ///
    /// On hit the loader is never invoked. On miss the loaded view is written
    /// back under the key's TTL policy. Loader failures propagate untouched
    /// and leave no cache entry behind — absence is never cached, so a record
    /// created later becomes visible on the next read. A store failure at any
    /// point degrades to a direct load instead of failing the read.
    pub async fn read<T, L, Fut>(&self, key: &CacheKey, loader: L) -> Result<T, RepoError>
    where
        T: Serialize + DeserializeOwned,
        L: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RepoError>>,
    {
        let wire = key.to_string();

        let cached = match self.store.get(&wire).await {
            Ok(cached) => cached,
            Err(err) => {
                warn!(
                    key = %wire,
                    error = %err,
                    "Cache read failed; degrading to repository load"
                );
                counter!(METRIC_CACHE_DEGRADED).increment(1);
                // Skip the write-back too: the store is unreachable.
                return loader().await;
            }
        };

        if let Some(bytes) = cached {
            match serde_json::from_slice(&bytes) {
                Ok(view) => {
                    debug!(key = %wire, "Cache hit");
                    counter!(METRIC_CACHE_HIT).increment(1);
                    return Ok(view);
                }
                Err(err) => {
                    warn!(
                        key = %wire,
                        error = %err,
                        "Cached snapshot failed to decode; treating as miss"
                    );
                }
            }
        }

        counter!(METRIC_CACHE_MISS).increment(1);
        let view = loader().await?;

        match serde_json::to_vec(&view) {
            Ok(bytes) => {
                if let Err(err) = self.store.set(&wire, bytes, key.ttl(&self.ttl)).await {
                    warn!(
                        key = %wire,
                        error = %err,
                        "Cache write-back failed; next read reloads"
                    );
                    counter!(METRIC_CACHE_DEGRADED).increment(1);
                }
            }
            Err(err) => {
                warn!(key = %wire, error = %err, "View snapshot failed to encode");
            }
        }

        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::cache::store::{MemoryStore, StoreError};

    use super::*;

    struct UnreachableStore;

    #[async_trait]
    impl KeyValueStore for UnreachableStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn set(
            &self,
            _key: &str,
            _value: Vec<u8>,
            _ttl: Option<Duration>,
        ) -> Result<(), StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }
    }

    fn reader_with(store: Arc<dyn KeyValueStore>) -> CacheAsideReader {
        CacheAsideReader::new(store, TtlPolicy::default())
    }

    #[tokio::test]
    async fn miss_loads_and_populates() {
        let store = Arc::new(MemoryStore::new());
        let reader = reader_with(store.clone());
        let key = CacheKey::course(Uuid::new_v4());
        let loads = AtomicUsize::new(0);

        let view: String = reader
            .read(&key, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok("detail".to_string())
            })
            .await
            .expect("read");

        assert_eq!(view, "detail");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn hit_skips_loader() {
        let store = Arc::new(MemoryStore::new());
        let reader = reader_with(store.clone());
        let key = CacheKey::course(Uuid::new_v4());
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let view: String = reader
                .read(&key, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok("detail".to_string())
                })
                .await
                .expect("read");
            assert_eq!(view, "detail");
        }

        // Only the first read touched the loader.
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absence_is_never_cached() {
        let store = Arc::new(MemoryStore::new());
        let reader = reader_with(store.clone());
        let key = CacheKey::course(Uuid::new_v4());
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let result: Result<String, _> = reader
                .read(&key, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Err(RepoError::NotFound)
                })
                .await;
            assert!(matches!(result, Err(RepoError::NotFound)));
        }

        // Both reads invoked the loader; nothing was stored.
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unreachable_store_degrades_to_load() {
        let reader = reader_with(Arc::new(UnreachableStore));
        let key = CacheKey::course_catalog();

        let view: Vec<String> = reader
            .read(&key, || async { Ok(vec!["course".to_string()]) })
            .await
            .expect("degraded read");

        assert_eq!(view, vec!["course".to_string()]);
    }

    #[tokio::test]
    async fn expired_entry_triggers_reload() {
        let store = Arc::new(MemoryStore::new());
        let reader = CacheAsideReader::new(
            store.clone(),
            TtlPolicy {
                entity: Duration::from_millis(10),
                ..TtlPolicy::default()
            },
        );
        let key = CacheKey::course(Uuid::new_v4());
        let loads = AtomicUsize::new(0);

        let load = || async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok("detail".to_string())
        };

        let _: String = reader.read(&key, load).await.expect("first read");
        tokio::time::sleep(Duration::from_millis(30)).await;
        let _: String = reader.read(&key, load).await.expect("second read");

        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn undecodable_entry_is_overwritten() {
        let store = Arc::new(MemoryStore::new());
        let key = CacheKey::course(Uuid::new_v4());
        store
            .set(&key.to_string(), b"not json".to_vec(), None)
            .await
            .expect("seed garbage");

        let reader = reader_with(store.clone());
        let view: String = reader
            .read(&key, || async { Ok("fresh".to_string()) })
            .await
            .expect("read");

        assert_eq!(view, "fresh");
        let bytes = store
            .get(&key.to_string())
            .await
            .expect("get")
            .expect("entry present");
        let stored: String = serde_json::from_slice(&bytes).expect("valid snapshot");
        assert_eq!(stored, "fresh");
    }
}

//! Redis-backed key-value store.
//!
//! Production deployments point the cache at a shared Redis instance; the
//! connection manager reconnects transparently so a transient outage shows
//! up as `StoreError::Unavailable` rather than a wedged connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::info;

use super::store::{KeyValueStore, StoreError};

pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to the cache service at `url` (e.g. `redis://127.0.0.1/`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(to_unavailable)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(to_unavailable)?;
        info!(backend = "redis", "Cache store connected");
        Ok(Self { manager })
    }
}

fn to_unavailable(err: redis::RedisError) -> StoreError {
    StoreError::unavailable(err.to_string())
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(to_unavailable)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        match ttl {
            Some(ttl) => {
                // EX takes whole seconds; round sub-second TTLs up so a
                // positive TTL never becomes "no expiry".
                let secs = ttl.as_secs().max(1);
                conn.set_ex::<_, _, ()>(key, value, secs)
                    .await
                    .map_err(to_unavailable)
            }
            None => conn.set::<_, _, ()>(key, value).await.map_err(to_unavailable),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await.map_err(to_unavailable)
    }
}

//! Aula cache-aside consistency layer.
//!
//! Computed views are stored in an external key-value service and served on
//! subsequent reads; the write path invalidates exactly the keys a mutation
//! makes stale. There is no transaction coordinator: staleness is bounded by
//! the synchronous invalidation step, and every cache failure degrades
//! instead of failing the request.
//!
//! - [`keys`]: typed cache keys with the stable wire naming and TTL policy
//! - [`store`]: the GET/SET/DEL protocol boundary plus a process-local store
//! - [`redis`]: the external Redis-backed store
//! - [`reader`]: cache-aside read path
//! - [`invalidation`]: mutation-driven key enumeration and purging

mod invalidation;
mod keys;
mod reader;
mod redis;
mod store;

pub use invalidation::{CacheSync, InvalidationCoordinator, Mutation};
pub use keys::{CacheKey, DEFAULT_ENTITY_TTL, EntityKind, TtlPolicy};
pub use reader::CacheAsideReader;
pub use redis::RedisStore;
pub use store::{KeyValueStore, MemoryStore, StoreError};

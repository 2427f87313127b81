//! Invalidation coordination.
//!
//! Every mutation to a canonical record enumerates the cache keys whose
//! cached views are now stale and deletes them. The affected set is computed
//! from the record's own data (owner and member sets), never from ad hoc
//! per-call-site lists, so a new derived view only needs a new key shape
//! here.
//!
//! Policy: delete, don't refresh — the next reader repopulates. The one
//! exception is the global listing, which is read far more often than it is
//! written and is eagerly rebuilt in-line after deletion.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::repos::RepoError;

use super::keys::{CacheKey, EntityKind};
use super::store::KeyValueStore;

const METRIC_INVALIDATE: &str = "aula_cache_invalidate_total";
const METRIC_INVALIDATE_FAILED: &str = "aula_cache_invalidate_failed_total";

/// A committed change to one canonical record.
///
/// `owners` and `members` are the account ids whose per-user derived views
/// could include this record; both sets are ordered so the enumerated key
/// list is deterministic.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub kind: EntityKind,
    pub id: Uuid,
    pub owners: BTreeSet<Uuid>,
    pub members: BTreeSet<Uuid>,
}

impl Mutation {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self {
            kind,
            id,
            owners: BTreeSet::new(),
            members: BTreeSet::new(),
        }
    }

    pub fn course(id: Uuid) -> Self {
        Self::new(EntityKind::Course, id)
    }

    pub fn user(id: Uuid) -> Self {
        Self::new(EntityKind::User, id)
    }

    pub fn with_owner(mut self, owner: Uuid) -> Self {
        self.owners.insert(owner);
        self
    }

    pub fn with_owners(mut self, owners: impl IntoIterator<Item = Uuid>) -> Self {
        self.owners.extend(owners);
        self
    }

    pub fn with_members(mut self, members: impl IntoIterator<Item = Uuid>) -> Self {
        self.members.extend(members);
        self
    }

    /// Enumerate every cache key this mutation makes stale: the direct
    /// entity key, the global listing where the kind has one, and one
    /// per-user listing for each distinct owner or member.
    pub fn affected_keys(&self) -> Vec<CacheKey> {
        let mut keys = vec![CacheKey::Entity {
            kind: self.kind,
            id: self.id,
        }];
        if self.kind.has_global_listing() {
            keys.push(CacheKey::GlobalListing { kind: self.kind });
        }
        keys.extend(
            self.owners
                .union(&self.members)
                .map(|user_id| CacheKey::user_listing(*user_id)),
        );
        keys
    }
}

/// Degraded-success record for one invalidation pass.
///
/// The canonical mutation is never rolled back on cache failure; callers
/// inspect `failed` to decide on follow-up. A failed key stays stale until
/// a later invalidation succeeds (or, where the key carries a TTL, it
/// expires).
#[derive(Debug, Default)]
pub struct CacheSync {
    pub purged: Vec<CacheKey>,
    pub failed: Vec<CacheKey>,
    pub refreshed_global: bool,
}

impl CacheSync {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fold another pass into this one. Used by write paths that touch
    /// more than one canonical record.
    pub fn merge(mut self, other: CacheSync) -> Self {
        self.purged.extend(other.purged);
        self.failed.extend(other.failed);
        self.refreshed_global |= other.refreshed_global;
        self
    }
}

impl fmt::Display for CacheSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheSync {{ purged: {}, failed: {}, refreshed_global: {} }}",
            self.purged.len(),
            self.failed.len(),
            self.refreshed_global,
        )
    }
}

pub struct InvalidationCoordinator {
    store: Arc<dyn KeyValueStore>,
}

impl InvalidationCoordinator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Purge every key affected by `mutation`.
    ///
    /// Must be called only after the canonical mutation has been durably
    /// applied, and synchronously with it — never deferred or batched — so
    /// the staleness window stays bounded by this single step.
    pub async fn on_mutation(&self, mutation: &Mutation) -> CacheSync {
        let mut sync = CacheSync::default();

        for key in mutation.affected_keys() {
            match self.store.delete(&key.to_string()).await {
                Ok(()) => {
                    counter!(METRIC_INVALIDATE).increment(1);
                    sync.purged.push(key);
                }
                Err(err) => {
                    warn!(
                        key = %key,
                        error = %err,
                        "Cache purge failed; entry stays stale until TTL or retry"
                    );
                    counter!(METRIC_INVALIDATE_FAILED).increment(1);
                    sync.failed.push(key);
                }
            }
        }

        debug!(
            entity_kind = %mutation.kind,
            entity_id = %mutation.id,
            outcome = %sync,
            "Invalidation pass complete"
        );
        sync
    }

    /// Purge plus an in-line rebuild of the global listing.
    ///
    /// The listing loader runs after the deletes, against the already-mutated
    /// canonical state. A loader or write failure leaves the listing key
    /// cold, not stale: the delete already happened, so the next reader
    /// repopulates it.
    pub async fn on_mutation_with_refresh<T, L, Fut>(
        &self,
        mutation: &Mutation,
        listing_loader: L,
    ) -> CacheSync
    where
        T: Serialize,
        L: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RepoError>>,
    {
        let mut sync = self.on_mutation(mutation).await;

        if !mutation.kind.has_global_listing() {
            return sync;
        }

        let listing_key = CacheKey::GlobalListing {
            kind: mutation.kind,
        };
        if sync.failed.contains(&listing_key) {
            // The stale entry is still in the store; rewriting on top of a
            // failed delete could race another writer's view of it.
            return sync;
        }

        let listing = match listing_loader().await {
            Ok(listing) => listing,
            Err(err) => {
                warn!(
                    key = %listing_key,
                    error = %err,
                    "Global listing rebuild failed; key left cold"
                );
                return sync;
            }
        };

        let bytes = match serde_json::to_vec(&listing) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(key = %listing_key, error = %err, "Global listing failed to encode");
                return sync;
            }
        };

        match self.store.set(&listing_key.to_string(), bytes, None).await {
            Ok(()) => sync.refreshed_global = true,
            Err(err) => {
                warn!(
                    key = %listing_key,
                    error = %err,
                    "Global listing refresh write failed; key left cold"
                );
            }
        }

        sync
    }
}

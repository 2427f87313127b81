//! Cache key definitions.
//!
//! Every cached view is addressed by a typed [`CacheKey`] that renders to a
//! stable wire name understood by the external key-value service. The wire
//! convention is fixed across implementations:
//!
//! - `{entity_kind}:{id}` for a single entity snapshot
//! - `listing:all:{entity_kind}` for the global collection
//! - `listing:user:{user_id}` for a per-user derived view

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seven-day backstop for entity snapshots and per-user listings.
pub const DEFAULT_ENTITY_TTL: Duration = Duration::from_secs(604_800);

/// Kinds of canonical entities with cached projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Course,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Course => "course",
            EntityKind::User => "user",
        }
    }

    /// Whether a global collection listing is cached for this kind.
    /// Users have no global listing; only per-user derived views.
    pub fn has_global_listing(&self) -> bool {
        matches!(self, EntityKind::Course)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addresses one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Full serialized snapshot of a single entity.
    Entity { kind: EntityKind, id: Uuid },
    /// The global collection listing for an entity kind.
    GlobalListing { kind: EntityKind },
    /// A per-user derived listing (e.g. enrolled courses).
    UserListing { user_id: Uuid },
}

impl CacheKey {
    pub fn course(id: Uuid) -> Self {
        Self::Entity {
            kind: EntityKind::Course,
            id,
        }
    }

    pub fn user_profile(id: Uuid) -> Self {
        Self::Entity {
            kind: EntityKind::User,
            id,
        }
    }

    pub fn course_catalog() -> Self {
        Self::GlobalListing {
            kind: EntityKind::Course,
        }
    }

    pub fn user_listing(user_id: Uuid) -> Self {
        Self::UserListing { user_id }
    }

    /// Expiry policy attached to the key shape.
    ///
    /// Entity snapshots and per-user listings carry a long TTL as a backstop
    /// against a missed invalidation. The global listing has none: it is
    /// eagerly rebuilt on every write, so expiry would only add cold reads.
    pub fn ttl(&self, policy: &TtlPolicy) -> Option<Duration> {
        match self {
            CacheKey::Entity { .. } => Some(policy.entity),
            CacheKey::UserListing { .. } => Some(policy.user_listing),
            CacheKey::GlobalListing { .. } => None,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Entity { kind, id } => write!(f, "{kind}:{id}"),
            CacheKey::GlobalListing { kind } => write!(f, "listing:all:{kind}"),
            CacheKey::UserListing { user_id } => write!(f, "listing:user:{user_id}"),
        }
    }
}

/// TTLs per key shape, resolved from configuration.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    pub entity: Duration,
    pub user_listing: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            entity: DEFAULT_ENTITY_TTL,
            user_listing: DEFAULT_ENTITY_TTL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_stable() {
        let id = Uuid::nil();
        assert_eq!(CacheKey::course(id).to_string(), format!("course:{id}"));
        assert_eq!(CacheKey::user_profile(id).to_string(), format!("user:{id}"));
        assert_eq!(CacheKey::course_catalog().to_string(), "listing:all:course");
        assert_eq!(
            CacheKey::user_listing(id).to_string(),
            format!("listing:user:{id}")
        );
    }

    #[test]
    fn entity_keys_carry_ttl() {
        let policy = TtlPolicy::default();
        let key = CacheKey::course(Uuid::new_v4());
        assert_eq!(key.ttl(&policy), Some(DEFAULT_ENTITY_TTL));
    }

    #[test]
    fn user_listing_keys_carry_the_backstop_ttl() {
        let policy = TtlPolicy::default();
        let key = CacheKey::user_listing(Uuid::new_v4());
        assert_eq!(key.ttl(&policy), Some(DEFAULT_ENTITY_TTL));
    }

    #[test]
    fn global_listing_has_no_ttl() {
        let policy = TtlPolicy::default();
        assert_eq!(CacheKey::course_catalog().ttl(&policy), None);
    }

    #[test]
    fn key_equality() {
        let id = Uuid::new_v4();
        assert_eq!(CacheKey::course(id), CacheKey::course(id));
        assert_ne!(CacheKey::course(id), CacheKey::user_profile(id));
    }
}

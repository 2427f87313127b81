//! Operator session registry.
//!
//! Maps a stable operator identity to at most one live transport session.
//! The registry is an injected component with explicit lifecycle: it is
//! constructed once and handed to every connection handler, so tests can run
//! isolated instances.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "realtime::registry";

/// Identifies one live transport session, unique per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// operator identity → live session, at most one per operator.
///
/// Registration is last-writer-wins: an operator opening a new tab silently
/// supersedes the old session. Unregistration only removes a binding whose
/// session id still matches, so a disconnect arriving after supersession is
/// a no-op rather than an error.
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<Uuid, SessionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `operator_id` to `session`, returning the superseded session if
    /// one was registered.
    pub fn register(&self, operator_id: Uuid, session: SessionId) -> Option<SessionId> {
        rw_write(&self.sessions, SOURCE, "register").insert(operator_id, session)
    }

    /// Remove the binding currently holding exactly `session`.
    ///
    /// Returns the operator that was unbound, or `None` when the session id
    /// no longer matches any registration (already superseded or unknown).
    pub fn unregister(&self, session: SessionId) -> Option<Uuid> {
        let mut sessions = rw_write(&self.sessions, SOURCE, "unregister");
        let operator = sessions
            .iter()
            .find_map(|(operator, bound)| (*bound == session).then_some(*operator))?;
        sessions.remove(&operator);
        Some(operator)
    }

    pub fn lookup(&self, operator_id: Uuid) -> Option<SessionId> {
        rw_read(&self.sessions, SOURCE, "lookup")
            .get(&operator_id)
            .copied()
    }

    /// Number of operators currently bound.
    pub fn registered_count(&self) -> usize {
        rw_read(&self.sessions, SOURCE, "registered_count").len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let operator = Uuid::new_v4();
        let session = SessionId::new();

        assert!(registry.lookup(operator).is_none());
        assert!(registry.register(operator, session).is_none());
        assert_eq!(registry.lookup(operator), Some(session));
    }

    #[test]
    fn register_supersedes_previous_session() {
        let registry = ConnectionRegistry::new();
        let operator = Uuid::new_v4();
        let first = SessionId::new();
        let second = SessionId::new();

        registry.register(operator, first);
        let superseded = registry.register(operator, second);

        assert_eq!(superseded, Some(first));
        assert_eq!(registry.lookup(operator), Some(second));
        assert_eq!(registry.registered_count(), 1);
    }

    #[test]
    fn stale_unregister_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        let operator = Uuid::new_v4();
        let first = SessionId::new();
        let second = SessionId::new();

        registry.register(operator, first);
        registry.register(operator, second);

        // The first transport's disconnect arrives late.
        assert!(registry.unregister(first).is_none());
        assert_eq!(registry.lookup(operator), Some(second));
    }

    #[test]
    fn matching_unregister_unbinds_operator() {
        let registry = ConnectionRegistry::new();
        let operator = Uuid::new_v4();
        let session = SessionId::new();

        registry.register(operator, session);
        assert_eq!(registry.unregister(session), Some(operator));
        assert!(registry.lookup(operator).is_none());
        assert_eq!(registry.registered_count(), 0);
    }

    #[test]
    fn unregister_unknown_session_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        assert!(registry.unregister(SessionId::new()).is_none());
    }
}

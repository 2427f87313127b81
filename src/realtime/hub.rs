//! Session hub: transport senders for every connected session.
//!
//! The hub tracks all live connections, registered or not — broadcast
//! delivery goes to every connected session, while the registry only tracks
//! operator bindings. Senders are unbounded channels drained by each
//! connection's writer task.

use std::collections::HashMap;
use std::sync::RwLock;

use metrics::gauge;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::util::lock::{rw_read, rw_write};

use super::registry::SessionId;

const SOURCE: &str = "realtime::hub";
const METRIC_SESSIONS: &str = "aula_realtime_sessions";

/// Payload pushed to a connected session's writer task.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundNotification {
    pub payload: Value,
}

pub type SessionSender = mpsc::UnboundedSender<OutboundNotification>;

pub struct SessionHub {
    senders: RwLock<HashMap<SessionId, SessionSender>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a newly connected session, returning the receiving half for
    /// its writer task.
    pub fn attach(&self, session: SessionId) -> mpsc::UnboundedReceiver<OutboundNotification> {
        let (tx, rx) = mpsc::unbounded_channel();
        let count = {
            let mut senders = rw_write(&self.senders, SOURCE, "attach");
            senders.insert(session, tx);
            senders.len()
        };
        gauge!(METRIC_SESSIONS).set(count as f64);
        rx
    }

    /// Detach a disconnected session. Idempotent.
    pub fn detach(&self, session: SessionId) {
        let count = {
            let mut senders = rw_write(&self.senders, SOURCE, "detach");
            senders.remove(&session);
            senders.len()
        };
        gauge!(METRIC_SESSIONS).set(count as f64);
    }

    /// Push a payload to one session. Returns false when the session is not
    /// connected or its writer task has already gone away.
    pub fn send(&self, session: SessionId, notification: OutboundNotification) -> bool {
        let senders = rw_read(&self.senders, SOURCE, "send");
        match senders.get(&session) {
            Some(sender) => sender.send(notification).is_ok(),
            None => {
                debug!(session = %session, "Send skipped: session not connected");
                false
            }
        }
    }

    /// Push a payload to every connected session; returns the number of
    /// sessions reached.
    pub fn broadcast(&self, notification: OutboundNotification) -> usize {
        let senders = rw_read(&self.senders, SOURCE, "broadcast");
        senders
            .values()
            .filter(|sender| sender.send(notification.clone()).is_ok())
            .count()
    }

    pub fn connected_count(&self) -> usize {
        rw_read(&self.senders, SOURCE, "connected_count").len()
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

//! Notification routing.
//!
//! Delivers an event to the one session bound to its target operator, or to
//! every connected session when untargeted. Delivery is at-most-once and
//! best-effort: there is no queue, no retry, and no persistence of events
//! that found nobody listening.

use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::hub::{OutboundNotification, SessionHub};
use super::registry::ConnectionRegistry;

const METRIC_DELIVERED: &str = "aula_notify_delivered_total";
const METRIC_DROPPED: &str = "aula_notify_dropped_total";

/// One notification, created by the write path and consumed exactly once.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    /// Operator to deliver to; `None` broadcasts to every connected session.
    pub target: Option<Uuid>,
    pub payload: Value,
}

impl NotificationEvent {
    pub fn targeted(operator_id: Uuid, payload: Value) -> Self {
        Self {
            target: Some(operator_id),
            payload,
        }
    }

    pub fn broadcast(payload: Value) -> Self {
        Self {
            target: None,
            payload,
        }
    }
}

/// How a `deliver` call resolved. A routing miss is an outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Reached this many sessions (1 for targeted, n for broadcast).
    Delivered(usize),
    /// Target operator not connected, or its session already gone.
    Dropped,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

pub struct NotificationRouter {
    registry: Arc<ConnectionRegistry>,
    hub: Arc<SessionHub>,
}

impl NotificationRouter {
    pub fn new(registry: Arc<ConnectionRegistry>, hub: Arc<SessionHub>) -> Self {
        Self { registry, hub }
    }

    pub fn deliver(&self, event: NotificationEvent) -> DeliveryOutcome {
        let outbound = OutboundNotification {
            payload: event.payload,
        };

        let outcome = match event.target {
            Some(operator_id) => match self.registry.lookup(operator_id) {
                Some(session) if self.hub.send(session, outbound) => DeliveryOutcome::Delivered(1),
                Some(session) => {
                    debug!(
                        operator_id = %operator_id,
                        session = %session,
                        "Notification dropped: session writer gone"
                    );
                    DeliveryOutcome::Dropped
                }
                None => {
                    debug!(operator_id = %operator_id, "Notification dropped: operator not connected");
                    DeliveryOutcome::Dropped
                }
            },
            None => DeliveryOutcome::Delivered(self.hub.broadcast(outbound)),
        };

        match outcome {
            DeliveryOutcome::Delivered(count) => {
                counter!(METRIC_DELIVERED).increment(count as u64);
            }
            DeliveryOutcome::Dropped => {
                counter!(METRIC_DROPPED).increment(1);
            }
        }
        outcome
    }
}

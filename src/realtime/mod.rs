//! Targeted real-time notification fan-out.
//!
//! Events are pushed to the specific operator session they name instead of
//! being broadcast; untargeted events fall back to broadcast. There is no
//! delivery queue and no replay — an event for an operator who is not
//! connected is dropped.
//!
//! - [`registry`]: operator identity → at-most-one live session
//! - [`hub`]: transport senders for all connected sessions
//! - [`router`]: targeted delivery with broadcast fallback
//! - [`socket`]: the WebSocket wire protocol and connection lifecycle

mod hub;
mod registry;
mod router;
mod socket;

pub use hub::{OutboundNotification, SessionHub};
pub use registry::{ConnectionRegistry, SessionId};
pub use router::{DeliveryOutcome, NotificationEvent, NotificationRouter};
pub use socket::{ClientMessage, RealtimeState, ServerMessage, routes, websocket_handler};

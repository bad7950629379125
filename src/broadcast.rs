//! Broadcast fan-out
//!
//! Delivers one text message to every member of a room. Each member's send
//! is attempted independently and never waits; a member whose send fails,
//! because its connection is gone or its queue is full, is evicted from the
//! registry and the rest of the room is unaffected.

use tracing::{debug, warn};

use crate::registry::Registry;
use crate::types::{ConnectionId, RoomName};

/// Result of one broadcast
///
/// Only used for logging and tests; the original sender never sees it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Members the message was handed to
    pub delivered: usize,
    /// Members whose send failed and who were removed from the room
    pub evicted: Vec<ConnectionId>,
}

/// Send `text` to every current member of `room`, including the sender
///
/// Members are taken from a snapshot so evictions cannot disturb the
/// iteration. Every member's copy is queued before this returns, so
/// consecutive broadcasts reach each member in call order.
pub fn broadcast(registry: &mut Registry, room: &RoomName, text: &str) -> Delivery {
    let recipients = registry.snapshot(room);
    let mut delivery = Delivery::default();

    if recipients.is_empty() {
        debug!("Broadcast to empty room '{}' dropped", room);
        return delivery;
    }

    for connection in &recipients {
        match connection.send(text.to_string()) {
            Ok(()) => delivery.delivered += 1,
            Err(e) => {
                warn!(
                    "Send to {} ({}) in '{}' failed: {}, evicting",
                    connection.id, connection.username, room, e
                );
                registry.leave(room, connection.id);
                delivery.evicted.push(connection.id);
            }
        }
    }

    delivery
}

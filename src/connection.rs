//! Connection handle definition
//!
//! A cheap, cloneable handle to one live client. The lifecycle driver owns the
//! socket; the registry only keeps a clone of this handle while joined.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::types::{ConnectionId, RoomName};

/// Handle to a joined client
///
/// Sending enqueues text on the client's outbound channel, which the
/// connection's write task drains into the socket. Sending never waits:
/// a client whose queue is full is treated like a closed one.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Display name (not unique, not validated)
    pub username: String,
    /// Room this connection belongs to
    pub room: RoomName,
    /// Server → Client text channel
    sender: mpsc::Sender<String>,
}

impl Connection {
    /// Create a new connection handle with a fresh ID
    pub fn new(username: String, room: RoomName, sender: mpsc::Sender<String>) -> Self {
        Self::with_id(ConnectionId::new(), username, room, sender)
    }

    /// Create a connection handle with a known ID
    pub fn with_id(
        id: ConnectionId,
        username: String,
        room: RoomName,
        sender: mpsc::Sender<String>,
    ) -> Self {
        Self {
            id,
            username,
            room,
            sender,
        }
    }

    /// Queue a text message for this client
    ///
    /// Fails if the write side is gone or the client has fallen a whole
    /// queue behind.
    pub fn send(&self, text: String) -> Result<(), SendError> {
        self.sender.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}

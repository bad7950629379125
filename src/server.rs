//! ChatServer Actor implementation
//!
//! The single owner of the room registry. Connection handlers talk to it
//! through mpsc commands, and commands are applied one at a time, so every
//! room sees a single sequence of joins, relays and leaves.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::broadcast::broadcast;
use crate::connection::Connection;
use crate::message::Notice;
use crate::registry::Registry;
use crate::types::{ConnectionId, RoomName};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Connection finished its handshake and enters its room
    Join { connection: Connection },
    /// Relay a chat line from a member to its room
    Relay {
        connection_id: ConnectionId,
        room: RoomName,
        username: String,
        text: String,
    },
    /// Connection ended; remove it and announce the departure
    Leave {
        connection_id: ConnectionId,
        room: RoomName,
        username: String,
    },
    /// Query a room's member usernames in join order
    Members {
        room: RoomName,
        reply: oneshot::Sender<Vec<String>>,
    },
}

/// The main ChatServer actor
pub struct ChatServer {
    registry: Registry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            registry: Registry::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Join { connection } => {
                self.handle_join(connection);
            }
            ServerCommand::Relay {
                connection_id,
                room,
                username,
                text,
            } => {
                self.handle_relay(connection_id, room, username, text);
            }
            ServerCommand::Leave {
                connection_id,
                room,
                username,
            } => {
                self.handle_leave(connection_id, room, username);
            }
            ServerCommand::Members { room, reply } => {
                let _ = reply.send(self.registry.members(&room));
            }
        }
    }

    /// Register a connection, then announce it and the updated roster
    fn handle_join(&mut self, connection: Connection) {
        let room = connection.room.clone();
        let username = connection.username.clone();

        info!("{} ({}) joined room '{}'", username, connection.id, room);
        self.registry.join(&room, connection);

        let joined = Notice::Joined {
            room: room.clone(),
            username,
        };
        self.announce(&room, joined);

        // Read after the join notice: evictions it caused are reflected
        let roster = Notice::Roster {
            room: room.clone(),
            users: self.registry.members(&room),
        };
        self.announce(&room, roster);

        self.log_totals();
    }

    /// Relay a chat line to every member, sender included
    ///
    /// Lines from a connection that is no longer in the room (evicted while
    /// its handler is still winding down) are dropped.
    fn handle_relay(
        &mut self,
        connection_id: ConnectionId,
        room: RoomName,
        username: String,
        text: String,
    ) {
        if self.registry.room_of(connection_id) != Some(&room) {
            debug!(
                "Dropping line from {} ({}): not a member of '{}'",
                username, connection_id, room
            );
            return;
        }

        let line = Notice::Chat {
            room: room.clone(),
            username,
            text,
        };
        self.announce(&room, line);
    }

    /// Remove a connection and tell the rest of the room
    ///
    /// The connection may already be gone if a broadcast evicted it.
    fn handle_leave(&mut self, connection_id: ConnectionId, room: RoomName, username: String) {
        let removed = self.registry.leave(&room, connection_id);
        info!(
            "{} ({}) left room '{}'{}",
            username,
            connection_id,
            room,
            if removed { "" } else { " (already evicted)" }
        );

        let left = Notice::Left {
            room: room.clone(),
            username,
        };
        self.announce(&room, left);

        self.log_totals();
    }

    fn announce(&mut self, room: &RoomName, notice: Notice) {
        let delivery = broadcast(&mut self.registry, room, &notice.to_string());
        if !delivery.evicted.is_empty() {
            debug!(
                "Evicted {} member(s) from '{}'",
                delivery.evicted.len(),
                room
            );
        }
    }

    fn log_totals(&self) {
        debug!(
            "Total connections: {}, Total rooms: {}",
            self.registry.connection_count(),
            self.registry.room_count()
        );
    }
}

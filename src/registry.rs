//! Room registry
//!
//! In-memory mapping from room name to its members. No I/O happens here;
//! the owning task (see [`crate::server::ChatServer`]) serializes access.
//!
//! Invariants:
//! - a room entry exists if and only if it has at least one member
//! - a connection is a member of at most one room

use std::collections::HashMap;

use tracing::debug;

use crate::connection::Connection;
use crate::room::Room;
use crate::types::{ConnectionId, RoomName};

/// Registry of live rooms
#[derive(Debug, Default)]
pub struct Registry {
    /// All non-empty rooms: RoomName -> Room
    rooms: HashMap<RoomName, Room>,
    /// Connection to room mapping for fast lookup: ConnectionId -> RoomName
    locations: HashMap<ConnectionId, RoomName>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room, creating the room if absent
    ///
    /// A connection already joined elsewhere is moved out of its old room first.
    pub fn join(&mut self, room: &RoomName, connection: Connection) {
        let id = connection.id;

        if let Some(previous) = self.locations.get(&id).cloned() {
            if &previous != room {
                self.leave(&previous, id);
            }
        }

        let entry = self.rooms.entry(room.clone()).or_insert_with(|| {
            debug!("Room '{}' created", room);
            Room::new(room.clone())
        });
        entry.add_member(connection);
        self.locations.insert(id, room.clone());
    }

    /// Remove a connection from a room
    ///
    /// Removing a connection that is not a member is a no-op. The room entry
    /// is deleted once its last member leaves. Returns true if a member was
    /// actually removed.
    pub fn leave(&mut self, room: &RoomName, id: ConnectionId) -> bool {
        let Some(entry) = self.rooms.get_mut(room) else {
            return false;
        };

        if !entry.remove_member(id) {
            return false;
        }

        self.locations.remove(&id);

        if entry.is_empty() {
            self.rooms.remove(room);
            debug!("Room '{}' deleted (empty)", room);
        }

        true
    }

    /// Usernames of a room's members in join order
    ///
    /// Unknown rooms yield an empty list.
    pub fn members(&self, room: &RoomName) -> Vec<String> {
        self.rooms
            .get(room)
            .map(Room::usernames)
            .unwrap_or_default()
    }

    /// Copy of a room's member handles for iteration
    pub fn snapshot(&self, room: &RoomName) -> Vec<Connection> {
        self.rooms
            .get(room)
            .map(Room::snapshot)
            .unwrap_or_default()
    }

    /// Room a connection currently belongs to, if any
    pub fn room_of(&self, id: ConnectionId) -> Option<&RoomName> {
        self.locations.get(&id)
    }

    pub fn contains_room(&self, room: &RoomName) -> bool {
        self.rooms.contains_key(room)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Total number of joined connections across all rooms
    pub fn connection_count(&self) -> usize {
        self.locations.len()
    }
}

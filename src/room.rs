//! Room struct definition
//!
//! Represents a named chat room holding its members in join order.

use crate::connection::Connection;
use crate::types::{ConnectionId, RoomName};

/// Chat room
///
/// Members are kept in join order. There is no capacity limit and
/// duplicate usernames are allowed; membership is keyed by connection ID.
#[derive(Debug)]
pub struct Room {
    /// Room name for identification
    pub name: RoomName,
    /// Current members, oldest first
    members: Vec<Connection>,
}

impl Room {
    /// Create a new, empty room
    pub fn new(name: RoomName) -> Self {
        Self {
            name,
            members: Vec::new(),
        }
    }

    /// Add a member at the end of the join order
    ///
    /// A connection already present is left where it is.
    pub fn add_member(&mut self, connection: Connection) {
        if !self.contains(connection.id) {
            self.members.push(connection);
        }
    }

    /// Remove a member
    ///
    /// Returns true if the connection was a member.
    pub fn remove_member(&mut self, id: ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        self.members.len() != before
    }

    /// Check if a connection is in this room
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    /// Usernames of all members in join order
    pub fn usernames(&self) -> Vec<String> {
        self.members.iter().map(|m| m.username.clone()).collect()
    }

    /// Copy of the member list, safe to iterate while the room changes
    pub fn snapshot(&self) -> Vec<Connection> {
        self.members.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Get the number of members in the room
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn member(name: &str) -> Connection {
        let (tx, _rx) = mpsc::channel(1);
        Connection::new(name.to_string(), RoomName::from("R"), tx)
    }

    #[test]
    fn test_room_creation() {
        let room = Room::new(RoomName::from("R"));

        assert_eq!(room.name, RoomName::from("R"));
        assert!(room.is_empty());
        assert_eq!(room.member_count(), 0);
        assert!(room.usernames().is_empty());
    }

    #[test]
    fn test_members_keep_join_order() {
        let mut room = Room::new(RoomName::from("R"));
        room.add_member(member("Zed"));
        room.add_member(member("Amy"));
        room.add_member(member("Zed"));

        assert_eq!(room.usernames(), vec!["Zed", "Amy", "Zed"]);
        assert_eq!(room.member_count(), 3);
    }

    #[test]
    fn test_same_connection_added_once() {
        let mut room = Room::new(RoomName::from("R"));
        let alice = member("Alice");
        room.add_member(alice.clone());
        room.add_member(alice);

        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn test_remove_member() {
        let mut room = Room::new(RoomName::from("R"));
        let alice = member("Alice");
        let bob = member("Bob");
        room.add_member(alice.clone());
        room.add_member(bob.clone());

        assert!(room.remove_member(alice.id));
        assert!(!room.contains(alice.id));
        assert!(room.contains(bob.id));
        assert_eq!(room.usernames(), vec!["Bob"]);

        // Second removal is a no-op
        assert!(!room.remove_member(alice.id));
        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut room = Room::new(RoomName::from("R"));
        let alice = member("Alice");
        room.add_member(alice.clone());

        let snapshot = room.snapshot();
        room.remove_member(alice.id);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, alice.id);
        assert!(room.is_empty());
    }
}

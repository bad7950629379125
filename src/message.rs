//! Message framing
//!
//! Everything sent to clients is plain text. The exact formats below are
//! what existing clients display, so they must not drift.

use std::fmt;

use crate::types::RoomName;

/// Roster placeholder when a room has nobody in it at read time
pub const NO_USERS: &str = "No users";

/// Server → Client text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Relayed chat line: `[{room}] {username}: {text}`
    Chat {
        room: RoomName,
        username: String,
        text: String,
    },
    /// `{username} joined {room}.`
    Joined { room: RoomName, username: String },
    /// `{username} left the {room}.`
    Left { room: RoomName, username: String },
    /// `Users in {room}: {a, b, c}.` sent right after a join
    Roster { room: RoomName, users: Vec<String> },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Chat {
                room,
                username,
                text,
            } => write!(f, "[{}] {}: {}", room, username, text),
            Notice::Joined { room, username } => write!(f, "{} joined {}.", username, room),
            Notice::Left { room, username } => write!(f, "{} left the {}.", username, room),
            Notice::Roster { room, users } if users.is_empty() => {
                write!(f, "Users in {}: {}.", room, NO_USERS)
            }
            Notice::Roster { room, users } => {
                write!(f, "Users in {}: {}.", room, users.join(", "))
            }
        }
    }
}

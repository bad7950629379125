//! Per-connection lifecycle
//!
//! `Connecting → Joined → Active → Leaving → Terminated`. Leaving can be
//! entered from Joined or Active, and only once; Terminated is final.

use std::fmt;

use tracing::debug;

use crate::types::{ConnectionId, RoomName};

/// Lifecycle state of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake in progress, not yet registered
    Connecting,
    /// Registered with its room, join notices sent
    Joined,
    /// Relaying inbound messages
    Active,
    /// Removed from its room, departure being announced
    Leaving,
    /// Done; no further transitions
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Joined => "joined",
            SessionState::Active => "active",
            SessionState::Leaving => "leaving",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Lifecycle tracker for one connection
///
/// Each transition method returns whether the transition happened. The
/// driver uses [`Session::begin_leaving`] as the single gate for sending
/// the leave command.
#[derive(Debug)]
pub struct Session {
    pub id: ConnectionId,
    pub username: String,
    pub room: RoomName,
    state: SessionState,
}

impl Session {
    pub fn new(id: ConnectionId, username: String, room: RoomName) -> Self {
        Self {
            id,
            username,
            room,
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connecting → Joined
    pub fn mark_joined(&mut self) -> bool {
        self.transition(SessionState::Connecting, SessionState::Joined)
    }

    /// Joined → Active
    pub fn mark_active(&mut self) -> bool {
        self.transition(SessionState::Joined, SessionState::Active)
    }

    /// Joined | Active → Leaving
    ///
    /// Returns true only the first time, so the departure is handled once.
    pub fn begin_leaving(&mut self) -> bool {
        match self.state {
            SessionState::Joined | SessionState::Active => {
                self.set(SessionState::Leaving);
                true
            }
            _ => false,
        }
    }

    /// Any → Terminated
    ///
    /// Returns false if already terminated.
    pub fn terminate(&mut self) -> bool {
        if self.is_terminated() {
            return false;
        }
        self.set(SessionState::Terminated);
        true
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    fn transition(&mut self, from: SessionState, to: SessionState) -> bool {
        if self.state != from {
            return false;
        }
        self.set(to);
        true
    }

    fn set(&mut self, to: SessionState) {
        debug!("Connection {} {} -> {}", self.id, self.state, to);
        self.state = to;
    }
}

//! Handshake path parsing
//!
//! Clients connect to `/ws/{username}/{room}`. Both segments are
//! percent-decoded and otherwise taken verbatim.

use crate::types::RoomName;

/// Path prefix for relay connections
pub const WS_PREFIX: &str = "/ws/";

/// Parameters carried by the connection path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinParams {
    pub username: String,
    pub room: RoomName,
}

/// Parse `/ws/{username}/{room}`
///
/// Returns None for any other shape, or when a segment is not valid
/// percent-encoded UTF-8. Empty segments are allowed.
pub fn parse_path(path: &str) -> Option<JoinParams> {
    let rest = path.strip_prefix(WS_PREFIX)?;
    let (username, room) = rest.split_once('/')?;

    if room.contains('/') {
        return None;
    }

    let username = urlencoding::decode(username).ok()?.into_owned();
    let room = urlencoding::decode(room).ok()?.into_owned();

    Some(JoinParams {
        username,
        room: RoomName(room),
    })
}

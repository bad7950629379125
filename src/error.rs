//! Error types for the relay
//!
//! Connection-level errors and outbound send errors, defined with thiserror.
//! None of the room operations fail; these only cover the transport edges.

use thiserror::Error;

/// Connection handler errors
///
/// Returned from a connection's handler and logged; never fatal to the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol or handshake error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (the ChatServer actor is gone)
    #[error("Channel send error")]
    ChannelSend,
}

/// Message send errors
///
/// Occurs when a connection's outbound channel is closed or full.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The client is not draining its queue
    #[error("Channel full")]
    Full,
}

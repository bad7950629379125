//! Multi-room WebSocket Text Relay Library
//!
//! Clients connect to `/ws/{username}/{room}` and every text message one of
//! them sends is relayed to everyone currently in that room.
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` owns the room `Registry` and applies commands one at a time
//! - `broadcast` fans a message out to a snapshot of the room, evicting
//!   members whose send fails
//! - Each connection has a `handler` task with separate read and write tasks
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use room_relay::{serve, ChatServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx).run());
//!     serve(listener, cmd_tx).await;
//! }
//! ```

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod room;
pub mod route;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use broadcast::{broadcast, Delivery};
pub use connection::Connection;
pub use error::{AppError, SendError};
pub use handler::{handle_connection, serve, Inbound};
pub use message::Notice;
pub use registry::Registry;
pub use room::Room;
pub use route::{parse_path, JoinParams};
pub use server::{ChatServer, ServerCommand};
pub use session::{Session, SessionState};
pub use types::{ConnectionId, RoomName};

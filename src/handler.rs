//! WebSocket connection handler
//!
//! Drives one client through its lifecycle: handshake and path parsing,
//! join, relaying inbound text, and the single leave at the end.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

use crate::connection::Connection;
use crate::error::AppError;
use crate::route::{parse_path, JoinParams};
use crate::server::ServerCommand;
use crate::session::Session;
use crate::types::{ConnectionId, RoomName};

/// Capacity of each connection's outbound text channel
///
/// A client this many messages behind is evicted from its room.
pub const OUTBOUND_BUFFER_SIZE: usize = 128;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// One step of the inbound side of a connection
#[derive(Debug)]
pub enum Inbound {
    /// Chat text to relay
    Text(String),
    /// Control or binary frame, nothing to relay
    Ignored,
    /// Close frame or end of stream
    Closed,
    /// Transport error
    Failed(WsError),
}

impl Inbound {
    /// Classify the next item read from the socket
    pub fn from_frame(frame: Option<Result<Message, WsError>>) -> Self {
        match frame {
            Some(Ok(Message::Text(text))) => Inbound::Text(text.to_string()),
            Some(Ok(Message::Close(_))) | None => Inbound::Closed,
            Some(Ok(_)) => Inbound::Ignored,
            Some(Err(e)) => Inbound::Failed(e),
        }
    }
}

/// Accept connections forever, one handler task per client
pub async fn serve(listener: TcpListener, cmd_tx: mpsc::Sender<ServerCommand>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!("New TCP connection from {}", addr);
                let cmd_tx = cmd_tx.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake on `/ws/{username}/{room}`, joins the
/// room, relays inbound text until either direction fails, then leaves.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    // WebSocket handshake, capturing the path parameters
    let mut params = None;
    let ws_stream = tokio_tungstenite::accept_hdr_async(
        stream,
        |request: &Request, response: Response| match parse_path(request.uri().path()) {
            Some(p) => {
                params = Some(p);
                Ok(response)
            }
            None => Err(not_found(request.uri().path())),
        },
    )
    .await?;

    let Some(JoinParams { username, room }) = params else {
        return Ok(());
    };

    let connection_id = ConnectionId::new();
    let mut session = Session::new(connection_id, username.clone(), room.clone());
    info!(
        "Connection {} from {} as '{}' in '{}'",
        connection_id, peer_addr, username, room
    );

    let (ws_sender, ws_receiver) = ws_stream.split();

    // Create channel for server -> client messages
    let (msg_tx, msg_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER_SIZE);
    let connection = Connection::with_id(connection_id, username.clone(), room.clone(), msg_tx);

    // Start draining before joining so the join notices have somewhere to go
    let mut write_task = tokio::spawn(write_loop(ws_sender, msg_rx, connection_id));

    if cmd_tx.send(ServerCommand::Join { connection }).await.is_err() {
        error!("Failed to join {} - server closed", connection_id);
        session.terminate();
        write_task.abort();
        return Err(AppError::ChannelSend);
    }
    session.mark_joined();

    let mut read_task = tokio::spawn(read_loop(
        ws_receiver,
        cmd_tx.clone(),
        connection_id,
        username.clone(),
        room.clone(),
    ));
    session.mark_active();

    // Wait for either direction to end
    tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", connection_id);
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", connection_id);
            read_task.abort();
        }
    }

    // The write task finishes by itself once the server drops our handle,
    // which also happens when a broadcast evicts this connection
    if session.begin_leaving() {
        let _ = cmd_tx
            .send(ServerCommand::Leave {
                connection_id,
                room,
                username,
            })
            .await;
    }
    session.terminate();

    info!("Connection {} disconnected", connection_id);

    Ok(())
}

/// WebSocket -> ServerCommand
async fn read_loop(
    mut ws_receiver: WsSource,
    cmd_tx: mpsc::Sender<ServerCommand>,
    connection_id: ConnectionId,
    username: String,
    room: RoomName,
) {
    loop {
        match Inbound::from_frame(ws_receiver.next().await) {
            Inbound::Text(text) => {
                let cmd = ServerCommand::Relay {
                    connection_id,
                    room: room.clone(),
                    username: username.clone(),
                    text,
                };
                if cmd_tx.send(cmd).await.is_err() {
                    debug!("Server closed, ending read task for {}", connection_id);
                    break;
                }
            }
            Inbound::Ignored => {}
            Inbound::Closed => {
                debug!("Connection {} closed by peer", connection_id);
                break;
            }
            Inbound::Failed(e) => {
                warn!("WebSocket error for {}: {}", connection_id, e);
                break;
            }
        }
    }
}

/// Outbound text -> WebSocket
async fn write_loop(
    mut ws_sender: WsSink,
    mut msg_rx: mpsc::Receiver<String>,
    connection_id: ConnectionId,
) {
    while let Some(text) = msg_rx.recv().await {
        if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
            debug!("WebSocket send to {} failed: {}", connection_id, e);
            break;
        }
    }
    debug!("Write task ended for {}", connection_id);

    // Send close frame when done
    let _ = ws_sender.close().await;
}

fn not_found(path: &str) -> ErrorResponse {
    debug!("Rejecting handshake for path {}", path);
    let mut response = ErrorResponse::new(Some(format!("No route for {}", path)));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

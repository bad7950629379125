//! End-to-end tests against a running relay on an ephemeral port.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use room_relay::{serve, ChatServer, RoomName, ServerCommand};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

struct TestServer {
    addr: SocketAddr,
    cmd_tx: mpsc::Sender<ServerCommand>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (cmd_tx, cmd_rx) = mpsc::channel(256);

        tokio::spawn(ChatServer::new(cmd_rx).run());
        tokio::spawn(serve(listener, cmd_tx.clone()));

        Self { addr, cmd_tx }
    }

    async fn connect(&self, username: &str, room: &str) -> Client {
        let url = format!("ws://{}/ws/{}/{}", self.addr, username, room);
        let (ws, _) = connect_async(url).await.unwrap();
        ws
    }

    async fn members(&self, room: &str) -> Vec<String> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(ServerCommand::Members {
                room: RoomName::from(room),
                reply,
            })
            .await
            .unwrap();
        rx.await.unwrap()
    }
}

async fn recv_text(ws: &mut Client) -> String {
    loop {
        let msg = timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return text.to_string();
        }
    }
}

async fn send_text(ws: &mut Client, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}

#[tokio::test]
async fn test_join_announces_and_lists_roster() {
    let server = TestServer::start().await;
    let mut u1 = server.connect("U1", "R").await;

    assert_eq!(recv_text(&mut u1).await, "U1 joined R.");
    assert_eq!(recv_text(&mut u1).await, "Users in R: U1.");
    assert_eq!(server.members("R").await, vec!["U1"]);
}

#[tokio::test]
async fn test_chat_reaches_room_including_sender() {
    let server = TestServer::start().await;
    let mut u1 = server.connect("U1", "R").await;
    recv_text(&mut u1).await;
    recv_text(&mut u1).await;

    let mut u2 = server.connect("U2", "R").await;
    assert_eq!(recv_text(&mut u2).await, "U2 joined R.");
    assert_eq!(recv_text(&mut u2).await, "Users in R: U1, U2.");
    assert_eq!(recv_text(&mut u1).await, "U2 joined R.");
    assert_eq!(recv_text(&mut u1).await, "Users in R: U1, U2.");

    send_text(&mut u1, "hi").await;

    assert_eq!(recv_text(&mut u2).await, "[R] U1: hi");
    assert_eq!(recv_text(&mut u1).await, "[R] U1: hi");
}

#[tokio::test]
async fn test_leave_notifies_remaining_member() {
    let server = TestServer::start().await;
    let mut u1 = server.connect("U1", "R").await;
    recv_text(&mut u1).await;
    recv_text(&mut u1).await;

    let mut u2 = server.connect("U2", "R").await;
    recv_text(&mut u2).await;
    recv_text(&mut u2).await;

    u1.close(None).await.unwrap();

    assert_eq!(recv_text(&mut u2).await, "U1 left the R.");
    assert_eq!(server.members("R").await, vec!["U2"]);
}

#[tokio::test]
async fn test_room_resets_after_last_leave() {
    let server = TestServer::start().await;
    let mut u1 = server.connect("U1", "R").await;
    recv_text(&mut u1).await;
    recv_text(&mut u1).await;

    u1.close(None).await.unwrap();

    let mut emptied = false;
    for _ in 0..50 {
        if server.members("R").await.is_empty() {
            emptied = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(emptied, "room R still has members");

    let mut u3 = server.connect("U3", "R").await;
    assert_eq!(recv_text(&mut u3).await, "U3 joined R.");
    assert_eq!(recv_text(&mut u3).await, "Users in R: U3.");
}

#[tokio::test]
async fn test_rooms_do_not_leak() {
    let server = TestServer::start().await;
    let mut a = server.connect("A", "one").await;
    recv_text(&mut a).await;
    recv_text(&mut a).await;

    let mut b = server.connect("B", "two").await;
    recv_text(&mut b).await;
    recv_text(&mut b).await;

    send_text(&mut b, "in two").await;
    send_text(&mut a, "in one").await;

    assert_eq!(recv_text(&mut a).await, "[one] A: in one");
    assert_eq!(recv_text(&mut b).await, "[two] B: in two");
}

#[tokio::test]
async fn test_percent_encoded_path() {
    let server = TestServer::start().await;
    let mut u = server.connect("Jane%20Doe", "Tea%20Room").await;

    assert_eq!(recv_text(&mut u).await, "Jane Doe joined Tea Room.");
    assert_eq!(recv_text(&mut u).await, "Users in Tea Room: Jane Doe.");
}

#[tokio::test]
async fn test_unknown_path_rejected() {
    let server = TestServer::start().await;
    let url = format!("ws://{}/chat", server.addr);

    assert!(connect_async(url).await.is_err());
}

#[tokio::test]
async fn test_dropped_socket_leaves_exactly_once() {
    let server = TestServer::start().await;
    let mut x = server.connect("X", "R").await;
    recv_text(&mut x).await;
    recv_text(&mut x).await;

    let mut u2 = server.connect("U2", "R").await;
    recv_text(&mut u2).await;
    recv_text(&mut u2).await;

    // No close handshake, just the TCP connection going away
    drop(x);

    let mut left_notices = 0;
    for i in 0..100 {
        let line = format!("m{i}");
        send_text(&mut u2, &line).await;
        let echo = format!("[R] U2: {line}");
        loop {
            let msg = recv_text(&mut u2).await;
            if msg == "X left the R." {
                left_notices += 1;
            }
            if msg == echo {
                break;
            }
        }
        if left_notices > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(left_notices, 1);

    // Keep talking; no second departure shows up
    for i in 0..5 {
        let line = format!("after{i}");
        send_text(&mut u2, &line).await;
        let echo = format!("[R] U2: {line}");
        loop {
            let msg = recv_text(&mut u2).await;
            if msg == "X left the R." {
                left_notices += 1;
            }
            if msg == echo {
                break;
            }
        }
    }
    assert_eq!(left_notices, 1);
    assert_eq!(server.members("R").await, vec!["U2"]);
}

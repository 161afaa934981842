//! End-to-end tests for the Trellis TCP server.
//!
//! Each test starts a real server on a random local port, speaks the line
//! protocol over a real socket, and asserts on raw wire lines -- greeting,
//! fragmented delivery, farewells, and the inactivity timeout included.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use trellis_core::config::TrellisConfig;
use trellis_server::engine::Engine;
use trellis_server::server;

// ---- Test server ----

struct TestServer {
    addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with_config(TrellisConfig::default()).await
    }

    async fn start_with_config(config: TrellisConfig) -> Self {
        let engine = Arc::new(Engine::new(config));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            server::serve(engine, listener).await;
        });
        TestServer { addr, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---- Test client ----

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    /// Connect and consume the server greeting, returning it.
    async fn connect(addr: SocketAddr) -> (Self, String) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, write) = stream.into_split();
        let mut client = TestClient {
            reader: BufReader::new(read),
            writer: write,
        };
        let greeting = client.recv().await;
        (client, greeting)
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    async fn recv(&mut self) -> String {
        match self.recv_opt().await {
            Some(line) => line,
            None => panic!("connection closed while expecting a line"),
        }
    }

    /// Next line, or `None` on clean EOF.
    async fn recv_opt(&mut self) -> Option<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.unwrap();
        if n == 0 {
            None
        } else {
            Some(line.trim_end_matches('\n').to_string())
        }
    }

    async fn roundtrip(&mut self, line: &str) -> String {
        self.send_raw(format!("{line}\n").as_bytes()).await;
        self.recv().await
    }
}

// ---- Session lifecycle ----

#[tokio::test]
async fn test_greeting_carries_session_id() {
    let server = TestServer::start().await;
    let (_client, greeting) = TestClient::connect(server.addr).await;
    assert!(greeting.starts_with("HI, I AM "));
    assert!(greeting.len() > "HI, I AM ".len());

    // A second connection gets its own session id.
    let (_client2, greeting2) = TestClient::connect(server.addr).await;
    assert_ne!(greeting, greeting2);
}

#[tokio::test]
async fn test_name_exchange() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(server.addr).await;
    assert_eq!(client.roundtrip("HI, I AM tester").await, "HI tester");
}

#[tokio::test]
async fn test_bye_farewell_closes_connection() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(server.addr).await;
    client.roundtrip("HI, I AM bob").await;

    let farewell = client.roundtrip("BYE MATE!").await;
    assert!(farewell.starts_with("BYE bob, WE SPOKE FOR "));
    assert!(farewell.ends_with(" MS"));
    assert_eq!(client.recv_opt().await, None);
}

#[tokio::test]
async fn test_bye_without_declared_name() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(server.addr).await;
    let farewell = client.roundtrip("BYE MATE!").await;
    assert!(farewell.starts_with("BYE , WE SPOKE FOR "));
}

#[tokio::test]
async fn test_idle_timeout_sends_exactly_one_farewell() {
    let mut config = TrellisConfig::default();
    config.session.idle_timeout_ms = 200;
    let server = TestServer::start_with_config(config).await;

    let connected_at = Instant::now();
    let (mut client, _) = TestClient::connect(server.addr).await;

    // Say nothing and wait for the server to give up on us.
    let farewell = client.recv().await;
    let elapsed = connected_at.elapsed();
    assert!(farewell.starts_with("BYE , WE SPOKE FOR "));
    assert!(
        elapsed >= Duration::from_millis(150),
        "farewell arrived too early: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_secs(5),
        "farewell arrived too late: {elapsed:?}"
    );

    // One farewell, then the connection is gone.
    assert_eq!(client.recv_opt().await, None);
}

#[tokio::test]
async fn test_activity_defers_the_timeout() {
    let mut config = TrellisConfig::default();
    config.session.idle_timeout_ms = 300;
    let server = TestServer::start_with_config(config).await;
    let (mut client, _) = TestClient::connect(server.addr).await;

    // Keep the session busy past several idle windows.
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(client.roundtrip("ADD NODE keepalive").await, "NODE ADDED");
        assert_eq!(client.roundtrip("REMOVE NODE keepalive").await, "NODE REMOVED");
    }
}

// ---- Framing ----

#[tokio::test]
async fn test_fragmented_command_reassembles() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(server.addr).await;

    client.send_raw(b"ADD NO").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.send_raw(b"DE X\n").await;
    assert_eq!(client.recv().await, "NODE ADDED");
}

#[tokio::test]
async fn test_multiple_commands_in_one_write() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(server.addr).await;

    client.send_raw(b"ADD NODE A\nADD NODE B\nADD EDGE A B 4\n").await;
    assert_eq!(client.recv().await, "NODE ADDED");
    assert_eq!(client.recv().await, "NODE ADDED");
    assert_eq!(client.recv().await, "EDGE ADDED");
}

// ---- Commands over the wire ----

#[tokio::test]
async fn test_full_graph_scenario() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(server.addr).await;

    for line in ["ADD NODE A", "ADD NODE B", "ADD NODE C"] {
        assert_eq!(client.roundtrip(line).await, "NODE ADDED");
    }
    for line in ["ADD EDGE A B 10", "ADD EDGE B C 5", "ADD EDGE A C 20"] {
        assert_eq!(client.roundtrip(line).await, "EDGE ADDED");
    }

    assert_eq!(client.roundtrip("SHORTEST PATH A C").await, "15");
    assert_eq!(client.roundtrip("CLOSER THAN 16 A").await, "B,C");

    assert_eq!(client.roundtrip("REMOVE EDGE A C").await, "EDGE REMOVED");
    assert_eq!(client.roundtrip("SHORTEST PATH A C").await, "15");
}

#[tokio::test]
async fn test_unrecognized_line_keeps_session_alive() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(server.addr).await;

    assert_eq!(
        client.roundtrip("MAKE ME A SANDWICH").await,
        "SORRY, I DID NOT UNDERSTAND THAT"
    );
    assert_eq!(
        client.roundtrip("HI, I AM bad name").await,
        "SORRY, I DID NOT UNDERSTAND THAT"
    );
    assert_eq!(client.roundtrip("ADD NODE A").await, "NODE ADDED");
}

#[tokio::test]
async fn test_error_responses_keep_session_alive() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(server.addr).await;

    assert_eq!(
        client.roundtrip("REMOVE NODE ghost").await,
        "ERROR: NODE NOT FOUND"
    );
    client.roundtrip("ADD NODE A").await;
    assert_eq!(
        client.roundtrip("ADD NODE A").await,
        "ERROR: NODE ALREADY EXISTS"
    );

    client.roundtrip("ADD NODE island").await;
    assert_eq!(
        client.roundtrip("SHORTEST PATH A island").await,
        "ERROR: UNREACHABLE"
    );

    assert_eq!(client.roundtrip("SHORTEST PATH A A").await, "0");
}

#[tokio::test]
async fn test_closer_than_empty_result_is_empty_line() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(server.addr).await;
    client.roundtrip("ADD NODE A").await;
    assert_eq!(client.roundtrip("CLOSER THAN 10 A").await, "");
}

// ---- Shared state ----

#[tokio::test]
async fn test_graph_is_shared_across_sessions() {
    let server = TestServer::start().await;

    let (mut alice, _) = TestClient::connect(server.addr).await;
    assert_eq!(alice.roundtrip("ADD NODE shared").await, "NODE ADDED");

    let (mut bob, _) = TestClient::connect(server.addr).await;
    assert_eq!(
        bob.roundtrip("ADD NODE shared").await,
        "ERROR: NODE ALREADY EXISTS"
    );
    assert_eq!(bob.roundtrip("REMOVE NODE shared").await, "NODE REMOVED");
    assert_eq!(
        alice.roundtrip("REMOVE NODE shared").await,
        "ERROR: NODE NOT FOUND"
    );
}

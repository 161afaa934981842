//! Per-connection session handling.
//!
//! Each accepted connection gets its own task running `run_session`:
//! greeting on activation, line reassembly from unaligned reads, command
//! dispatch, and an inactivity timeout that ends the session with an
//! unsolicited farewell. The timeout future is recreated around every
//! read, so exactly one timer is ever outstanding and any received bytes
//! reset it -- a new one is armed only after the buffered commands have
//! been answered.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder};
use uuid::Uuid;

use trellis_core::types::Millis;
use trellis_proto::command::{self, Command};
use trellis_proto::line::LineCodec;

use crate::engine::{CommandResponse, Engine};

/// Convert a `CommandResponse` to its wire line.
fn response_line(resp: CommandResponse) -> String {
    match resp {
        CommandResponse::NodeAdded => "NODE ADDED".to_string(),
        CommandResponse::NodeRemoved => "NODE REMOVED".to_string(),
        CommandResponse::EdgeAdded => "EDGE ADDED".to_string(),
        CommandResponse::EdgeRemoved => "EDGE REMOVED".to_string(),
        CommandResponse::Weight(weight) => weight.to_string(),
        CommandResponse::Unreachable => "ERROR: UNREACHABLE".to_string(),
        CommandResponse::Nodes(names) => command::node_list_line(names),
    }
}

/// Drive one connection from greeting to close.
pub async fn run_session(engine: Arc<Engine>, mut stream: TcpStream) {
    let session_id = Uuid::new_v4().to_string();
    let started = Instant::now();
    let mut client_name = String::new();

    let idle_window = Duration::from_millis(engine.config().session.idle_timeout_ms);
    let mut codec = LineCodec::with_max_line_bytes(engine.config().session.max_line_bytes);
    let mut buffer = BytesMut::with_capacity(1024);

    tracing::info!("Session {} created", session_id);

    if write_line(&mut stream, &mut codec, &command::greeting_line(&session_id))
        .await
        .is_err()
    {
        return;
    }

    'outer: loop {
        let received = match timeout(idle_window, stream.read_buf(&mut buffer)).await {
            // The idle window elapsed with no bytes at all: one farewell,
            // then the connection is force-closed.
            Err(_) => {
                let farewell = command::farewell_line(&client_name, elapsed_ms(started));
                let _ = write_line(&mut stream, &mut codec, &farewell).await;
                tracing::info!("Session {} expired after inactivity", session_id);
                break;
            }
            Ok(Ok(0)) => {
                tracing::debug!("Session {}: client disconnected", session_id);
                break;
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                tracing::debug!("Session {}: read failed: {}", session_id, e);
                break;
            }
        };
        tracing::trace!("Session {}: {} bytes received", session_id, received);

        loop {
            let decoded = match codec.decode(&mut buffer) {
                Ok(decoded) => decoded,
                Err(e) => {
                    tracing::warn!("Session {}: framing error: {}", session_id, e);
                    break 'outer;
                }
            };
            let line = match decoded {
                Some(line) => line,
                // Fragment (if any) stays buffered until more bytes arrive.
                None => break,
            };
            tracing::debug!("Session {}: received {:?}", session_id, line);

            match command::parse_line(&line) {
                Command::Greet { name } => {
                    client_name = name.to_string();
                    let reply = command::hi_line(&client_name);
                    if write_line(&mut stream, &mut codec, &reply).await.is_err() {
                        break 'outer;
                    }
                }
                Command::Bye => {
                    let farewell = command::farewell_line(&client_name, elapsed_ms(started));
                    let _ = write_line(&mut stream, &mut codec, &farewell).await;
                    tracing::info!("Session {} closed by client", session_id);
                    break 'outer;
                }
                Command::Unrecognized => {
                    if write_line(&mut stream, &mut codec, command::SORRY)
                        .await
                        .is_err()
                    {
                        break 'outer;
                    }
                }
                graph_command => {
                    let reply = match engine.execute(graph_command) {
                        Ok(resp) => response_line(resp),
                        Err(e) => command::error_line(&e),
                    };
                    if write_line(&mut stream, &mut codec, &reply).await.is_err() {
                        break 'outer;
                    }
                }
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> Millis {
    started.elapsed().as_millis() as Millis
}

async fn write_line(
    stream: &mut TcpStream,
    codec: &mut LineCodec,
    line: &str,
) -> std::io::Result<()> {
    let mut out = BytesMut::with_capacity(line.len() + 1);
    codec.encode(line, &mut out)?;
    stream.write_all(&out).await
}

//! TCP accept loop for the Trellis line protocol.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::engine::Engine;
use crate::session;

/// Bind `addr` and serve connections until the process is stopped.
pub async fn run_server(engine: Arc<Engine>, addr: &str) {
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind Trellis server on {}: {}", addr, e);
            return;
        }
    };
    serve(engine, listener).await;
}

/// Accept connections from an already-bound listener, handing each one to
/// its own session task.
pub async fn serve(engine: Arc<Engine>, listener: TcpListener) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let engine = engine.clone();
        tokio::spawn(async move {
            tracing::debug!("Connection from {}", peer);
            session::run_session(engine, stream).await;
            tracing::debug!("Connection closed from {}", peer);
        });
    }
}

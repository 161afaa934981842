use std::sync::Arc;

use trellis_core::config::TrellisConfig;
use trellis_server::engine::Engine;
use trellis_server::server;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1);
    let config = match TrellisConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let engine = Arc::new(Engine::new(config));

    tracing::info!("Trellis server listening on {}", addr);
    server::run_server(engine, &addr).await;
}

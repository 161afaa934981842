//! Configuration system for Trellis.

use serde::Deserialize;

use crate::error::TrellisError;

/// Top-level Trellis configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrellisConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl TrellisConfig {
    /// Load configuration from a TOML file, with environment variable
    /// overrides.
    ///
    /// Environment variables use the `TRELLIS_` prefix and `_` separators.
    /// E.g. `TRELLIS_SERVER_PORT=50001`.
    pub fn load(path: Option<&str>) -> Result<Self, TrellisError> {
        let mut config = if let Some(path) = path {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                TrellisError::InvalidConfig(format!("failed to read config file '{path}': {e}"))
            })?;
            toml::from_str::<TrellisConfig>(&contents).map_err(|e| {
                TrellisError::InvalidConfig(format!("failed to parse config: {e}"))
            })?
        } else {
            TrellisConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("TRELLIS_SERVER_PORT") {
            if let Ok(port) = v.parse() {
                self.server.port = port;
            }
        }
        if let Ok(v) = std::env::var("TRELLIS_SERVER_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Ok(v) = std::env::var("TRELLIS_SESSION_IDLE_TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                self.session.idle_timeout_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("TRELLIS_SESSION_MAX_LINE_BYTES") {
            if let Ok(n) = v.parse() {
                self.session.max_line_bytes = n;
            }
        }
    }

    pub fn validate(&self) -> Result<(), TrellisError> {
        if self.server.port == 0 {
            return Err(TrellisError::InvalidConfig(
                "server.port must be > 0".into(),
            ));
        }
        if self.session.idle_timeout_ms == 0 {
            return Err(TrellisError::InvalidConfig(
                "session.idle_timeout_ms must be > 0".into(),
            ));
        }
        if self.session.max_line_bytes == 0 {
            return Err(TrellisError::InvalidConfig(
                "session.max_line_bytes must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: 50_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a session may stay silent before the server says goodbye.
    pub idle_timeout_ms: u64,
    /// Upper bound on a single command line, terminator included.
    pub max_line_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 30_000,
            max_line_bytes: 64 * 1024,
        }
    }
}

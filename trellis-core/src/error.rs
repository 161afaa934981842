//! Error types for Trellis.

use crate::types::NodeName;

/// The primary error type used throughout the Trellis server.
#[derive(Debug, thiserror::Error)]
pub enum TrellisError {
    #[error("node '{0}' not found")]
    NodeNotFound(NodeName),

    #[error("node '{0}' already exists")]
    NodeAlreadyExists(NodeName),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for `Result<T, TrellisError>`.
pub type TrellisResult<T> = Result<T, TrellisError>;

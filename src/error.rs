//! Engine error types.

use thiserror::Error;

/// Errors surfaced by the fallible parts of the engine.
///
/// The graph computations themselves never fail: malformed filters yield an
/// empty graph, dangling links are dropped and missing path endpoints produce
/// an unfound [`crate::PathResult`]. Only configuration, export and worker
/// plumbing report errors.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Node referenced by an API call is not in the current graph.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Invalid configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Config file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Filesystem error while loading config.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error during export.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Background worker has shut down.
    #[error("analysis worker stopped")]
    WorkerStopped,
}

impl GraphError {
    /// Check if this error is recoverable (caller can retry or fall back).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GraphError::NodeNotFound(_) | GraphError::InvalidConfig(_))
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Serialization(err.to_string())
    }
}

impl From<std::fmt::Error> for GraphError {
    fn from(err: std::fmt::Error) -> Self {
        GraphError::Serialization(err.to_string())
    }
}

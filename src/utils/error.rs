//! Error types shared by the broker, the transport and the node client.
//!
//! Only `Io` failures of the listening socket are fatal to the master. Every
//! other variant is scoped to a single connection or a single send.

use thiserror::Error;

use crate::client::ConnectionId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The peer disconnected, or its outbound queue has been torn down.
    #[error("connection closed")]
    ConnectionClosed,

    /// A line that is not a valid frame: bad JSON, no `action`, or a missing field.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Writing to a connection failed or stalled past the write timeout.
    #[error("send to {connection} failed: {reason}")]
    SendFailure {
        connection: ConnectionId,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

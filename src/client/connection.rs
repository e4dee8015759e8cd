use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::utils::{Error, Result};

/// An encoded frame shared between every subscriber it is queued for.
pub type Outbound = Arc<[u8]>;

/// Identity of an accepted connection. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(format!("conn-{}", uuid::Uuid::new_v4()))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Send side of a connected node.
///
/// The queue is unbounded: a slow reader that is still connected never loses
/// frames. A peer that stops reading altogether is cut off by the writer's
/// write timeout, which closes the queue.
///
/// Cloning is cheap; the forwarder clones handles out of the registry so it
/// can send without holding the registry lock.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl Connection {
    pub fn new(sender: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            id: ConnectionId::new(),
            sender,
        }
    }

    /// Queues `frame` for the connection's writer without waiting.
    ///
    /// Fails with `ConnectionClosed` once the writer has exited.
    pub fn send(&self, frame: Outbound) -> Result<()> {
        self.sender
            .send(frame)
            .map_err(|_| Error::ConnectionClosed)
    }
}

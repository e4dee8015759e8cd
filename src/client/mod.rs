//! The `client` module defines how the broker sees one connected node.
//!
//! A `Connection` is the registry's handle onto a live socket: a stable
//! `ConnectionId` for set membership and an unbounded queue feeding that
//! socket's writer task.

pub mod connection;
pub use connection::{Connection, ConnectionId, Outbound};

#[cfg(test)]
mod tests;

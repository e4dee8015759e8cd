//! The `transport` module handles network communication with nodes.
//!
//! It defines the line-delimited JSON protocol, the framing that carries it
//! over TCP, and the connection supervisor that accepts sockets and turns
//! their frames into registry updates and forwards.

pub mod codec;
pub mod message;
pub mod tcp;

pub use codec::{FrameReader, write_frame};
pub use message::{Frame, Inbound};
pub use tcp::serve;

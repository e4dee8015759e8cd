//! The broker: topic registry and forwarder.
//!
//! Nothing here does socket I/O. Connection handlers in `transport` call into
//! the registry on registration frames and into `forward` on publish frames.

pub mod forwarder;
pub mod registry;
pub mod topic;

pub use forwarder::{Delivery, forward};
pub use registry::TopicRegistry;

#[cfg(test)]
mod tests;

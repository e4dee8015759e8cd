//! # KidOS
//!
//! `kidos` is a minimal publish/subscribe message broker. A central master
//! accepts TCP connections from nodes, lets each node register as publisher
//! or subscriber of named topics, and relays every published payload to the
//! topic's current subscribers. The protocol is newline-delimited JSON.
//!
//! ## Core Modules
//!
//! - `broker`: the topic registry and the forwarder.
//! - `client`: the broker-side handle for one connected node.
//! - `config`: loading and merging settings.
//! - `master`: binds the listener and runs the broker until shutdown.
//! - `node`: the client library nodes use to publish and subscribe.
//! - `transport`: wire frames, line framing and the connection supervisor.
//! - `utils`: error type and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod master;
pub mod node;
pub mod transport;
pub mod utils;

pub use master::Master;
pub use node::{Node, Publisher};
pub use utils::{Error, Result};

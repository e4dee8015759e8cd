//! Forwarding of published payloads.
//!
//! Delivery is best effort and at most once. A failed send is logged and
//! skipped; the failing connection stays registered until its own handler
//! notices the disconnect and unregisters it.

use serde_json::Value;
use tracing::debug;

use crate::broker::registry::TopicRegistry;
use crate::client::Outbound;
use crate::transport::message::Frame;
use crate::utils::Result;

/// Outcome of one forward call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Subscribers in the snapshot.
    pub attempted: usize,
    /// Subscribers whose queue accepted the frame.
    pub delivered: usize,
}

/// Sends a `forward_message` frame for `topic` to every current subscriber.
pub fn forward(registry: &TopicRegistry, topic: &str, data: Value) -> Result<Delivery> {
    let subscribers = registry.subscribers_of(topic);
    if subscribers.is_empty() {
        debug!(topic, "no subscribers, publish dropped");
        return Ok(Delivery::default());
    }

    let frame: Outbound = Frame::ForwardMessage {
        topic: topic.to_string(),
        data,
    }
    .encode()?
    .into();

    let mut delivery = Delivery {
        attempted: subscribers.len(),
        delivered: 0,
    };

    for subscriber in &subscribers {
        match subscriber.send(frame.clone()) {
            Ok(()) => delivery.delivered += 1,
            Err(e) => debug!(conn_id = %subscriber.id, topic, error = %e, "forward skipped"),
        }
    }

    Ok(delivery)
}

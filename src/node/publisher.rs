use std::sync::Arc;

use serde_json::Value;

use super::Link;
use crate::transport::message::Frame;
use crate::utils::Result;

/// Publishes on one topic over its node's connection.
#[derive(Debug, Clone)]
pub struct Publisher {
    topic: String,
    link: Arc<Link>,
}

impl Publisher {
    pub(crate) fn new(topic: &str, link: Arc<Link>) -> Self {
        Self {
            topic: topic.to_string(),
            link,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Fire and forget: success means the frame was written, not delivered.
    pub async fn publish(&self, data: Value) -> Result<()> {
        self.link
            .send(&Frame::Publish {
                topic: self.topic.clone(),
                data,
            })
            .await
    }
}

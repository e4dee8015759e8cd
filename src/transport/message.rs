//! Wire frames.
//!
//! Every frame is one JSON object with an `action` discriminant and an
//! action-specific `payload`, written on its own `\n`-terminated line:
//!
//! ```text
//! {"action":"publish","payload":{"topic":"hello_topic","data":"hi"}}
//! ```
//!
//! `data` is carried as an opaque `serde_json::Value`; the broker never
//! looks inside it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum Frame {
    RegisterNode { node_name: String },
    RegisterPublisher { topic: String },
    RegisterSubscriber { topic: String },
    Publish { topic: String, data: Value },
    /// Broker to node only.
    ForwardMessage { topic: String, data: Value },
}

/// A decoded line. Actions this version does not know are passed through
/// by name so the caller can ignore them.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Frame(Frame),
    Unknown(String),
}

impl Frame {
    const ACTIONS: [&'static str; 5] = [
        "register_node",
        "register_publisher",
        "register_subscriber",
        "publish",
        "forward_message",
    ];

    pub fn action(&self) -> &'static str {
        match self {
            Frame::RegisterNode { .. } => "register_node",
            Frame::RegisterPublisher { .. } => "register_publisher",
            Frame::RegisterSubscriber { .. } => "register_subscriber",
            Frame::Publish { .. } => "publish",
            Frame::ForwardMessage { .. } => "forward_message",
        }
    }

    /// Serializes the frame as one JSON line, newline included.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = serde_json::to_vec(self)?;
        buf.push(b'\n');
        Ok(buf)
    }

    /// Parses one line. Surrounding whitespace, including the trailing
    /// newline, is accepted.
    pub fn decode(line: &[u8]) -> Result<Inbound> {
        let value: Value = serde_json::from_slice(line)
            .map_err(|e| Error::Protocol(format!("malformed frame: {e}")))?;

        let action = value
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Protocol("frame has no action".to_string()))?
            .to_string();

        if !Self::ACTIONS.contains(&action.as_str()) {
            return Ok(Inbound::Unknown(action));
        }

        serde_json::from_value(value)
            .map(Inbound::Frame)
            .map_err(|e| Error::Protocol(format!("invalid {action} frame: {e}")))
    }
}

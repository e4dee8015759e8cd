//! Node client library.
//!
//! A `Node` holds one TCP connection to the master. Publishers created from
//! it share that connection; subscriptions register a callback that a
//! background listener task calls for each `forward_message` on the topic.
//!
//! ```no_run
//! # async fn demo() -> kidos::Result<()> {
//! use kidos::Node;
//! use serde_json::json;
//!
//! let node = Node::connect("talker", "127.0.0.1:12345").await?;
//! let publisher = node.create_publisher("hello_topic").await?;
//! publisher.publish(json!("Hello KidOS!")).await?;
//! node.destroy().await?;
//! # Ok(())
//! # }
//! ```

mod publisher;

pub use publisher::Publisher;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::transport::codec::{FrameReader, write_frame};
use crate::transport::message::{Frame, Inbound};
use crate::utils::{Error, Result};

type Callback = Arc<dyn Fn(Value) + Send + Sync>;
type Callbacks = Arc<Mutex<HashMap<String, Callback>>>;

/// Write side of the node's connection, shared with its publishers.
#[derive(Debug)]
pub(crate) struct Link {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    closed: AtomicBool,
}

impl Link {
    pub(crate) async fn send(&self, frame: &Frame) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::ConnectionClosed);
        }
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, frame).await
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut writer = self.writer.lock().await;
        writer.shutdown().await?;
        Ok(())
    }
}

pub struct Node {
    name: String,
    link: Arc<Link>,
    callbacks: Callbacks,
    listener: JoinHandle<()>,
}

impl Node {
    /// Connects to the master at `addr` and registers under `node_name`.
    pub async fn connect(node_name: &str, addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();

        let link = Arc::new(Link {
            writer: tokio::sync::Mutex::new(writer),
            closed: AtomicBool::new(false),
        });
        let callbacks: Callbacks = Arc::new(Mutex::new(HashMap::new()));

        link.send(&Frame::RegisterNode {
            node_name: node_name.to_string(),
        })
        .await?;

        let listener = tokio::spawn(listen(node_name.to_string(), reader, callbacks.clone()));

        Ok(Self {
            name: node_name.to_string(),
            link,
            callbacks,
            listener,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers as a publisher of `topic`.
    pub async fn create_publisher(&self, topic: &str) -> Result<Publisher> {
        self.link
            .send(&Frame::RegisterPublisher {
                topic: topic.to_string(),
            })
            .await?;
        Ok(Publisher::new(topic, self.link.clone()))
    }

    /// Subscribes to `topic`. A later subscription to the same topic replaces
    /// the callback.
    pub async fn create_subscription<F>(&self, topic: &str, callback: F) -> Result<()>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        // callback goes in first so no forwarded frame can beat it
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(topic.to_string(), Arc::new(callback));

        self.link
            .send(&Frame::RegisterSubscriber {
                topic: topic.to_string(),
            })
            .await
    }

    /// Stops the listener and closes the connection. Idempotent.
    pub async fn destroy(&self) -> Result<()> {
        self.listener.abort();
        self.link.close().await
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn listen(name: String, reader: OwnedReadHalf, callbacks: Callbacks) {
    let mut frames = FrameReader::new(reader);

    loop {
        match frames.next_frame().await {
            Ok(Some(Inbound::Frame(Frame::ForwardMessage { topic, data }))) => {
                let callback = callbacks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&topic)
                    .cloned();
                match callback {
                    Some(callback) => callback(data),
                    None => debug!(node_name = %name, topic = %topic, "no callback for topic"),
                }
            }
            Ok(Some(other)) => debug!(node_name = %name, frame = ?other, "ignoring frame"),
            Ok(None) => {
                debug!(node_name = %name, "master closed the connection");
                break;
            }
            Err(e) => {
                warn!(node_name = %name, error = %e, "listen error");
                break;
            }
        }
    }
}

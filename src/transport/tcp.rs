//! Connection supervisor
//!
//! Accepts TCP connections and runs one task per connection:
//! - a reader loop that decodes frames in arrival order and applies them to
//!   the registry or the forwarder
//! - a writer task that drains the connection's outbound queue onto the socket
//!
//! Whatever ends the reader loop (end of stream, read error, bad frame or
//! master shutdown), the connection is unregistered exactly once and the
//! socket is closed. Errors never leave the connection's own task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::broker::{TopicRegistry, forward};
use crate::client::{Connection, ConnectionId, Outbound};
use crate::config::BrokerSettings;
use crate::transport::codec::FrameReader;
use crate::transport::message::{Frame, Inbound};
use crate::utils::{Error, Result};

/// Runs the accept loop until accepting fails.
///
/// An accept error is returned to the caller and is fatal to the master.
/// `shutdown` is handed to every connection task; flipping it to `true`
/// makes them stop after the frame they are reading.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<TopicRegistry>,
    settings: BrokerSettings,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let registry = registry.clone();
        let settings = settings.clone();
        let shutdown = shutdown.clone();

        tokio::spawn(async move {
            handle_connection(stream, peer, registry, settings, shutdown).await;
        });
    }
}

/// What the reader loop knows about its node.
#[derive(Debug)]
struct Session {
    conn_id: ConnectionId,
    node_name: Option<String>,
}

pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<TopicRegistry>,
    settings: BrokerSettings,
    mut shutdown: watch::Receiver<bool>,
) {
    let (reader_half, writer_half) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel::<Outbound>();
    let connection = Connection::new(tx);
    let mut session = Session {
        conn_id: connection.id.clone(),
        node_name: None,
    };

    let writer_task = {
        let conn_id = session.conn_id.clone();
        let write_timeout = Duration::from_millis(settings.write_timeout_ms);
        tokio::spawn(async move {
            if let Err(e) = writer_loop(conn_id.clone(), writer_half, rx, write_timeout).await {
                warn!(conn_id = %conn_id, error = %e, "writer stopped");
            }
        })
    };

    registry.register_connection(connection);
    info!(conn_id = %session.conn_id, %peer, "connection accepted");

    let mut frames = FrameReader::with_max_frame_bytes(reader_half, settings.max_frame_bytes);
    let outcome = loop {
        if *shutdown.borrow() {
            break Err(Error::ConnectionClosed);
        }

        let next = tokio::select! {
            next = frames.next_frame() => next,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break Err(Error::ConnectionClosed);
                }
                continue;
            }
        };

        match next {
            Ok(Some(inbound)) => dispatch(&registry, &mut session, inbound),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    let node = session.node_name.as_deref().unwrap_or("-");
    match outcome {
        Ok(()) => info!(conn_id = %session.conn_id, node_name = node, "peer disconnected"),
        Err(Error::ConnectionClosed) => {
            info!(conn_id = %session.conn_id, node_name = node, "closing on shutdown")
        }
        Err(e) => warn!(conn_id = %session.conn_id, node_name = node, error = %e, "dropping connection"),
    }

    registry.unregister(&session.conn_id);

    // The registry held the last long-lived sender; the writer drains what is
    // queued and exits once in-flight forward snapshots are dropped.
    let _ = writer_task.await;
    debug!(conn_id = %session.conn_id, "connection removed");
}

fn dispatch(registry: &TopicRegistry, session: &mut Session, inbound: Inbound) {
    let conn_id = &session.conn_id;

    match inbound {
        Inbound::Frame(Frame::RegisterNode { node_name }) => {
            info!(conn_id = %conn_id, node_name = %node_name, "node registered");
            session.node_name = Some(node_name);
        }
        Inbound::Frame(Frame::RegisterPublisher { topic }) => {
            registry.register_publisher(conn_id, &topic);
            info!(conn_id = %conn_id, topic = %topic, "publisher registered");
        }
        Inbound::Frame(Frame::RegisterSubscriber { topic }) => {
            registry.register_subscriber(conn_id, &topic);
            info!(conn_id = %conn_id, topic = %topic, "subscriber registered");
        }
        Inbound::Frame(Frame::Publish { topic, data }) => match forward(registry, &topic, data) {
            Ok(delivery) => debug!(
                conn_id = %conn_id,
                topic = %topic,
                attempted = delivery.attempted,
                delivered = delivery.delivered,
                "published"
            ),
            Err(e) => warn!(conn_id = %conn_id, topic = %topic, error = %e, "forward failed"),
        },
        Inbound::Frame(frame @ Frame::ForwardMessage { .. }) => {
            debug!(conn_id = %conn_id, action = frame.action(), "ignoring broker-bound frame");
        }
        Inbound::Unknown(action) => {
            debug!(conn_id = %conn_id, action = %action, "ignoring unknown action");
        }
    }
}

/// Drains `rx` onto `writer` until every sender is gone.
///
/// A failed or timed-out write ends the loop with `SendFailure`; `rx` is
/// dropped with it, so further sends to the connection fail.
pub(crate) async fn writer_loop<W: AsyncWrite + Unpin>(
    conn_id: ConnectionId,
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    write_timeout: Duration,
) -> Result<()> {
    while let Some(frame) = rx.recv().await {
        let reason = match tokio::time::timeout(write_timeout, writer.write_all(&frame)).await {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("write timed out after {write_timeout:?}"),
        };
        return Err(Error::SendFailure {
            connection: conn_id,
            reason,
        });
    }
    Ok(())
}

//! Topic registry
//!
//! The registry is the only state shared between connection handlers. It maps
//! topic names to subscriber and publisher sets and keeps the send handle of
//! every live connection.
//!
//! Concurrency notes:
//! - A single `std::sync::Mutex` guards all of it. Every operation takes the
//!   lock once, so updates are linearizable and no reader can see a
//!   connection half removed.
//! - The lock is never held across I/O. `subscribers_of` hands back cloned
//!   `Connection`s and the forwarder sends after the guard is gone.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::broker::topic::Topic;
use crate::client::{Connection, ConnectionId};

#[derive(Debug, Default)]
struct RegistryState {
    topics: HashMap<String, Topic>,
    connections: HashMap<ConnectionId, Connection>,
}

#[derive(Debug, Default)]
pub struct TopicRegistry {
    state: Mutex<RegistryState>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        // Every critical section leaves the maps consistent, so a panic in
        // another holder does not invalidate them.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a freshly accepted connection to the live set.
    pub fn register_connection(&self, connection: Connection) {
        let mut state = self.state();
        state.connections.insert(connection.id.clone(), connection);
    }

    /// Subscribes `id` to `topic`, creating the topic on first use.
    ///
    /// Returns false when the subscription already existed.
    pub fn register_subscriber(&self, id: &ConnectionId, topic: &str) -> bool {
        let mut state = self.state();
        state
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .subscribe(id.clone())
    }

    /// Records `id` as a publisher of `topic`. Has no effect on delivery.
    pub fn register_publisher(&self, id: &ConnectionId, topic: &str) -> bool {
        let mut state = self.state();
        state
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .add_publisher(id.clone())
    }

    /// Removes `id` from every topic and from the live set.
    ///
    /// Call once, after the connection's handler loop has exited. Topics left
    /// without members are pruned. Returns false if `id` was not live.
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        let mut state = self.state();
        let was_live = state.connections.remove(id).is_some();

        state.topics.retain(|name, topic| {
            topic.remove(id);
            if topic.is_empty() {
                debug!(topic = %name, "pruned empty topic");
                false
            } else {
                true
            }
        });

        was_live
    }

    /// Snapshot of the live connections subscribed to `topic`.
    pub fn subscribers_of(&self, topic: &str) -> Vec<Connection> {
        let state = self.state();
        let Some(topic) = state.topics.get(topic) else {
            return Vec::new();
        };

        topic
            .subscribers
            .iter()
            .filter_map(|id| state.connections.get(id).cloned())
            .collect()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.state()
            .topics
            .get(topic)
            .map_or(0, |t| t.subscribers.len())
    }

    pub fn publisher_count(&self, topic: &str) -> usize {
        self.state()
            .topics
            .get(topic)
            .map_or(0, |t| t.publishers.len())
    }

    pub fn topic_count(&self) -> usize {
        self.state().topics.len()
    }

    pub fn connection_count(&self) -> usize {
        self.state().connections.len()
    }

    pub fn is_live(&self, id: &ConnectionId) -> bool {
        self.state().connections.contains_key(id)
    }
}

//! Topic membership
//!
//! A `Topic` holds the connections registered against one topic name. Both
//! sets are `HashSet`s, so repeated registrations are a no-op.
//!
//! Callers must synchronize access; `TopicRegistry` keeps every `Topic`
//! behind its lock.

use std::collections::HashSet;

use crate::client::ConnectionId;

#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub subscribers: HashSet<ConnectionId>,
    /// Bookkeeping only, never consulted for delivery.
    pub publishers: HashSet<ConnectionId>,
}

impl Topic {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: HashSet::new(),
            publishers: HashSet::new(),
        }
    }

    /// Add a subscriber. Returns false if it was already subscribed.
    pub fn subscribe(&mut self, id: ConnectionId) -> bool {
        self.subscribers.insert(id)
    }

    /// Add a publisher. Returns false if it was already registered.
    pub fn add_publisher(&mut self, id: ConnectionId) -> bool {
        self.publishers.insert(id)
    }

    /// Drop `id` from both sets.
    pub fn remove(&mut self, id: &ConnectionId) {
        self.subscribers.remove(id);
        self.publishers.remove(id);
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty() && self.publishers.is_empty()
    }
}

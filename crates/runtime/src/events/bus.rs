//! Topic-based event bus implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tokio::sync::broadcast;

use super::types::GlobalEvent;

/// Topics for event routing
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum Topic {
    Player,
    Faction,
    World,
    Ecosystem,
    Npc,
    Combat,
    Economy,
    Quest,
    Custom,
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Channels are created up front for every topic and
/// are usable without an async runtime: publishers call `send`, consumers
/// drain with `try_recv`.
pub struct EventBus {
    /// One sender per topic, indexed by the topic's declaration order.
    channels: Arc<Vec<broadcast::Sender<GlobalEvent>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::iter()
            .map(|_| broadcast::channel(capacity.max(1)).0)
            .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<GlobalEvent> {
        &self.channels[topic as usize]
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: GlobalEvent) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<GlobalEvent> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics, skipping duplicates.
    pub fn subscribe_multiple(
        &self,
        topics: impl IntoIterator<Item = Topic>,
    ) -> Vec<(Topic, broadcast::Receiver<GlobalEvent>)> {
        let mut seen = Vec::new();
        topics
            .into_iter()
            .filter(|topic| {
                let fresh = !seen.contains(topic);
                seen.push(*topic);
                fresh
            })
            .map(|topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

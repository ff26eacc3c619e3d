//! Topic-based event bus for world events.
//!
//! World events are published to topics grouped by category, and consumers
//! subscribe only to the topics they need. Managers report their own
//! lifecycle on a separate [`ManagerEvent`] channel.

mod bus;
mod types;

pub use bus::{EventBus, Topic};
pub use types::{EventPriority, GlobalEvent, GlobalEventType, ManagerEvent};

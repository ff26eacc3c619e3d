//! Runtime hosting for NPC behavior trees.
//!
//! This crate drives [`behavior_tree`] trees on behalf of individual NPCs.
//! Hosts embed one [`Manager`] per agent, advance it with the frame delta,
//! and connect it to the world through an [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`manager`] hosts the per-agent lifecycle, ticking and statistics
//! - [`events`] provides the topic-based bus for world events
//! - [`config`] loads manager settings from TOML
//! - [`presets`] builds ready-made patrol, guard and follow trees
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod presets;

pub use config::{ConfigLoader, ManagerConfig};
pub use error::{ManagerError, Result};
pub use events::{EventBus, EventPriority, GlobalEvent, GlobalEventType, ManagerEvent, Topic};
pub use manager::{ExecutionState, ExecutionStats, LISTENED_EVENTS, Manager, ManagerBuilder, keys};

//! Tick-driven behavior tree engine for NPC AI.
//!
//! Trees are resumable: a node may report `Running` and be ticked again on a
//! later update, picking up where it left off. Every node follows the same
//! per-run lifecycle of initialize, execute (one or more ticks), abort and
//! cleanup.
//!
//! # Architecture
//!
//! - [`BehaviorTree`]: arena owning every node; dispatches the lifecycle
//! - [`Blackboard`]: typed key/value memory shared by all nodes of a tree
//! - [`Context`]: what a node sees while it runs (blackboard, agent,
//!   movement, randomness, clock)
//! - Composite nodes: [`Selector`], [`Sequence`], [`Parallel`]
//! - Decorator nodes: [`Decorator`] with guard, invert and force-success
//! - Leaf nodes: [`MoveTo`], [`Wait`], [`CheckCondition`],
//!   [`SetBlackboardValue`], and custom [`Behavior`] actions
//! - [`builder`]: helpers to describe a tree as nested values

pub mod behavior;
pub mod blackboard;
pub mod builder;
pub mod composite;
pub mod context;
pub mod decorator;
pub mod error;
pub mod leaf;
pub mod math;
pub mod node;
pub mod status;
pub mod tree;
pub mod value;

#[cfg(test)]
mod testing;

// Re-export core types for ergonomic API
pub use behavior::{Behavior, FnBehavior};
pub use blackboard::{Blackboard, CURRENT_STATE_KEY, ListenerId, TARGET_ACTOR_KEY, TARGET_LOCATION_KEY};
pub use composite::{Composite, CompositeKind, Parallel, ParallelPolicy, Selector, Sequence};
pub use context::{Agent, Context, Detached, MoveError, MoveRequestId, MoveStatus, MovementService};
pub use decorator::{Decorator, DecoratorEffect};
pub use error::TreeError;
pub use leaf::{
    CheckCondition, ComparisonOperator, ConditionKind, Leaf, MoveTarget, MoveTo,
    SetBlackboardValue, ValueSource, Wait,
};
pub use math::Vec3;
pub use node::{Node, NodeId, NodeKind, NodeState};
pub use status::Status;
pub use tree::BehaviorTree;
pub use value::{BlackboardValue, FromBlackboardValue, ObjectRef, TypeRef, ValueType};

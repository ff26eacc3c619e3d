//! Per-tick execution context and the external collaborators nodes talk to.
//!
//! Nodes never reach into the game world directly. Everything outside the
//! tree is reached through the narrow traits in this module:
//!
//! - [`MovementService`]: issues, polls and cancels movement requests
//! - [`Agent`]: read-only view of the agent the tree is driving

use rand::RngCore;

use crate::{Blackboard, ObjectRef, Vec3};

/// Opaque handle to an in-flight movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveRequestId(pub u64);

/// Status of a movement request as reported by the movement service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum MoveStatus {
    /// Still travelling toward the goal.
    Moving,
    /// Reached the goal within the acceptance radius.
    Arrived,
    /// No movement is in progress for this request.
    Idle,
    /// Pathfinding or path following failed.
    Failed,
}

/// Reasons a movement request can be rejected up front.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MoveError {
    #[error("no navigable path to {0}")]
    NoPath(Vec3),

    #[error("movement service unavailable")]
    Unavailable,

    #[error("movement request rejected: {0}")]
    Rejected(String),
}

/// Navigation/pathfinding backend consumed by the `MoveTo` leaf.
///
/// Requests are asynchronous from the tree's point of view: the leaf stores
/// the returned handle and polls it every tick. No call may block.
pub trait MovementService {
    /// Starts moving toward `target`.
    fn request_move(
        &mut self,
        target: Vec3,
        acceptance_radius: f32,
        use_pathfinding: bool,
    ) -> Result<MoveRequestId, MoveError>;

    /// Reports the current status of `request`.
    fn poll(&self, request: MoveRequestId) -> MoveStatus;

    /// Stops `request`. Cancelling an unknown or finished request is a no-op.
    fn cancel(&mut self, request: MoveRequestId);
}

/// Read-only view of the agent a tree is driving.
pub trait Agent {
    /// Current world location of the agent.
    fn location(&self) -> Vec3;

    /// Current health as a percentage in `0.0..=100.0`.
    fn health_percentage(&self) -> f32 {
        100.0
    }

    /// Resolves the location of another world object, if it still exists.
    fn locate(&self, object: ObjectRef) -> Option<Vec3>;

    /// Evaluates a game-specific named predicate.
    fn custom_condition(&self, _name: &str, _blackboard: &Blackboard) -> bool {
        false
    }
}

/// Agent and movement stand-in for trees that are not attached to a world.
///
/// Sits at the origin, resolves nothing, and rejects every movement request.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl Agent for Detached {
    fn location(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn locate(&self, _object: ObjectRef) -> Option<Vec3> {
        None
    }
}

impl MovementService for Detached {
    fn request_move(&mut self, _: Vec3, _: f32, _: bool) -> Result<MoveRequestId, MoveError> {
        Err(MoveError::Unavailable)
    }

    fn poll(&self, _request: MoveRequestId) -> MoveStatus {
        MoveStatus::Idle
    }

    fn cancel(&mut self, _request: MoveRequestId) {}
}

/// Everything a node can touch while it runs.
///
/// `now` is simulation time in seconds, supplied by whoever drives the tree.
pub struct Context<'a> {
    pub blackboard: &'a mut Blackboard,
    pub agent: &'a dyn Agent,
    pub movement: &'a mut dyn MovementService,
    pub rng: &'a mut dyn RngCore,
    pub now: f32,
}

impl<'a> Context<'a> {
    pub fn new(
        blackboard: &'a mut Blackboard,
        agent: &'a dyn Agent,
        movement: &'a mut dyn MovementService,
        rng: &'a mut dyn RngCore,
        now: f32,
    ) -> Self {
        Self {
            blackboard,
            agent,
            movement,
            rng,
            now,
        }
    }
}

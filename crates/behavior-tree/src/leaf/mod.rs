//! Leaf behavior nodes.
//!
//! Leaves do the actual work of a tree. The built-in leaves cover movement,
//! waiting, predicates and blackboard writes; anything game-specific is an
//! [`Leaf::Action`] wrapping a user [`Behavior`].

mod condition;
mod move_to;
mod set_value;
mod wait;

pub use condition::{CheckCondition, ComparisonOperator, ConditionKind, EQUALITY_TOLERANCE};
pub use move_to::{MoveTarget, MoveTo};
pub use set_value::{SetBlackboardValue, ValueSource};
pub use wait::Wait;

use crate::{Behavior, Blackboard, Context, Status};

/// A childless node.
pub enum Leaf {
    MoveTo(MoveTo),
    Wait(Wait),
    CheckCondition(CheckCondition),
    SetValue(SetBlackboardValue),
    Action(Box<dyn Behavior>),
}

impl Leaf {
    /// Wraps a custom behavior.
    pub fn action(behavior: impl Behavior + 'static) -> Self {
        Leaf::Action(Box::new(behavior))
    }

    fn behavior(&self) -> &dyn Behavior {
        match self {
            Leaf::MoveTo(leaf) => leaf,
            Leaf::Wait(leaf) => leaf,
            Leaf::CheckCondition(leaf) => leaf,
            Leaf::SetValue(leaf) => leaf,
            Leaf::Action(leaf) => leaf.as_ref(),
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn Behavior {
        match self {
            Leaf::MoveTo(leaf) => leaf,
            Leaf::Wait(leaf) => leaf,
            Leaf::CheckCondition(leaf) => leaf,
            Leaf::SetValue(leaf) => leaf,
            Leaf::Action(leaf) => leaf.as_mut(),
        }
    }

    pub fn name(&self) -> &str {
        self.behavior().name()
    }

    pub fn description(&self) -> String {
        match self {
            Leaf::MoveTo(leaf) => match &leaf.target {
                MoveTarget::Location(location) => format!("Move to {location}"),
                MoveTarget::LocationKey(key) => format!("Move to BB['{key}']"),
                MoveTarget::Actor(actor) => format!("Move to {actor}"),
                MoveTarget::ActorKey(key) => format!("Move to actor BB['{key}']"),
            },
            Leaf::Wait(leaf) if leaf.random_deviation > 0.0 => {
                format!("Wait {:.1}s (+/- {:.1}s)", leaf.duration, leaf.random_deviation)
            }
            Leaf::Wait(leaf) => format!("Wait {:.1}s", leaf.duration),
            Leaf::CheckCondition(leaf) => leaf.description(),
            Leaf::SetValue(leaf) => leaf.description(),
            Leaf::Action(leaf) => leaf.name().to_owned(),
        }
    }

    pub(crate) fn can_execute(&self, blackboard: &Blackboard) -> bool {
        match self {
            Leaf::SetValue(leaf) => leaf.can_execute(blackboard),
            _ => true,
        }
    }

    pub(crate) fn initialize(&mut self, ctx: &mut Context<'_>) {
        self.behavior_mut().initialize(ctx);
    }

    pub(crate) fn execute(&mut self, ctx: &mut Context<'_>) -> Status {
        match self.behavior_mut().execute(ctx) {
            Status::Invalid => {
                tracing::warn!(leaf = self.name(), "leaf returned Invalid, treating as Failure");
                Status::Failure
            }
            status => status,
        }
    }

    pub(crate) fn abort(&mut self, ctx: &mut Context<'_>) {
        self.behavior_mut().abort(ctx);
    }

    pub(crate) fn cleanup(&mut self, ctx: &mut Context<'_>) {
        self.behavior_mut().cleanup(ctx);
    }
}

impl std::fmt::Debug for Leaf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leaf::MoveTo(leaf) => f.debug_tuple("MoveTo").field(leaf).finish(),
            Leaf::Wait(leaf) => f.debug_tuple("Wait").field(leaf).finish(),
            Leaf::CheckCondition(leaf) => f.debug_tuple("CheckCondition").field(leaf).finish(),
            Leaf::SetValue(leaf) => f.debug_tuple("SetValue").field(leaf).finish(),
            Leaf::Action(leaf) => f.debug_tuple("Action").field(&leaf.name()).finish(),
        }
    }
}

impl From<MoveTo> for Leaf {
    fn from(value: MoveTo) -> Self {
        Leaf::MoveTo(value)
    }
}

impl From<Wait> for Leaf {
    fn from(value: Wait) -> Self {
        Leaf::Wait(value)
    }
}

impl From<CheckCondition> for Leaf {
    fn from(value: CheckCondition) -> Self {
        Leaf::CheckCondition(value)
    }
}

impl From<SetBlackboardValue> for Leaf {
    fn from(value: SetBlackboardValue) -> Self {
        Leaf::SetValue(value)
    }
}

impl From<Box<dyn Behavior>> for Leaf {
    fn from(value: Box<dyn Behavior>) -> Self {
        Leaf::Action(value)
    }
}

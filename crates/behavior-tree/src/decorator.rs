//! Decorator behavior nodes.
//!
//! Decorators wrap a single child and gate or modify its result. The effect
//! is one of pass-through, [`DecoratorEffect::Invert`] (NOT logic) and
//! [`DecoratorEffect::ForceSuccess`] (error suppression). Any decorator may
//! additionally carry a blackboard condition that must hold for the child to
//! run at all.

use std::fmt;

use crate::{BehaviorTree, Blackboard, Context, NodeId, Status};

/// Predicate over the blackboard that gates a decorator's child.
pub type Condition = Box<dyn Fn(&Blackboard) -> bool>;

/// How a decorator transforms its child's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
pub enum DecoratorEffect {
    /// Returns the child's status unchanged.
    #[default]
    PassThrough,
    /// `Success` and `Failure` swap; `Running` passes through.
    Invert,
    /// `Failure` becomes `Success`; `Running` passes through.
    ForceSuccess,
}

impl DecoratorEffect {
    pub fn apply(self, status: Status) -> Status {
        match self {
            DecoratorEffect::PassThrough => status,
            DecoratorEffect::Invert => status.invert(),
            DecoratorEffect::ForceSuccess if status.is_running() => Status::Running,
            DecoratorEffect::ForceSuccess => Status::Success,
        }
    }
}

/// A node with exactly one child slot.
pub struct Decorator {
    pub(crate) child: Option<NodeId>,
    condition: Option<Condition>,
    pub effect: DecoratorEffect,
}

impl Decorator {
    pub fn new(effect: DecoratorEffect) -> Self {
        Self {
            child: None,
            condition: None,
            effect,
        }
    }

    /// Runs the child only while `condition` holds.
    pub fn guard(condition: impl Fn(&Blackboard) -> bool + 'static) -> Self {
        Self::new(DecoratorEffect::PassThrough).with_condition(condition)
    }

    pub fn inverter() -> Self {
        Self::new(DecoratorEffect::Invert)
    }

    pub fn always_succeed() -> Self {
        Self::new(DecoratorEffect::ForceSuccess)
    }

    pub fn with_condition(mut self, condition: impl Fn(&Blackboard) -> bool + 'static) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    pub fn child(&self) -> Option<NodeId> {
        self.child
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    /// True when no condition is set.
    pub fn check_condition(&self, blackboard: &Blackboard) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition(blackboard))
    }

    pub fn name(&self) -> &str {
        match (self.effect, self.condition.is_some()) {
            (DecoratorEffect::Invert, _) => "Inverter",
            (DecoratorEffect::ForceSuccess, _) => "AlwaysSucceed",
            (DecoratorEffect::PassThrough, true) => "Guard",
            (DecoratorEffect::PassThrough, false) => "Decorator",
        }
    }

    pub fn description(&self) -> String {
        let base = match self.effect {
            DecoratorEffect::PassThrough => "Runs its child unchanged",
            DecoratorEffect::Invert => "Inverts its child's result",
            DecoratorEffect::ForceSuccess => "Succeeds regardless of its child's result",
        };
        if self.condition.is_some() {
            format!("{base} while its condition holds.")
        } else {
            format!("{base}.")
        }
    }
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorator")
            .field("child", &self.child)
            .field("has_condition", &self.condition.is_some())
            .field("effect", &self.effect)
            .finish()
    }
}

impl BehaviorTree {
    pub(crate) fn execute_decorator(&mut self, id: NodeId, ctx: &mut Context<'_>) -> Status {
        let Some(decorator) = self.decorator(id) else {
            return Status::Failure;
        };
        let child = decorator.child;
        let effect = decorator.effect;

        if !decorator.check_condition(ctx.blackboard) {
            if let Some(child) = child
                && self.status(child).is_running()
            {
                self.abort(child, ctx);
            }
            return Status::Failure;
        }

        let Some(child) = child else {
            tracing::warn!(node = %id, "decorator has no child");
            return Status::Failure;
        };

        effect.apply(self.execute(child, ctx))
    }
}

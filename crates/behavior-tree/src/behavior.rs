//! Extension point for game-specific leaf nodes.
//!
//! This module defines the [`Behavior`] trait. Built-in leaves (movement,
//! waiting, conditions, blackboard writes) are part of the closed node kinds;
//! anything else a game needs is plugged in as a [`Behavior`] and stored in
//! the tree as an action leaf.

use crate::{Context, Status};

/// A custom leaf executed against the tick [`Context`].
pub trait Behavior {
    /// Performs one tick of work.
    ///
    /// # Returns
    ///
    /// - `Status::Success` if the behavior finished successfully
    /// - `Status::Failure` if it failed
    /// - `Status::Running` if it needs further ticks
    fn execute(&mut self, ctx: &mut Context<'_>) -> Status;

    /// Called once before the first `execute` of a run.
    fn initialize(&mut self, _ctx: &mut Context<'_>) {}

    /// Called when the behavior is interrupted. Must be idempotent and must
    /// stop any outstanding side effect before returning.
    fn abort(&mut self, _ctx: &mut Context<'_>) {}

    /// Called once when the run ends.
    fn cleanup(&mut self, _ctx: &mut Context<'_>) {}

    /// Display name used in logs and debug output.
    fn name(&self) -> &str {
        "Action"
    }
}

/// Blanket implementation for boxed behaviors.
impl Behavior for Box<dyn Behavior> {
    #[inline]
    fn execute(&mut self, ctx: &mut Context<'_>) -> Status {
        (**self).execute(ctx)
    }

    fn initialize(&mut self, ctx: &mut Context<'_>) {
        (**self).initialize(ctx)
    }

    fn abort(&mut self, ctx: &mut Context<'_>) {
        (**self).abort(ctx)
    }

    fn cleanup(&mut self, ctx: &mut Context<'_>) {
        (**self).cleanup(ctx)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Adapts a closure into a named [`Behavior`].
pub struct FnBehavior<F> {
    name: String,
    f: F,
}

impl<F> FnBehavior<F>
where
    F: FnMut(&mut Context<'_>) -> Status,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Behavior for FnBehavior<F>
where
    F: FnMut(&mut Context<'_>) -> Status,
{
    fn execute(&mut self, ctx: &mut Context<'_>) -> Status {
        (self.f)(ctx)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

use crate::context::{MoveRequestId, MoveStatus};
use crate::{Behavior, Context, ObjectRef, Status, Vec3};

/// Where a [`MoveTo`] leaf is heading.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveTarget {
    /// A fixed world location.
    Location(Vec3),
    /// A vector read from the blackboard when the move starts.
    LocationKey(String),
    /// A fixed world object, followed to its location when the move starts.
    Actor(ObjectRef),
    /// An object read from the blackboard when the move starts.
    ActorKey(String),
}

/// Moves the agent to a target through the [`MovementService`](crate::MovementService).
///
/// The first tick of a run resolves the target and issues a single movement
/// request; later ticks poll it. Exceeding `timeout` seconds cancels the
/// request and fails the node.
#[derive(Debug, Clone)]
pub struct MoveTo {
    pub target: MoveTarget,
    pub acceptance_radius: f32,
    pub use_pathfinding: bool,
    /// Seconds before giving up; `<= 0` disables the timeout.
    pub timeout: f32,
    request: Option<MoveRequestId>,
    started_at: Option<f32>,
}

impl MoveTo {
    pub const DEFAULT_ACCEPTANCE_RADIUS: f32 = 50.0;
    pub const DEFAULT_TIMEOUT: f32 = 10.0;

    pub fn new(target: MoveTarget) -> Self {
        Self {
            target,
            acceptance_radius: Self::DEFAULT_ACCEPTANCE_RADIUS,
            use_pathfinding: true,
            timeout: Self::DEFAULT_TIMEOUT,
            request: None,
            started_at: None,
        }
    }

    pub fn location(location: Vec3) -> Self {
        Self::new(MoveTarget::Location(location))
    }

    pub fn location_key(key: impl Into<String>) -> Self {
        Self::new(MoveTarget::LocationKey(key.into()))
    }

    pub fn actor(actor: ObjectRef) -> Self {
        Self::new(MoveTarget::Actor(actor))
    }

    pub fn actor_key(key: impl Into<String>) -> Self {
        Self::new(MoveTarget::ActorKey(key.into()))
    }

    pub fn with_acceptance_radius(mut self, radius: f32) -> Self {
        self.acceptance_radius = radius;
        self
    }

    pub fn with_pathfinding(mut self, use_pathfinding: bool) -> Self {
        self.use_pathfinding = use_pathfinding;
        self
    }

    pub fn with_timeout(mut self, timeout: f32) -> Self {
        self.timeout = timeout;
        self
    }

    /// Handle of the in-flight request, if any.
    pub fn request(&self) -> Option<MoveRequestId> {
        self.request
    }

    /// Resolves the goal location, or `None` when the target is unusable.
    pub fn resolve_target(&self, ctx: &Context<'_>) -> Option<Vec3> {
        let goal = match &self.target {
            MoveTarget::Location(location) => return Some(*location),
            MoveTarget::LocationKey(key) => ctx.blackboard.get_vector(key, Vec3::ZERO),
            MoveTarget::Actor(actor) => ctx.agent.locate(*actor)?,
            MoveTarget::ActorKey(key) => ctx.agent.locate(ctx.blackboard.get_object(key)?)?,
        };
        (!goal.is_zero()).then_some(goal)
    }

    fn timed_out(&self, now: f32) -> bool {
        match self.started_at {
            Some(start) if self.timeout > 0.0 => now - start > self.timeout,
            _ => false,
        }
    }

    fn finish(&mut self, status: Status) -> Status {
        self.request = None;
        self.started_at = None;
        status
    }
}

impl Behavior for MoveTo {
    fn execute(&mut self, ctx: &mut Context<'_>) -> Status {
        if self.request.is_none() {
            let Some(goal) = self.resolve_target(ctx) else {
                tracing::warn!(move_target = ?self.target, "move target could not be resolved");
                return Status::Failure;
            };

            match ctx
                .movement
                .request_move(goal, self.acceptance_radius, self.use_pathfinding)
            {
                Ok(request) => {
                    tracing::debug!(%goal, ?request, "movement requested");
                    self.request = Some(request);
                    self.started_at = Some(ctx.now);
                }
                Err(err) => {
                    tracing::warn!(%goal, error = %err, "movement request failed");
                    return Status::Failure;
                }
            }
        }

        if self.timed_out(ctx.now) {
            tracing::warn!(timeout = self.timeout, "movement timed out");
            self.abort(ctx);
            return Status::Failure;
        }

        let Some(request) = self.request else {
            return Status::Failure;
        };
        match ctx.movement.poll(request) {
            MoveStatus::Moving => Status::Running,
            MoveStatus::Arrived => self.finish(Status::Success),
            MoveStatus::Idle | MoveStatus::Failed => self.finish(Status::Failure),
        }
    }

    fn initialize(&mut self, _ctx: &mut Context<'_>) {
        self.request = None;
        self.started_at = None;
    }

    fn abort(&mut self, ctx: &mut Context<'_>) {
        if let Some(request) = self.request.take() {
            ctx.movement.cancel(request);
        }
        self.started_at = None;
    }

    fn cleanup(&mut self, ctx: &mut Context<'_>) {
        self.abort(ctx);
    }

    fn name(&self) -> &str {
        "Move To"
    }
}

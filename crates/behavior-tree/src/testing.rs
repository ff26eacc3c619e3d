//! Shared fixtures for unit tests: scripted leaves, a controllable movement
//! service and an agent with fixed answers.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::context::{MoveError, MoveRequestId, MoveStatus};
use crate::{
    Agent, BehaviorTree, Behavior, Blackboard, Context, Leaf, MovementService, NodeId, ObjectRef,
    Status, Vec3,
};

#[derive(Default)]
struct Counts {
    ticks: Cell<usize>,
    inits: Cell<usize>,
    aborts: Cell<usize>,
    cleanups: Cell<usize>,
    stopped: Cell<usize>,
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

/// Observes the leaves created from it.
#[derive(Clone, Default)]
pub struct Probe {
    counts: Rc<Counts>,
}

impl Probe {
    pub fn always(&self, status: Status) -> Scripted {
        self.script([status])
    }

    /// Plays `statuses` in order, repeating the last one forever.
    pub fn script(&self, statuses: impl IntoIterator<Item = Status>) -> Scripted {
        Scripted {
            statuses: statuses.into_iter().collect(),
            counts: Rc::clone(&self.counts),
            active: false,
        }
    }

    pub fn ticks(&self) -> usize {
        self.counts.ticks.get()
    }

    pub fn inits(&self) -> usize {
        self.counts.inits.get()
    }

    pub fn aborts(&self) -> usize {
        self.counts.aborts.get()
    }

    pub fn cleanups(&self) -> usize {
        self.counts.cleanups.get()
    }

    /// Aborts that actually interrupted a running leaf.
    pub fn side_effects_stopped(&self) -> usize {
        self.counts.stopped.get()
    }
}

/// Leaf that replays a fixed list of statuses.
pub struct Scripted {
    statuses: VecDeque<Status>,
    counts: Rc<Counts>,
    active: bool,
}

impl Scripted {
    pub fn probe() -> Probe {
        Probe::default()
    }

    pub fn probes(n: usize) -> Vec<Probe> {
        (0..n).map(|_| Probe::default()).collect()
    }
}

impl Behavior for Scripted {
    fn execute(&mut self, _ctx: &mut Context<'_>) -> Status {
        bump(&self.counts.ticks);
        let status = if self.statuses.len() > 1 {
            self.statuses.pop_front().unwrap_or(Status::Failure)
        } else {
            self.statuses.front().copied().unwrap_or(Status::Failure)
        };
        self.active = status.is_running();
        status
    }

    fn initialize(&mut self, _ctx: &mut Context<'_>) {
        bump(&self.counts.inits);
    }

    fn abort(&mut self, _ctx: &mut Context<'_>) {
        bump(&self.counts.aborts);
        if std::mem::take(&mut self.active) {
            bump(&self.counts.stopped);
        }
    }

    fn cleanup(&mut self, _ctx: &mut Context<'_>) {
        bump(&self.counts.cleanups);
        self.active = false;
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

impl From<Scripted> for Leaf {
    fn from(value: Scripted) -> Self {
        Leaf::action(value)
    }
}

/// Movement service whose poll results are scripted.
#[derive(Default)]
pub struct MockMovement {
    pub requests: Vec<(Vec3, f32, bool)>,
    pub cancels: Vec<MoveRequestId>,
    pub reject: bool,
    statuses: RefCell<VecDeque<MoveStatus>>,
}

impl MockMovement {
    /// Poll results in order; the last one repeats.
    pub fn script(&mut self, statuses: impl IntoIterator<Item = MoveStatus>) {
        *self.statuses.get_mut() = statuses.into_iter().collect();
    }
}

impl MovementService for MockMovement {
    fn request_move(
        &mut self,
        target: Vec3,
        acceptance_radius: f32,
        use_pathfinding: bool,
    ) -> Result<MoveRequestId, MoveError> {
        if self.reject {
            return Err(MoveError::NoPath(target));
        }
        self.requests.push((target, acceptance_radius, use_pathfinding));
        Ok(MoveRequestId(self.requests.len() as u64))
    }

    fn poll(&self, _request: MoveRequestId) -> MoveStatus {
        let mut statuses = self.statuses.borrow_mut();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or(MoveStatus::Idle)
        } else {
            statuses.front().copied().unwrap_or(MoveStatus::Idle)
        }
    }

    fn cancel(&mut self, request: MoveRequestId) {
        self.cancels.push(request);
    }
}

pub struct FixedAgent {
    pub location: Vec3,
    pub health: f32,
    pub objects: HashMap<ObjectRef, Vec3>,
    pub conditions: HashMap<String, bool>,
}

impl FixedAgent {
    pub fn place(&mut self, object: ObjectRef, location: Vec3) {
        self.objects.insert(object, location);
    }
}

impl Default for FixedAgent {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            health: 100.0,
            objects: HashMap::new(),
            conditions: HashMap::new(),
        }
    }
}

impl Agent for FixedAgent {
    fn location(&self) -> Vec3 {
        self.location
    }

    fn health_percentage(&self) -> f32 {
        self.health
    }

    fn locate(&self, object: ObjectRef) -> Option<Vec3> {
        self.objects.get(&object).copied()
    }

    fn custom_condition(&self, name: &str, _blackboard: &Blackboard) -> bool {
        self.conditions.get(name).copied().unwrap_or(false)
    }
}

/// Everything a tree needs to run outside a manager.
pub struct Harness {
    pub blackboard: Blackboard,
    pub agent: FixedAgent,
    pub movement: MockMovement,
    pub rng: StdRng,
    pub now: f32,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            blackboard: Blackboard::new(),
            agent: FixedAgent::default(),
            movement: MockMovement::default(),
            rng: StdRng::seed_from_u64(0xDA),
            now: 0.0,
        }
    }

    pub fn ctx(&mut self) -> Context<'_> {
        Context::new(
            &mut self.blackboard,
            &self.agent,
            &mut self.movement,
            &mut self.rng,
            self.now,
        )
    }

    /// Initializes the root and executes it once.
    pub fn run_root(&mut self, tree: &mut BehaviorTree) -> Status {
        let root = tree.root().expect("tree has a root");
        tree.initialize(root, &mut self.ctx());
        tree.execute(root, &mut self.ctx())
    }

    /// Executes the root once without re-initializing.
    pub fn tick(&mut self, tree: &mut BehaviorTree) -> Status {
        let root = tree.root().expect("tree has a root");
        tree.execute(root, &mut self.ctx())
    }

    pub fn initialize(&mut self, tree: &mut BehaviorTree, id: NodeId) {
        tree.initialize(id, &mut self.ctx());
    }

    pub fn abort(&mut self, tree: &mut BehaviorTree, id: NodeId) {
        tree.abort(id, &mut self.ctx());
    }

    pub fn cleanup(&mut self, tree: &mut BehaviorTree, id: NodeId) {
        tree.cleanup(id, &mut self.ctx());
    }
}

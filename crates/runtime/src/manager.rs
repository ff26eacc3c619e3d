//! Per-NPC behavior tree manager.
//!
//! A [`Manager`] owns one agent's blackboard and at most one loaded tree. It
//! is advanced by the host with a time delta and executes the root whenever
//! an update is due, restarting or settling once the root finishes. World
//! events arrive through the injected [`EventBus`]; the manager reports its
//! own lifecycle as [`ManagerEvent`]s.
//!
//! # State machine
//!
//! ```text
//! Inactive ──start──▶ Running ◀──resume── Paused
//!    ▲                  │  │ ──pause──────▲
//!    └──────stop────────┘  ├──finish (no loop)──▶ Completed
//!                          └──abort─────────────▶ Aborted
//! ```

use std::time::{Duration, Instant};

use behavior_tree::{
    Agent, BehaviorTree, Blackboard, Context, Detached, MovementService, NodeId, ObjectRef,
    Status, Vec3,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::config::ManagerConfig;
use crate::error::{ManagerError, Result};
use crate::events::{EventBus, GlobalEvent, GlobalEventType, ManagerEvent};

/// Blackboard keys seeded and maintained by the manager.
pub mod keys {
    pub use behavior_tree::{CURRENT_STATE_KEY, TARGET_ACTOR_KEY, TARGET_LOCATION_KEY};

    pub const HOME_LOCATION: &str = "HomeLocation";
    pub const CURRENT_PATROL_INDEX: &str = "CurrentPatrolIndex";
    pub const ALERT_LEVEL: &str = "AlertLevel";
    pub const LAST_KNOWN_PLAYER_LOCATION: &str = "LastKnownPlayerLocation";
    pub const PATROL_POINT_COUNT: &str = "PatrolPointCount";

    /// Key of the `index`-th patrol point.
    pub fn patrol_point(index: usize) -> String {
        format!("PatrolPoint{index}")
    }
}

/// World events the manager forwards to its handler.
pub const LISTENED_EVENTS: [GlobalEventType; 5] = [
    GlobalEventType::NpcDied,
    GlobalEventType::CombatStarted,
    GlobalEventType::CombatEnded,
    GlobalEventType::PlayerEnteredRegion,
    GlobalEventType::PlayerLeftRegion,
];

/// Lifecycle state of a manager's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
pub enum ExecutionState {
    #[default]
    Inactive,
    Running,
    Paused,
    Completed,
    Aborted,
}

/// Execution counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExecutionStats {
    /// Number of times a tree has been started, including loop restarts.
    pub starts: u32,
    /// Number of root executions.
    pub ticks: u64,
    /// Wall-clock time spent executing the root.
    pub total_time: Duration,
    pub last_duration: Duration,
}

type EventHandler = Box<dyn FnMut(&GlobalEvent, &mut Blackboard)>;

pub struct Manager {
    name: String,
    config: ManagerConfig,
    blackboard: Blackboard,
    tree: Option<BehaviorTree>,
    default_tree: Option<BehaviorTree>,
    state: ExecutionState,
    current_status: Status,
    accumulator: f32,
    clock: f32,
    rng: StdRng,
    stats: ExecutionStats,
    agent: Box<dyn Agent>,
    movement: Box<dyn MovementService>,
    bus: Option<EventBus>,
    subscriptions: Vec<broadcast::Receiver<GlobalEvent>>,
    on_event: Option<EventHandler>,
    events: broadcast::Sender<ManagerEvent>,
}

impl Manager {
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Subscribes to the bus, seeds the blackboard, and starts the default
    /// tree when `auto_start` is set.
    pub fn begin_play(&mut self) {
        if let Some(bus) = &self.bus {
            let topics = LISTENED_EVENTS.iter().map(|event_type| event_type.topic());
            self.subscriptions = bus
                .subscribe_multiple(topics)
                .into_iter()
                .map(|(_, rx)| rx)
                .collect();
        }

        self.initialize_blackboard();

        if self.config.auto_start
            && let Some(tree) = self.default_tree.take()
            && let Err(err) = self.start(tree)
        {
            tracing::warn!("{}: default tree not started: {}", self.name, err);
        }
    }

    /// Stops the tree and drops every bus subscription.
    ///
    /// The tree that was loaded becomes the default tree, replacing any
    /// default still held, so the next `begin_play` resumes the same routine.
    pub fn end_play(&mut self) {
        if let Some(tree) = self.stop() {
            self.default_tree = Some(tree);
        }
        self.subscriptions.clear();
    }

    /// Loads `tree` and starts a new run, stopping any tree already loaded.
    pub fn start(&mut self, tree: BehaviorTree) -> Result<()> {
        let Some(root) = tree.root() else {
            tracing::warn!("{}: cannot start behavior tree without a root", self.name);
            return Err(ManagerError::MissingRoot);
        };

        if self.tree.is_some() {
            self.stop();
        }

        self.tree = Some(tree);
        self.current_status = Status::Invalid;
        self.accumulator = 0.0;
        self.with_tree(|tree, ctx| tree.initialize(root, ctx));
        self.set_state(ExecutionState::Running);
        self.stats.starts += 1;

        if self.config.debug_mode {
            tracing::debug!("{}: started behavior tree", self.name);
        }
        Ok(())
    }

    /// Ends the current run and hands the tree back.
    pub fn stop(&mut self) -> Option<BehaviorTree> {
        self.wind_down();
        self.current_status = Status::Invalid;
        self.set_state(ExecutionState::Inactive);

        let tree = self.tree.take();
        if tree.is_some() && self.config.debug_mode {
            tracing::debug!("{}: stopped behavior tree", self.name);
        }
        tree
    }

    /// Interrupts the run but keeps the tree loaded for a later restart.
    pub fn abort(&mut self) {
        if !matches!(self.state, ExecutionState::Running | ExecutionState::Paused) {
            return;
        }
        self.wind_down();
        self.current_status = Status::Failure;
        self.set_state(ExecutionState::Aborted);
    }

    pub fn pause(&mut self) -> bool {
        if self.state != ExecutionState::Running {
            return false;
        }
        self.set_state(ExecutionState::Paused);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != ExecutionState::Paused {
            return false;
        }
        self.set_state(ExecutionState::Running);
        true
    }

    /// Stops the loaded tree and starts it again from scratch.
    pub fn restart(&mut self) -> Result<()> {
        let tree = self.stop().ok_or(ManagerError::NoTreeLoaded)?;
        self.start(tree)
    }

    /// Aborts a mid-run root and tears the tree down.
    fn wind_down(&mut self) {
        let Some(root) = self.root() else {
            return;
        };
        let running = self.current_status.is_running();
        self.with_tree(|tree, ctx| {
            if running {
                tree.abort(root, ctx);
            }
            if tree.is_initialized(root) {
                tree.cleanup(root, ctx);
            }
        });
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    /// Advances the manager by `dt` seconds.
    ///
    /// Pending bus events are always handled first. The simulation clock
    /// only moves while the manager is running.
    pub fn advance(&mut self, dt: f32) {
        self.drain_events();

        if self.state != ExecutionState::Running {
            return;
        }
        self.clock += dt;
        self.accumulator += dt;
        if self.accumulator < self.config.update_frequency {
            return;
        }
        self.accumulator = 0.0;
        self.update();
    }

    fn update(&mut self) {
        let Some(root) = self.root() else {
            return;
        };

        let started = Instant::now();
        let status = self
            .with_tree(|tree, ctx| tree.execute(root, ctx))
            .unwrap_or(Status::Failure);
        let elapsed = started.elapsed();

        self.current_status = status;
        self.stats.ticks += 1;
        self.stats.last_duration = elapsed;
        self.stats.total_time += elapsed;

        if status.is_terminal() {
            self.complete(root, status);
        }
    }

    fn complete(&mut self, root: NodeId, status: Status) {
        self.emit(ManagerEvent::TreeCompleted { root, status });
        if self.config.debug_mode {
            tracing::debug!("{}: behavior tree completed with status {}", self.name, status);
        }

        if self.config.loop_tree {
            if let Err(err) = self.restart() {
                tracing::warn!("{}: loop restart failed: {}", self.name, err);
            }
        } else {
            self.with_tree(|tree, ctx| tree.cleanup(root, ctx));
            self.set_state(ExecutionState::Completed);
        }
    }

    fn drain_events(&mut self) {
        let mut pending = Vec::new();
        for rx in &mut self.subscriptions {
            loop {
                match rx.try_recv() {
                    Ok(event) => pending.push(event),
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                    Err(TryRecvError::Lagged(skipped)) => {
                        tracing::warn!("{}: dropped {} bus events", self.name, skipped);
                    }
                }
            }
        }

        for event in pending {
            if LISTENED_EVENTS.contains(&event.event_type) {
                self.handle_event(&event);
            }
        }
    }

    fn handle_event(&mut self, event: &GlobalEvent) {
        if self.config.debug_mode {
            tracing::debug!(
                "{}: received {} from '{}'",
                self.name,
                event.event_type,
                event.source
            );
        }
        if let Some(handler) = self.on_event.as_mut() {
            handler(event, &mut self.blackboard);
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn with_tree<R>(
        &mut self,
        f: impl FnOnce(&mut BehaviorTree, &mut Context<'_>) -> R,
    ) -> Option<R> {
        let tree = self.tree.as_mut()?;
        let mut ctx = Context::new(
            &mut self.blackboard,
            &*self.agent,
            &mut *self.movement,
            &mut self.rng,
            self.clock,
        );
        Some(f(tree, &mut ctx))
    }

    fn set_state(&mut self, state: ExecutionState) {
        if self.state == state {
            return;
        }
        let from = std::mem::replace(&mut self.state, state);
        self.emit(ManagerEvent::StateChanged { from, to: state });

        if self.config.debug_mode {
            tracing::debug!("{}: state changed from {} to {}", self.name, from, state);
        }
    }

    fn emit(&self, event: ManagerEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn publish(&self, event: GlobalEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event.at(self.clock));
        }
    }

    // ------------------------------------------------------------------
    // Blackboard conveniences
    // ------------------------------------------------------------------

    /// Seeds the well-known keys with their defaults.
    pub fn initialize_blackboard(&mut self) {
        let home = self.agent.location();
        let bb = &mut self.blackboard;
        bb.set_target_actor(None);
        bb.set(keys::HOME_LOCATION, home);
        bb.set(keys::CURRENT_PATROL_INDEX, 0);
        bb.set(keys::ALERT_LEVEL, 0.0_f32);
        bb.set(keys::LAST_KNOWN_PLAYER_LOCATION, Vec3::ZERO);
        bb.set(keys::PATROL_POINT_COUNT, 0);
    }

    /// Sets the target actor and announces the change on the bus.
    pub fn set_target(&mut self, target: Option<ObjectRef>) {
        self.blackboard.set_target_actor(target);

        let event = GlobalEvent::new(GlobalEventType::NpcRoutineChanged)
            .from_source(self.name.clone())
            .targeting(target.map(|t| t.to_string()).unwrap_or_default())
            .with_data("Action", "TargetChanged");
        self.publish(event);
    }

    pub fn target(&self) -> Option<ObjectRef> {
        self.blackboard.target_actor()
    }

    pub fn set_home_location(&mut self, location: Vec3) {
        self.blackboard.set(keys::HOME_LOCATION, location);
    }

    pub fn home_location(&self) -> Vec3 {
        self.blackboard.get_vector(keys::HOME_LOCATION, Vec3::ZERO)
    }

    /// Replaces the patrol route and resets the patrol index.
    pub fn set_patrol_points(&mut self, points: &[Vec3]) {
        let previous = self.patrol_point_count();
        for index in points.len()..previous {
            self.blackboard.remove(&keys::patrol_point(index));
        }
        for (index, point) in points.iter().enumerate() {
            self.blackboard.set(keys::patrol_point(index), *point);
        }
        self.blackboard
            .set(keys::PATROL_POINT_COUNT, i32::try_from(points.len()).unwrap_or(i32::MAX));
        self.blackboard.set(keys::CURRENT_PATROL_INDEX, 0);
    }

    pub fn patrol_points(&self) -> Vec<Vec3> {
        (0..self.patrol_point_count())
            .filter_map(|index| {
                let key = keys::patrol_point(index);
                self.blackboard.has(&key).then(|| self.blackboard.get_vector(&key, Vec3::ZERO))
            })
            .collect()
    }

    fn patrol_point_count(&self) -> usize {
        usize::try_from(self.blackboard.get_int(keys::PATROL_POINT_COUNT, 0)).unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ExecutionState::Running
    }

    /// Status returned by the most recent root execution.
    pub fn current_status(&self) -> Status {
        self.current_status
    }

    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Simulation time accumulated while running.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn tree(&self) -> Option<&BehaviorTree> {
        self.tree.as_ref()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.tree.as_ref().and_then(BehaviorTree::root)
    }

    /// Tree `begin_play` would auto-start.
    pub fn default_tree(&self) -> Option<&BehaviorTree> {
        self.default_tree.as_ref()
    }

    pub fn set_default_tree(&mut self, tree: BehaviorTree) {
        self.default_tree = Some(tree);
    }

    pub fn set_update_frequency(&mut self, seconds: f32) {
        self.config.update_frequency = seconds.max(0.0);
    }

    pub fn set_loop(&mut self, loop_tree: bool) {
        self.config.loop_tree = loop_tree;
    }

    pub fn on_event(&mut self, handler: impl FnMut(&GlobalEvent, &mut Blackboard) + 'static) {
        self.on_event = Some(Box::new(handler));
    }

    /// Receiver for this manager's lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Debugging
    // ------------------------------------------------------------------

    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.config.debug_mode = enabled;
        if enabled {
            tracing::debug!("{}: debug mode enabled", self.name);
        }
    }

    pub fn debug_info(&self) -> String {
        let root = self
            .root()
            .and_then(|root| self.tree.as_ref()?.name(root).map(|name| format!("{name} ({root})")))
            .unwrap_or_else(|| "None".to_owned());

        format!(
            "Manager debug info for {}:\n  State: {}\n  Root node: {}\n  Current status: {}\n  Total starts: {}\n  Ticks: {}\n  Total execution time: {:.2?}\n  Last execution time: {:.2?}",
            self.name,
            self.state,
            root,
            self.current_status,
            self.stats.starts,
            self.stats.ticks,
            self.stats.total_time,
            self.stats.last_duration,
        )
    }

    pub fn log_current_state(&self) {
        tracing::debug!("{}", self.debug_info());
        if let Some(tree) = &self.tree {
            tracing::debug!("{}", tree.outline());
        }
        self.blackboard.log_values();
    }
}

/// Builder for [`Manager`].
pub struct ManagerBuilder {
    name: String,
    config: ManagerConfig,
    agent: Option<Box<dyn Agent>>,
    movement: Option<Box<dyn MovementService>>,
    bus: Option<EventBus>,
    default_tree: Option<BehaviorTree>,
    on_event: Option<EventHandler>,
    owner: Option<ObjectRef>,
}

impl ManagerBuilder {
    fn new() -> Self {
        Self {
            name: "NPC".to_owned(),
            config: ManagerConfig::default(),
            agent: None,
            movement: None,
            bus: None,
            default_tree: None,
            on_event: None,
            owner: None,
        }
    }

    /// Name used in logs and as the source of published events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn agent(mut self, agent: impl Agent + 'static) -> Self {
        self.agent = Some(Box::new(agent));
        self
    }

    pub fn movement(mut self, movement: impl MovementService + 'static) -> Self {
        self.movement = Some(Box::new(movement));
        self
    }

    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Tree started by `begin_play` when `auto_start` is set.
    pub fn default_tree(mut self, tree: BehaviorTree) -> Self {
        self.default_tree = Some(tree);
        self
    }

    pub fn on_event(mut self, handler: impl FnMut(&GlobalEvent, &mut Blackboard) + 'static) -> Self {
        self.on_event = Some(Box::new(handler));
        self
    }

    pub fn owner(mut self, owner: ObjectRef) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn build(self) -> Manager {
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (events, _) = broadcast::channel(self.config.event_buffer_size.max(1));
        let mut blackboard = Blackboard::new();
        blackboard.set_owner(self.owner);

        Manager {
            name: self.name,
            config: self.config,
            blackboard,
            tree: None,
            default_tree: self.default_tree,
            state: ExecutionState::Inactive,
            current_status: Status::Invalid,
            accumulator: 0.0,
            clock: 0.0,
            rng,
            stats: ExecutionStats::default(),
            agent: self.agent.unwrap_or_else(|| Box::new(Detached)),
            movement: self.movement.unwrap_or_else(|| Box::new(Detached)),
            bus: self.bus,
            subscriptions: Vec::new(),
            on_event: self.on_event,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use behavior_tree::builder::{leaf, sequence};
    use behavior_tree::{SetBlackboardValue, Wait};

    use super::*;
    use crate::events::Topic;

    fn manager() -> Manager {
        Manager::builder()
            .name("Guard")
            .config(ManagerConfig {
                seed: Some(1),
                ..ManagerConfig::default()
            })
            .build()
    }

    #[test]
    fn blackboard_defaults_are_seeded() {
        let mut m = manager();
        m.begin_play();

        let bb = m.blackboard();
        assert!(bb.has(keys::TARGET_ACTOR_KEY));
        assert_eq!(bb.get_int(keys::CURRENT_PATROL_INDEX, -1), 0);
        assert_eq!(bb.get_float(keys::ALERT_LEVEL, -1.0), 0.0);
        assert_eq!(m.home_location(), Vec3::ZERO);
        assert!(m.patrol_points().is_empty());
    }

    #[test]
    fn patrol_points_round_trip_and_reset_index() {
        let mut m = manager();
        let route = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)];
        m.blackboard_mut().set(keys::CURRENT_PATROL_INDEX, 2);

        m.set_patrol_points(&route);
        assert_eq!(m.patrol_points(), route);
        assert_eq!(m.blackboard().get_int(keys::CURRENT_PATROL_INDEX, -1), 0);

        m.set_patrol_points(&route[..1]);
        assert_eq!(m.patrol_points(), &route[..1]);
        assert!(!m.blackboard().has(&keys::patrol_point(2)));
    }

    #[test]
    fn set_target_publishes_routine_change() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Topic::Npc);
        let mut m = Manager::builder().name("Guard").event_bus(bus).build();

        m.set_target(Some(ObjectRef(9)));

        assert_eq!(m.target(), Some(ObjectRef(9)));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.event_type, GlobalEventType::NpcRoutineChanged);
        assert_eq!(event.source, "Guard");
        assert_eq!(event.target, "Object#9");
        assert_eq!(event.data("Action"), Some("TargetChanged"));
    }

    #[test]
    fn listened_events_reach_handler_with_blackboard() {
        let bus = EventBus::new();
        let mut m = Manager::builder()
            .event_bus(bus.clone())
            .on_event(|event, bb| {
                if event.event_type == GlobalEventType::CombatStarted {
                    bb.set(keys::ALERT_LEVEL, 1.0_f32);
                }
            })
            .build();
        m.begin_play();

        bus.publish(GlobalEvent::new(GlobalEventType::CombatStarted));
        bus.publish(GlobalEvent::new(GlobalEventType::DragonSighted));
        m.advance(0.0);

        assert_eq!(m.blackboard().get_float(keys::ALERT_LEVEL, 0.0), 1.0);
    }

    #[test]
    fn unlistened_events_on_shared_topic_are_ignored() {
        let bus = EventBus::new();
        let mut m = Manager::builder()
            .event_bus(bus.clone())
            .on_event(|_, bb| bb.set("Seen", true))
            .build();
        m.begin_play();

        // Same topic as CombatStarted, but not listened for.
        bus.publish(GlobalEvent::new(GlobalEventType::DragonSighted));
        m.advance(0.0);
        assert!(!m.blackboard().has("Seen"));

        m.end_play();
        bus.publish(GlobalEvent::new(GlobalEventType::CombatEnded));
        m.advance(0.0);
        assert!(!m.blackboard().has("Seen"));
    }

    #[test]
    fn debug_info_names_state_and_root() {
        let mut m = manager();
        m.start(BehaviorTree::from_spec(sequence(vec![
            leaf(SetBlackboardValue::new("Ready", true)),
            leaf(Wait::new(5.0)),
        ])))
        .unwrap();

        let info = m.debug_info();
        assert!(info.contains("State: Running"));
        assert!(info.contains("Root node: Sequence (#0)"));
        assert!(info.contains("Total starts: 1"));
    }

    #[test]
    fn abort_keeps_tree_for_restart() {
        let mut m = manager();
        m.set_update_frequency(0.0);
        m.start(BehaviorTree::from_spec(leaf(Wait::new(5.0)))).unwrap();
        m.advance(0.1);
        assert_eq!(m.current_status(), Status::Running);

        m.abort();
        assert_eq!(m.state(), ExecutionState::Aborted);
        assert!(m.tree().is_some());

        m.restart().unwrap();
        assert_eq!(m.state(), ExecutionState::Running);
        assert_eq!(m.stats().starts, 2);
    }
}

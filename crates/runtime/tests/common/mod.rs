//! Minimal simulated world shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use behavior_tree::{
    Agent, Blackboard, MoveError, MoveRequestId, MoveStatus, MovementService, ObjectRef, Vec3,
};
use npc_runtime::{Manager, ManagerConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOrder {
    pub id: MoveRequestId,
    pub target: Vec3,
    pub acceptance_radius: f32,
}

#[derive(Default)]
pub struct World {
    pub location: Vec3,
    pub objects: HashMap<ObjectRef, Vec3>,
    pub orders: Vec<MoveOrder>,
    pub cancels: Vec<MoveRequestId>,
    /// Polls answered with `Moving` before a request arrives.
    pub travel_polls: u32,
    active: Option<(MoveOrder, u32)>,
}

/// Cloneable handle acting as both the agent and its navigation.
#[derive(Clone, Default)]
pub struct Sim(pub Rc<RefCell<World>>);

impl Sim {
    pub fn at(location: Vec3) -> Self {
        let sim = Self::default();
        sim.0.borrow_mut().location = location;
        sim.0.borrow_mut().travel_polls = 1;
        sim
    }

    pub fn place(&self, object: ObjectRef, location: Vec3) {
        self.0.borrow_mut().objects.insert(object, location);
    }

    pub fn location(&self) -> Vec3 {
        self.0.borrow().location
    }

    pub fn orders(&self) -> Vec<MoveOrder> {
        self.0.borrow().orders.clone()
    }

    pub fn cancels(&self) -> usize {
        self.0.borrow().cancels.len()
    }
}

impl Agent for Sim {
    fn location(&self) -> Vec3 {
        self.0.borrow().location
    }

    fn locate(&self, object: ObjectRef) -> Option<Vec3> {
        self.0.borrow().objects.get(&object).copied()
    }

    fn custom_condition(&self, name: &str, _blackboard: &Blackboard) -> bool {
        name == "AlwaysTrue"
    }
}

impl MovementService for Sim {
    fn request_move(
        &mut self,
        target: Vec3,
        acceptance_radius: f32,
        _use_pathfinding: bool,
    ) -> Result<MoveRequestId, MoveError> {
        let mut world = self.0.borrow_mut();
        let order = MoveOrder {
            id: MoveRequestId(world.orders.len() as u64 + 1),
            target,
            acceptance_radius,
        };
        world.orders.push(order);
        world.active = Some((order, world.travel_polls));
        Ok(order.id)
    }

    fn poll(&self, request: MoveRequestId) -> MoveStatus {
        let mut world = self.0.borrow_mut();
        match world.active {
            Some((order, 0)) if order.id == request => {
                world.location = order.target;
                world.active = None;
                MoveStatus::Arrived
            }
            Some((order, left)) if order.id == request => {
                world.active = Some((order, left - 1));
                MoveStatus::Moving
            }
            _ => MoveStatus::Idle,
        }
    }

    fn cancel(&mut self, request: MoveRequestId) {
        let mut world = self.0.borrow_mut();
        world.cancels.push(request);
        if world.active.is_some_and(|(order, _)| order.id == request) {
            world.active = None;
        }
    }
}

/// Deterministic config ticking on every advance.
pub fn config(loop_tree: bool) -> ManagerConfig {
    ManagerConfig {
        update_frequency: 0.1,
        loop_tree,
        seed: Some(0xDA),
        ..ManagerConfig::default()
    }
}

pub fn manager(sim: &Sim, config: ManagerConfig) -> Manager {
    Manager::builder()
        .name("TestNpc")
        .config(config)
        .agent(sim.clone())
        .movement(sim.clone())
        .build()
}

/// Advances in 0.1s steps until `done` holds or `max_ticks` pass.
pub fn run_until(manager: &mut Manager, max_ticks: usize, done: impl Fn(&Manager) -> bool) -> usize {
    for tick in 1..=max_ticks {
        manager.advance(0.1);
        if done(manager) {
            return tick;
        }
    }
    panic!("condition not reached after {max_ticks} ticks");
}

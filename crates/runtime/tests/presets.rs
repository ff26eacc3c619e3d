mod common;

use behavior_tree::{ObjectRef, Vec3};
use npc_runtime::{ExecutionState, keys, presets};

use common::{Sim, config, manager, run_until};

#[test]
fn patrol_visits_points_in_order() {
    let sim = Sim::at(Vec3::ZERO);
    let route = [Vec3::new(100.0, 0.0, 0.0), Vec3::new(200.0, 0.0, 0.0)];
    let mut m = manager(&sim, config(false));

    m.start(presets::patrol(&route, 0.2)).unwrap();
    run_until(&mut m, 50, |m| m.state() == ExecutionState::Completed);

    let targets: Vec<_> = sim.orders().iter().map(|order| order.target).collect();
    assert_eq!(targets, route);
    assert_eq!(sim.location(), route[1]);
}

#[test]
fn guard_holds_post_until_a_target_is_in_range() {
    let post = Vec3::new(10.0, 0.0, 0.0);
    let intruder = ObjectRef(7);
    let sim = Sim::at(post);
    sim.place(intruder, Vec3::new(300.0, 0.0, 0.0));

    let mut m = manager(&sim, config(true));
    m.begin_play();
    m.start(presets::guard(post, 500.0)).unwrap();

    for _ in 0..5 {
        m.advance(0.1);
    }
    assert_eq!(m.blackboard().get_float(keys::ALERT_LEVEL, -1.0), 0.0);
    assert_eq!(sim.orders()[0].target, post);

    m.set_target(Some(intruder));
    run_until(&mut m, 60, |m| m.blackboard().get_float(keys::ALERT_LEVEL, 0.0) == 1.0);
    m.advance(0.1);

    let chase = sim.orders().last().copied().unwrap();
    assert_eq!(chase.target, Vec3::new(300.0, 0.0, 0.0));
    assert_eq!(chase.acceptance_radius, 50.0);
}

#[test]
fn guard_ignores_targets_outside_radius() {
    let post = Vec3::new(10.0, 0.0, 0.0);
    let sim = Sim::at(post);
    sim.place(ObjectRef(7), Vec3::new(5_000.0, 0.0, 0.0));

    let mut m = manager(&sim, config(true));
    m.begin_play();
    m.set_target(Some(ObjectRef(7)));
    m.start(presets::guard(post, 500.0)).unwrap();

    for _ in 0..60 {
        m.advance(0.1);
    }
    assert_eq!(m.blackboard().get_float(keys::ALERT_LEVEL, -1.0), 0.0);
    assert!(sim.orders().iter().all(|order| order.target == post));
}

#[test]
fn follow_closes_distance_to_target() {
    let leader = ObjectRef(3);
    let sim = Sim::at(Vec3::ZERO);
    sim.place(leader, Vec3::new(1_000.0, 0.0, 0.0));
    let mut m = manager(&sim, config(false));

    m.start(presets::follow(leader, 200.0)).unwrap();
    run_until(&mut m, 30, |m| m.state() == ExecutionState::Completed);

    assert_eq!(m.target(), Some(leader));
    let orders = sim.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].target, Vec3::new(1_000.0, 0.0, 0.0));
    assert_eq!(orders[0].acceptance_radius, 200.0);
}

#[test]
fn follow_stays_put_when_already_close() {
    let leader = ObjectRef(3);
    let sim = Sim::at(Vec3::ZERO);
    sim.place(leader, Vec3::new(50.0, 0.0, 0.0));
    let mut m = manager(&sim, config(false));

    m.start(presets::follow(leader, 200.0)).unwrap();
    run_until(&mut m, 30, |m| m.state() == ExecutionState::Completed);

    assert!(sim.orders().is_empty());
}

//! Ready-made trees for common NPC routines.
//!
//! Each preset is a complete tree composed from the node library:
//!
//! ```text
//! guard(post, radius)
//!   └─ Selector
//!       ├─ Sequence                 ← intruder within radius
//!       │   ├─ HasTarget
//!       │   ├─ DistanceToTarget <= radius
//!       │   ├─ AlertLevel = 1.0
//!       │   └─ MoveTo TargetActor
//!       └─ Sequence                 ← return to post
//!           ├─ AlertLevel = 0.0
//!           ├─ MoveTo post
//!           └─ Wait 2s ± 1s
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let manager = Manager::builder()
//!     .agent(agent)
//!     .movement(navigation)
//!     .default_tree(presets::guard(post, 800.0))
//!     .build();
//! ```

use behavior_tree::builder::{leaf, selector, sequence};
use behavior_tree::{
    BehaviorTree, CheckCondition, ComparisonOperator, MoveTo, ObjectRef, SetBlackboardValue,
    Vec3, Wait,
};

use crate::manager::keys;

/// Walks the points in order, pausing `wait` seconds at each.
///
/// Succeeds after the last pause. With looping enabled on the manager the
/// route repeats from the first point.
pub fn patrol(points: &[Vec3], wait: f32) -> BehaviorTree {
    let steps = points
        .iter()
        .flat_map(|point| [leaf(MoveTo::location(*point)), leaf(Wait::new(wait))])
        .collect();

    BehaviorTree::from_spec(sequence(steps))
}

/// Holds a post and chases targets that come within `radius` of the agent.
///
/// `AlertLevel` is raised to 1.0 while chasing and lowered to 0.0 otherwise.
pub fn guard(location: Vec3, radius: f32) -> BehaviorTree {
    let chase = sequence(vec![
        leaf(CheckCondition::has_target()),
        leaf(CheckCondition::distance(ComparisonOperator::LessOrEqual, radius)),
        leaf(SetBlackboardValue::new(keys::ALERT_LEVEL, 1.0_f32)),
        leaf(MoveTo::actor_key(keys::TARGET_ACTOR_KEY)),
    ]);
    let hold = sequence(vec![
        leaf(SetBlackboardValue::new(keys::ALERT_LEVEL, 0.0_f32)),
        leaf(MoveTo::location(location)),
        leaf(Wait::new(2.0).with_deviation(1.0)),
    ]);

    BehaviorTree::from_spec(selector(vec![chase, hold]))
}

/// Keeps within `distance` of `target`.
pub fn follow(target: ObjectRef, distance: f32) -> BehaviorTree {
    let close_enough = selector(vec![
        leaf(CheckCondition::distance(ComparisonOperator::LessOrEqual, distance)),
        leaf(MoveTo::actor(target).with_acceptance_radius(distance)),
    ]);

    BehaviorTree::from_spec(sequence(vec![
        leaf(SetBlackboardValue::new(keys::TARGET_ACTOR_KEY, target)),
        close_enough,
        leaf(Wait::new(0.5)),
    ]))
}

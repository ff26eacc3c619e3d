//! Builder utilities for ergonomic behavior tree construction.
//!
//! Trees live in an arena, so building one by hand means inserting nodes and
//! wiring ids together. The helpers here describe a tree as nested
//! [`NodeSpec`] values instead; [`BehaviorTree::from_spec`] lays the whole
//! description out in one pass.
//!
//! ```
//! use behavior_tree::builder::{leaf, selector, sequence};
//! use behavior_tree::{BehaviorTree, CheckCondition, MoveTo, Vec3, Wait};
//!
//! let tree = BehaviorTree::from_spec(selector(vec![
//!     sequence(vec![
//!         leaf(CheckCondition::has_target()),
//!         leaf(MoveTo::actor_key("TargetActor")),
//!     ]),
//!     leaf(Wait::new(2.0)),
//! ]));
//! assert_eq!(tree.len(), 5);
//! ```

use crate::composite::{Composite, ParallelPolicy};
use crate::decorator::Decorator;
use crate::leaf::Leaf;
use crate::node::{Node, NodeKind};
use crate::{Behavior, BehaviorTree, Blackboard, NodeId};

/// Description of a node and its subtree, consumed by
/// [`BehaviorTree::from_spec`].
#[derive(Debug)]
pub struct NodeSpec {
    node: Node,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    fn new(node: impl Into<Node>, children: Vec<NodeSpec>) -> Self {
        Self {
            node: node.into(),
            children,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.node.priority = priority;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.node.tags.push(tag.into());
        self
    }

    /// Logs every lifecycle transition of this node at debug level.
    pub fn logged(mut self) -> Self {
        self.node.log_execution = true;
        self
    }
}

impl BehaviorTree {
    /// Builds a tree whose root is the top of `spec`.
    pub fn from_spec(spec: NodeSpec) -> Self {
        let mut tree = Self::new();
        let root = tree.insert_spec(spec);
        tree.root = Some(root);
        tree
    }

    /// Inserts a detached subtree and returns the id of its top node.
    pub fn insert_spec(&mut self, spec: NodeSpec) -> NodeId {
        let NodeSpec { node, children } = spec;
        let id = self.insert(node);

        for child in children {
            let child = self.insert_spec(child);
            let attached = match self.nodes.get_mut(id.index()).map(|n| &mut n.kind) {
                Some(NodeKind::Composite(composite)) => {
                    composite.children.push(child);
                    true
                }
                Some(NodeKind::Decorator(decorator)) if decorator.child.is_none() => {
                    decorator.child = Some(child);
                    true
                }
                _ => false,
            };
            if attached {
                self.link(id, child);
            } else {
                tracing::warn!(parent = %id, child = %child, "node cannot take another child; left detached");
            }
        }
        id
    }
}

/// Creates a sequence node.
#[inline]
pub fn sequence(children: Vec<NodeSpec>) -> NodeSpec {
    composite(Composite::sequence(), children)
}

/// Creates a selector node.
#[inline]
pub fn selector(children: Vec<NodeSpec>) -> NodeSpec {
    composite(Composite::selector(), children)
}

/// Creates a parallel node with the given policies.
#[inline]
pub fn parallel(
    success_policy: ParallelPolicy,
    failure_policy: ParallelPolicy,
    children: Vec<NodeSpec>,
) -> NodeSpec {
    composite(Composite::parallel(success_policy, failure_policy), children)
}

/// Creates a composite node with custom options.
#[inline]
pub fn composite(composite: Composite, children: Vec<NodeSpec>) -> NodeSpec {
    NodeSpec::new(composite, children)
}

/// Runs `child` only while `condition` holds on the blackboard.
#[inline]
pub fn guard(condition: impl Fn(&Blackboard) -> bool + 'static, child: NodeSpec) -> NodeSpec {
    decorator(Decorator::guard(condition), child)
}

/// Creates an inverter node.
#[inline]
pub fn inverter(child: NodeSpec) -> NodeSpec {
    decorator(Decorator::inverter(), child)
}

/// Creates an always-succeed node.
#[inline]
pub fn always_succeed(child: NodeSpec) -> NodeSpec {
    decorator(Decorator::always_succeed(), child)
}

#[inline]
pub fn decorator(decorator: Decorator, child: NodeSpec) -> NodeSpec {
    NodeSpec::new(decorator, vec![child])
}

/// Creates a leaf from any built-in leaf type.
#[inline]
pub fn leaf(leaf: impl Into<Leaf>) -> NodeSpec {
    NodeSpec::new(leaf.into(), Vec::new())
}

/// Creates an action leaf from a custom behavior.
#[inline]
pub fn action(behavior: impl Behavior + 'static) -> NodeSpec {
    leaf(Leaf::action(behavior))
}

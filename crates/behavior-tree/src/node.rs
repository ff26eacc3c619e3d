//! Node definitions stored in a tree's arena.
//!
//! A [`Node`] couples the bookkeeping every node shares (priority, tags,
//! logging flag, per-run state, parent link) with a [`NodeKind`] carrying the
//! kind-specific data. Links between nodes are [`NodeId`] indices into the
//! owning [`BehaviorTree`](crate::BehaviorTree), never references.

use std::fmt;

use crate::composite::Composite;
use crate::decorator::Decorator;
use crate::leaf::Leaf;
use crate::Status;

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Runtime state of a node, scoped to one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeState {
    pub status: Status,
    pub initialized: bool,
    /// Simulation time at which the node was last executed.
    pub last_started_at: Option<f32>,
}

/// The closed set of node kinds.
#[derive(Debug)]
pub enum NodeKind {
    Composite(Composite),
    Decorator(Decorator),
    Leaf(Leaf),
}

/// Payload-free view of [`NodeKind`], used to dispatch without holding a
/// borrow on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Category {
    Composite,
    Decorator,
    Leaf,
}

impl NodeKind {
    pub(crate) fn category(&self) -> Category {
        match self {
            NodeKind::Composite(_) => Category::Composite,
            NodeKind::Decorator(_) => Category::Decorator,
            NodeKind::Leaf(_) => Category::Leaf,
        }
    }

    /// Display name of this kind of node.
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Composite(c) => c.name(),
            NodeKind::Decorator(d) => d.name(),
            NodeKind::Leaf(l) => l.name(),
        }
    }

    /// Human-readable summary of what the node does.
    pub fn description(&self) -> String {
        match self {
            NodeKind::Composite(c) => c.description(),
            NodeKind::Decorator(d) => d.description(),
            NodeKind::Leaf(l) => l.description(),
        }
    }
}

/// A behavior tree node.
#[derive(Debug)]
pub struct Node {
    /// Higher values run first in composites that sort by priority.
    pub priority: i32,
    /// Emit debug logs whenever this node is initialized, executed or aborted.
    pub log_execution: bool,
    /// Free-form labels for queries and debugging.
    pub tags: Vec<String>,
    pub(crate) state: NodeState,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            priority: 0,
            log_execution: false,
            tags: Vec::new(),
            state: NodeState::default(),
            parent: None,
            kind,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn logged(mut self) -> Self {
        self.log_execution = true;
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn description(&self) -> String {
        self.kind.description()
    }
}

impl From<Composite> for Node {
    fn from(value: Composite) -> Self {
        Node::new(NodeKind::Composite(value))
    }
}

impl From<Decorator> for Node {
    fn from(value: Decorator) -> Self {
        Node::new(NodeKind::Decorator(value))
    }
}

impl From<Leaf> for Node {
    fn from(value: Leaf) -> Self {
        Node::new(NodeKind::Leaf(value))
    }
}

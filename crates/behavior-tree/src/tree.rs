//! Arena that owns every node of a behavior tree.
//!
//! Nodes refer to each other through [`NodeId`] indices. Lifecycle operations
//! (`initialize`, `execute`, `abort`, `cleanup`) are dispatched here over the
//! node kind; the per-kind algorithms live next to their data in
//! [`composite`](crate::composite), [`decorator`](crate::decorator) and
//! [`leaf`](crate::leaf).

use std::fmt::Write as _;

use crate::composite::Composite;
use crate::decorator::Decorator;
use crate::error::{Result, TreeError};
use crate::leaf::Leaf;
use crate::node::{Category, Node, NodeKind, NodeState};
use crate::{Blackboard, Context, NodeId, Status};

#[derive(Debug, Default)]
pub struct BehaviorTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: Option<NodeId>,
}

impl BehaviorTree {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Arena
    // ------------------------------------------------------------------

    /// Adds a detached node and returns its id.
    pub fn insert(&mut self, node: impl Into<Node>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node.into());
        id
    }

    pub fn set_root(&mut self, id: NodeId) -> Result<()> {
        let node = self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))?;
        if node.parent.is_some() {
            return Err(TreeError::RootHasParent(id));
        }
        self.root = Some(id);
        Ok(())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn composite(&self, id: NodeId) -> Option<&Composite> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    pub(crate) fn composite_mut(&mut self, id: NodeId) -> Option<&mut Composite> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    pub fn decorator(&self, id: NodeId) -> Option<&Decorator> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Decorator(decorator) => Some(decorator),
            _ => None,
        }
    }

    pub(crate) fn decorator_mut(&mut self, id: NodeId) -> Option<&mut Decorator> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Decorator(decorator) => Some(decorator),
            _ => None,
        }
    }

    pub fn leaf(&self, id: NodeId) -> Option<&Leaf> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Mutable access to a leaf's configuration.
    pub fn leaf_mut(&mut self, id: NodeId) -> Option<&mut Leaf> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Ids of every node carrying `tag`.
    pub fn find_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.has_tag(tag))
            .map(|(index, _)| NodeId(index))
    }

    /// Last status of `id`; `Invalid` for unknown ids.
    pub fn status(&self, id: NodeId) -> Status {
        self.nodes.get(id.0).map(|n| n.state.status).unwrap_or_default()
    }

    pub fn is_initialized(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|n| n.state.initialized)
    }

    pub(crate) fn priority_of(&self, id: NodeId) -> i32 {
        self.nodes.get(id.0).map_or(0, |n| n.priority)
    }

    fn category(&self, id: NodeId) -> Option<Category> {
        self.nodes.get(id.0).map(|n| n.kind.category())
    }

    fn state_mut(&mut self, id: NodeId) -> Option<&mut NodeState> {
        self.nodes.get_mut(id.0).map(|n| &mut n.state)
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Appends `child` to the composite `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.validate_attach(parent, child)?;
        let composite = self
            .composite_mut(parent)
            .ok_or(TreeError::NotComposite(parent))?;
        composite.children.push(child);
        self.link(parent, child);
        Ok(())
    }

    /// Detaches `child` from the composite or decorator `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let node = self.nodes.get_mut(parent.0).ok_or(TreeError::UnknownNode(parent))?;
        let removed = match &mut node.kind {
            NodeKind::Composite(composite) => {
                let before = composite.children.len();
                composite.children.retain(|c| *c != child);
                if let Some(pos) = composite.order.iter().position(|c| *c == child) {
                    composite.order.remove(pos);
                    if pos < composite.cursor {
                        composite.cursor -= 1;
                    }
                }
                composite.children.len() != before
            }
            NodeKind::Decorator(decorator) if decorator.child == Some(child) => {
                decorator.child = None;
                true
            }
            _ => false,
        };

        if !removed {
            return Err(TreeError::NotAChild { parent, child });
        }
        if let Some(node) = self.nodes.get_mut(child.0) {
            node.parent = None;
        }
        Ok(())
    }

    /// Places `child` in the decorator's slot, returning the detached
    /// previous child.
    pub fn set_child(&mut self, decorator: NodeId, child: NodeId) -> Result<Option<NodeId>> {
        if self.decorator(decorator).is_none() {
            return Err(if self.node(decorator).is_some() {
                TreeError::NotDecorator(decorator)
            } else {
                TreeError::UnknownNode(decorator)
            });
        }
        if self.decorator(decorator).and_then(|d| d.child) == Some(child) {
            return Ok(None);
        }
        self.validate_attach(decorator, child)?;

        let previous = self
            .decorator_mut(decorator)
            .and_then(|d| d.child.replace(child));
        if let Some(previous) = previous
            && let Some(node) = self.nodes.get_mut(previous.0)
        {
            node.parent = None;
        }
        self.link(decorator, child);
        Ok(previous)
    }

    fn validate_attach(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_node = self.nodes.get(parent.0).ok_or(TreeError::UnknownNode(parent))?;
        let child_node = self.nodes.get(child.0).ok_or(TreeError::UnknownNode(child))?;
        if let NodeKind::Leaf(_) = parent_node.kind {
            return Err(TreeError::NotComposite(parent));
        }
        if let Some(existing) = child_node.parent {
            return Err(TreeError::AlreadyParented {
                child,
                parent: existing,
            });
        }
        if self.ancestors(parent).any(|id| id == child) {
            return Err(TreeError::Cycle { parent, child });
        }
        Ok(())
    }

    /// Sets the parent link without validation.
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(child.0) {
            node.parent = Some(parent);
        }
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).map(|_| id), |current| self.parent(*current))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Composite(composite)) => &composite.children,
            Some(NodeKind::Decorator(decorator)) => decorator.child.as_slice(),
            _ => &[],
        }
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    /// Topmost ancestor of `id`.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0).map(Node::name)
    }

    pub fn description(&self, id: NodeId) -> Option<String> {
        self.nodes.get(id.0).map(Node::description)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Prepares the subtree under `id` for a new run.
    pub fn initialize(&mut self, id: NodeId, ctx: &mut Context<'_>) {
        let Some(category) = self.category(id) else {
            tracing::warn!(node = %id, "initialize on unknown node");
            return;
        };

        match category {
            Category::Composite => {
                for child in self.children(id).to_vec() {
                    self.initialize(child, ctx);
                }
                self.prepare_composite(id, ctx);
            }
            Category::Decorator => {
                if let Some(child) = self.decorator(id).and_then(|d| d.child) {
                    self.initialize(child, ctx);
                }
            }
            Category::Leaf => {
                if let Some(leaf) = self.leaf_mut(id) {
                    leaf.initialize(ctx);
                }
            }
        }

        if let Some(state) = self.state_mut(id) {
            state.status = Status::Invalid;
            state.initialized = true;
        }
        self.trace(id, "initialized");
    }

    /// Runs one tick of `id`.
    pub fn execute(&mut self, id: NodeId, ctx: &mut Context<'_>) -> Status {
        let Some(node) = self.nodes.get(id.0) else {
            tracing::warn!(node = %id, "execute on unknown node");
            return Status::Failure;
        };
        if !node.state.initialized {
            tracing::debug!(node = %id, name = node.name(), "executing uninitialized node, initializing first");
            self.initialize(id, ctx);
        }

        if let Some(state) = self.state_mut(id)
            && !state.status.is_running()
        {
            state.last_started_at = Some(ctx.now);
        }

        let status = match self.category(id) {
            Some(Category::Composite) => self.execute_composite(id, ctx),
            Some(Category::Decorator) => self.execute_decorator(id, ctx),
            Some(Category::Leaf) => match self.leaf_mut(id) {
                Some(leaf) => leaf.execute(ctx),
                None => Status::Failure,
            },
            None => Status::Failure,
        };

        if let Some(state) = self.state_mut(id) {
            state.status = status;
        }
        self.trace(id, "executed");
        status
    }

    /// Interrupts the active part of the subtree under `id`. Idempotent.
    ///
    /// Only nodes reporting `Running` have their abort hooks invoked, so a
    /// repeated abort leaves finished siblings and external requests alone.
    pub fn abort(&mut self, id: NodeId, ctx: &mut Context<'_>) {
        let Some(category) = self.category(id) else {
            return;
        };

        match category {
            Category::Composite => self.abort_composite(id, ctx),
            Category::Decorator => {
                if let Some(child) = self.decorator(id).and_then(|d| d.child)
                    && self.status(child).is_running()
                {
                    self.abort(child, ctx);
                }
            }
            Category::Leaf => {
                if self.status(id).is_running()
                    && let Some(leaf) = self.leaf_mut(id)
                {
                    leaf.abort(ctx);
                }
            }
        }

        if let Some(state) = self.state_mut(id) {
            state.status = Status::Failure;
        }
        self.trace(id, "aborted");
    }

    /// Tears down the whole subtree under `id` at the end of a run.
    pub fn cleanup(&mut self, id: NodeId, ctx: &mut Context<'_>) {
        let Some(category) = self.category(id) else {
            return;
        };

        for child in self.children(id).to_vec() {
            self.cleanup(child, ctx);
        }
        if category == Category::Leaf
            && let Some(leaf) = self.leaf_mut(id)
        {
            leaf.cleanup(ctx);
        }

        if let Some(state) = self.state_mut(id) {
            state.initialized = false;
        }
        self.trace(id, "cleaned up");
    }

    /// Whether `id`'s guard allows it to run against `blackboard`.
    pub fn can_execute(&self, id: NodeId, blackboard: &Blackboard) -> bool {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Composite(_)) => true,
            Some(NodeKind::Decorator(decorator)) => decorator.check_condition(blackboard),
            Some(NodeKind::Leaf(leaf)) => leaf.can_execute(blackboard),
            None => false,
        }
    }

    fn trace(&self, id: NodeId, what: &str) {
        if let Some(node) = self.nodes.get(id.0)
            && node.log_execution
        {
            tracing::debug!(node = %id, name = node.name(), status = %node.state.status, "{what}");
        }
    }

    // ------------------------------------------------------------------
    // Debugging
    // ------------------------------------------------------------------

    /// Indented rendering of the tree from the root with each node's status.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.write_outline(root, 0, &mut out);
        }
        out
    }

    fn write_outline(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        let _ = writeln!(
            out,
            "{:indent$}{} {} [{}]",
            "",
            id,
            node.name(),
            node.state.status,
            indent = depth * 2
        );
        for child in self.children(id) {
            self.write_outline(*child, depth + 1, out);
        }
    }
}

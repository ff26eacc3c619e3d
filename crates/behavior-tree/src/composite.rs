//! Composite behavior nodes.
//!
//! Composite nodes control the execution flow of multiple child behaviors:
//! [`Sequence`] (AND logic), [`Selector`] (OR logic) and [`Parallel`]
//! (policy-driven logical concurrency).
//!
//! Selector and Sequence keep a cursor into a per-run execution order so a
//! `Running` child is resumed on the next tick without re-visiting earlier
//! children.

use std::cmp::Reverse;

use rand::seq::SliceRandom;

use crate::{BehaviorTree, Context, NodeId, Status};

/// How many children must reach a status for a [`Parallel`] to adopt it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ParallelPolicy {
    RequireOne,
    RequireAll,
}

/// Executes children in order until one succeeds.
///
/// # Semantics
///
/// - If a child returns `Success`, the selector **stops** and returns `Success`
/// - If a child returns `Running`, the selector suspends at that child
/// - If a child returns `Failure`, the selector **continues** with the next child
/// - If all children fail, the selector returns `Failure`
///
/// This is analogous to a short-circuited logical OR (||) operation.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    /// Shuffle the execution order once per run.
    pub randomize_order: bool,
    /// Try the child that succeeded last time first on the next run.
    pub remember_last_success: bool,
    last_success: Option<NodeId>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn randomized(mut self) -> Self {
        self.randomize_order = true;
        self
    }

    pub fn remembering_last_success(mut self) -> Self {
        self.remember_last_success = true;
        self
    }

    /// The child that most recently made this selector succeed.
    pub fn last_success(&self) -> Option<NodeId> {
        self.last_success
    }
}

/// Executes children in order until one fails.
///
/// # Semantics
///
/// - If a child returns `Failure`, the sequence **stops** and returns `Failure`
/// - If a child returns `Running`, the sequence suspends at that child
/// - If a child returns `Success`, the sequence **continues** with the next child
/// - If all children succeed, the sequence returns `Success`
///
/// This is analogous to a short-circuited logical AND (&&) operation.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    /// When interrupted mid-run, resume at the interrupted child on the next
    /// run instead of starting over.
    pub resume_from_running: bool,
    interrupted: bool,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resuming(mut self) -> Self {
        self.resume_from_running = true;
        self
    }
}

/// Executes every unfinished child on every tick.
///
/// The failure policy is checked before the success policy, so failure wins
/// when both are satisfied on the same tick.
#[derive(Debug, Clone)]
pub struct Parallel {
    pub success_policy: ParallelPolicy,
    pub failure_policy: ParallelPolicy,
    child_statuses: Vec<Status>,
}

impl Parallel {
    pub fn new(success_policy: ParallelPolicy, failure_policy: ParallelPolicy) -> Self {
        Self {
            success_policy,
            failure_policy,
            child_statuses: Vec::new(),
        }
    }

    /// Per-child statuses for the current run, in execution order.
    pub fn child_statuses(&self) -> &[Status] {
        &self.child_statuses
    }

    /// Resolves the overall status from the per-child statuses.
    pub fn evaluate(&self, statuses: &[Status]) -> Status {
        let total = statuses.len();
        if total == 0 {
            return Status::Success;
        }

        let successes = statuses.iter().filter(|s| s.is_success()).count();
        let failures = statuses.iter().filter(|s| s.is_failure()).count();

        match self.failure_policy {
            ParallelPolicy::RequireOne if failures >= 1 => return Status::Failure,
            ParallelPolicy::RequireAll if failures == total => return Status::Failure,
            _ => {}
        }
        match self.success_policy {
            ParallelPolicy::RequireOne if successes >= 1 => return Status::Success,
            ParallelPolicy::RequireAll if successes == total => return Status::Success,
            _ => {}
        }

        // Every child finished but neither policy is satisfiable any more.
        if successes + failures == total {
            return Status::Failure;
        }
        Status::Running
    }
}

impl Default for Parallel {
    fn default() -> Self {
        Self::new(ParallelPolicy::RequireAll, ParallelPolicy::RequireOne)
    }
}

/// Control-flow policy of a composite.
#[derive(Debug, Clone)]
pub enum CompositeKind {
    Selector(Selector),
    Sequence(Sequence),
    Parallel(Parallel),
}

/// A node with an ordered list of children.
#[derive(Debug, Clone)]
pub struct Composite {
    pub(crate) kind: CompositeKind,
    pub(crate) children: Vec<NodeId>,
    /// Execution order for the current run.
    pub(crate) order: Vec<NodeId>,
    pub(crate) cursor: usize,
    /// Order children by descending priority at the start of each run.
    pub sort_by_priority: bool,
}

impl Composite {
    pub fn new(kind: CompositeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            order: Vec::new(),
            cursor: 0,
            sort_by_priority: false,
        }
    }

    pub fn selector() -> Self {
        Selector::new().into()
    }

    pub fn sequence() -> Self {
        Sequence::new().into()
    }

    pub fn parallel(success_policy: ParallelPolicy, failure_policy: ParallelPolicy) -> Self {
        Parallel::new(success_policy, failure_policy).into()
    }

    pub fn sorted_by_priority(mut self) -> Self {
        self.sort_by_priority = true;
        self
    }

    pub fn kind(&self) -> &CompositeKind {
        &self.kind
    }

    /// Children in authoring order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Children in the order they run during the current run.
    pub fn execution_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Position in [`execution_order`](Self::execution_order) to resume from.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn name(&self) -> &str {
        match self.kind {
            CompositeKind::Selector(_) => "Selector",
            CompositeKind::Sequence(_) => "Sequence",
            CompositeKind::Parallel(_) => "Parallel",
        }
    }

    pub fn description(&self) -> String {
        match &self.kind {
            CompositeKind::Selector(_) => "Executes children until one succeeds.".to_owned(),
            CompositeKind::Sequence(_) => "Executes children until one fails.".to_owned(),
            CompositeKind::Parallel(p) => format!(
                "Executes all children simultaneously (success: {}, failure: {}).",
                p.success_policy, p.failure_policy
            ),
        }
    }
}

impl From<Selector> for Composite {
    fn from(value: Selector) -> Self {
        Composite::new(CompositeKind::Selector(value))
    }
}

impl From<Sequence> for Composite {
    fn from(value: Sequence) -> Self {
        Composite::new(CompositeKind::Sequence(value))
    }
}

impl From<Parallel> for Composite {
    fn from(value: Parallel) -> Self {
        Composite::new(CompositeKind::Parallel(value))
    }
}

impl BehaviorTree {
    /// Computes the execution order and resets cursors for a new run.
    ///
    /// Children are already initialized when this runs.
    pub(crate) fn prepare_composite(&mut self, id: NodeId, ctx: &mut Context<'_>) {
        let Some(composite) = self.composite(id) else {
            return;
        };
        let mut order = composite.children.clone();
        if composite.sort_by_priority {
            // sort_by_key is stable: equal priorities keep authoring order
            order.sort_by_key(|child| Reverse(self.priority_of(*child)));
        }

        let Some(composite) = self.composite_mut(id) else {
            return;
        };
        match &mut composite.kind {
            CompositeKind::Selector(selector) => {
                if selector.randomize_order {
                    order.shuffle(&mut *ctx.rng);
                }
                if selector.remember_last_success
                    && let Some(last) = selector.last_success
                    && let Some(pos) = order.iter().position(|child| *child == last)
                {
                    let first = order.remove(pos);
                    order.insert(0, first);
                }
                composite.cursor = 0;
            }
            CompositeKind::Sequence(sequence) => {
                let resume = sequence.resume_from_running
                    && sequence.interrupted
                    && composite.cursor < order.len();
                if !resume {
                    composite.cursor = 0;
                }
                sequence.interrupted = false;
            }
            CompositeKind::Parallel(parallel) => {
                parallel.child_statuses = vec![Status::Running; order.len()];
                composite.cursor = 0;
            }
        }
        composite.order = order;
    }

    pub(crate) fn execute_composite(&mut self, id: NodeId, ctx: &mut Context<'_>) -> Status {
        let Some(composite) = self.composite(id) else {
            return Status::Failure;
        };
        match composite.kind {
            CompositeKind::Selector(_) => self.execute_selector(id, ctx),
            CompositeKind::Sequence(_) => self.execute_sequence(id, ctx),
            CompositeKind::Parallel(_) => self.execute_parallel(id, ctx),
        }
    }

    fn execute_selector(&mut self, id: NodeId, ctx: &mut Context<'_>) -> Status {
        loop {
            let Some(child) = self.current_child(id) else {
                break;
            };

            match self.execute_guarded(child, ctx) {
                Status::Success => {
                    if let Some(composite) = self.composite_mut(id) {
                        composite.cursor = 0;
                        if let CompositeKind::Selector(selector) = &mut composite.kind
                            && selector.remember_last_success
                        {
                            selector.last_success = Some(child);
                        }
                    }
                    return Status::Success; // Short-circuit
                }
                Status::Running => return Status::Running,
                _ => self.advance_cursor(id), // Try next child
            }
        }

        // All children failed
        if let Some(composite) = self.composite_mut(id) {
            composite.cursor = 0;
        }
        Status::Failure
    }

    fn execute_sequence(&mut self, id: NodeId, ctx: &mut Context<'_>) -> Status {
        loop {
            let Some(child) = self.current_child(id) else {
                break;
            };

            match self.execute_guarded(child, ctx) {
                Status::Success => self.advance_cursor(id), // Move to next child
                Status::Running => return Status::Running,
                _ => {
                    self.reset_sequence(id);
                    return Status::Failure; // Short-circuit
                }
            }
        }

        // All children succeeded
        self.reset_sequence(id);
        Status::Success
    }

    fn execute_parallel(&mut self, id: NodeId, ctx: &mut Context<'_>) -> Status {
        let Some(composite) = self.composite(id) else {
            return Status::Failure;
        };
        let CompositeKind::Parallel(parallel) = &composite.kind else {
            return Status::Failure;
        };
        let children = composite.order.clone();
        let mut statuses = parallel.child_statuses.clone();
        statuses.resize(children.len(), Status::Running);

        for (child, status) in children.iter().zip(statuses.iter_mut()) {
            if status.is_terminal() {
                continue;
            }
            *status = self.execute_guarded(*child, ctx);
        }

        let result = match self.composite(id).map(|c| &c.kind) {
            Some(CompositeKind::Parallel(parallel)) => parallel.evaluate(&statuses),
            _ => Status::Failure,
        };

        if result.is_terminal() {
            // Children still running lose the race and are cancelled.
            for (child, status) in children.iter().zip(statuses.iter()) {
                if status.is_running() {
                    self.abort(*child, ctx);
                }
            }
            statuses.iter_mut().for_each(|s| *s = Status::Running);
        }

        if let Some(composite) = self.composite_mut(id)
            && let CompositeKind::Parallel(parallel) = &mut composite.kind
        {
            parallel.child_statuses = statuses;
        }
        result
    }

    /// Aborts the active part of a composite's subtree.
    ///
    /// Selector and Sequence abort only the running child under the cursor;
    /// Parallel aborts every running child.
    pub(crate) fn abort_composite(&mut self, id: NodeId, ctx: &mut Context<'_>) {
        let Some(composite) = self.composite(id) else {
            return;
        };
        let targets: Vec<NodeId> = match composite.kind {
            CompositeKind::Parallel(_) if composite.order.is_empty() => composite.children.clone(),
            CompositeKind::Parallel(_) => composite.order.clone(),
            _ => composite.order.get(composite.cursor).copied().into_iter().collect(),
        };

        // Finished or never-started children have nothing to interrupt.
        for child in targets {
            if self.status(child).is_running() {
                self.abort(child, ctx);
            }
        }

        let Some(composite) = self.composite_mut(id) else {
            return;
        };
        match &mut composite.kind {
            CompositeKind::Selector(_) => composite.cursor = 0,
            CompositeKind::Sequence(sequence) => {
                if sequence.resume_from_running && composite.cursor < composite.order.len() {
                    sequence.interrupted = true;
                } else {
                    composite.cursor = 0;
                    sequence.interrupted = false;
                }
            }
            CompositeKind::Parallel(parallel) => {
                parallel.child_statuses.iter_mut().for_each(|s| *s = Status::Running);
            }
        }
    }

    /// Executes `child` unless its guard rejects it, which counts as failure.
    fn execute_guarded(&mut self, child: NodeId, ctx: &mut Context<'_>) -> Status {
        if self.can_execute(child, ctx.blackboard) {
            self.execute(child, ctx)
        } else {
            Status::Failure
        }
    }

    fn current_child(&self, id: NodeId) -> Option<NodeId> {
        self.composite(id)
            .and_then(|c| c.order.get(c.cursor).copied())
    }

    fn advance_cursor(&mut self, id: NodeId) {
        if let Some(composite) = self.composite_mut(id) {
            composite.cursor += 1;
        }
    }

    fn reset_sequence(&mut self, id: NodeId) {
        if let Some(composite) = self.composite_mut(id) {
            composite.cursor = 0;
            if let CompositeKind::Sequence(sequence) = &mut composite.kind {
                sequence.interrupted = false;
            }
        }
    }
}

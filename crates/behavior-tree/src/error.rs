//! Errors raised while editing a tree's structure.
//!
//! Execution never produces errors: misconfigured nodes report
//! `Status::Failure` instead. These errors only surface from the arena
//! editing API on [`BehaviorTree`](crate::BehaviorTree).

use crate::NodeId;

pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0} does not exist in this tree")]
    UnknownNode(NodeId),

    #[error("node {0} is not a composite")]
    NotComposite(NodeId),

    #[error("node {0} is not a decorator")]
    NotDecorator(NodeId),

    #[error("node {child} already has parent {parent}")]
    AlreadyParented { child: NodeId, parent: NodeId },

    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("root node {0} must not have a parent")]
    RootHasParent(NodeId),
}

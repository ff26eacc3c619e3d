//! Status returned by behavior nodes.

/// The result of executing a behavior node for one tick.
///
/// # Tick Semantics
///
/// Nodes may span several ticks:
/// - Conditions and blackboard writes resolve immediately
/// - Actions such as movement or waiting report `Running` until they finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
pub enum Status {
    /// The node completed successfully.
    Success,

    /// The node failed, or was aborted.
    Failure,

    /// The node has not finished yet and wants to be ticked again.
    Running,

    /// The node has not been executed during the current run.
    #[default]
    Invalid,
}

impl Status {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    /// Returns `true` if this status is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    /// Returns `true` for `Success` and `Failure`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Failure)
    }

    /// Inverts the status: Success becomes Failure and vice versa.
    ///
    /// `Running` and `Invalid` pass through unchanged.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            other => other,
        }
    }
}

//! Errors surfaced by the manager API.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ManagerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    #[error("behavior tree has no root node")]
    MissingRoot,

    #[error("no behavior tree is loaded")]
    NoTreeLoaded,
}

/*
    error.rs - Error types for the hierarchy

    Covers:
    - Stale or unknown handles
    - Capacity exhaustion (the arena's stand-in for allocation failure)
    - Misuse of the attach/detach protocol
*/

use super::types::{ListId, NodeId};
use thiserror::Error;

/// Errors produced by hierarchy operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// Handle refers to a destroyed or never-allocated node
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// Handle refers to a removed or never-allocated list
    #[error("Unknown list: {0}")]
    UnknownList(ListId),

    /// The arena reached its configured size
    #[error("Capacity exhausted: at most {limit} {kind} may be live")]
    CapacityExhausted { kind: &'static str, limit: usize },

    /// Names must be non-empty and may not collide with the snapshot metadata key
    #[error("Invalid node name: '{0}'")]
    InvalidName(String),

    #[error("Node {0} is already attached to a list")]
    AlreadyAttached(NodeId),

    #[error("Node {0} is not attached to any list")]
    Detached(NodeId),

    /// Node is attached, but to another list than the one given
    #[error("Node {node} is not a member of {list}")]
    NotInList { node: NodeId, list: ListId },

    #[error("List {0} is empty")]
    EmptyList(ListId),

    #[error("Name '{name}' already exists in {list}")]
    DuplicateName { list: ListId, name: String },

    /// Attaching would place a node beneath itself
    #[error("Attaching {node} to {list} would create a cycle")]
    CycleDetected { node: NodeId, list: ListId },

    #[error("Hierarchy depth limit of {0} exceeded")]
    DepthExceeded(usize),

    #[error("Node {0} still has attached sub-groups or members")]
    HasChildren(NodeId),

    #[error("List {list} still holds {len} nodes")]
    ListNotEmpty { list: ListId, len: usize },

    /// Child lists live and die with their owning node
    #[error("List {list} is owned by {owner}")]
    OwnedList { list: ListId, owner: NodeId },

    #[error("Ring of {list} is corrupted: {reason}")]
    RingCorrupted { list: ListId, reason: String },
}

/// Result type for hierarchy operations
pub type HierarchyResult<T> = Result<T, HierarchyError>;

impl HierarchyError {
    /// True for errors caused by a handle outliving its slot
    pub fn is_stale_handle(&self) -> bool {
        matches!(self, HierarchyError::UnknownNode(_) | HierarchyError::UnknownList(_))
    }
}

//! Handle and mode definitions for the hierarchy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node slot in the hierarchy arena
///
/// The generation distinguishes a live node from an earlier occupant of the
/// same slot, so a handle kept past `destroy` is rejected instead of aliasing
/// a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        NodeId { index, generation }
    }

    /// Slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}v{}", self.index, self.generation)
    }
}

/// Handle to a list slot in the hierarchy arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ListId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        ListId { index, generation }
    }

    /// Slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "list#{}v{}", self.index, self.generation)
    }
}

/// Which ring members a `map` call visits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapMode {
    /// Only the starting node
    SelfOnly,
    /// Every node of the ring, starting at the given node
    All,
    /// Every node of the ring except the starting node
    Others,
    /// Members of every group in the ring and, depth first, of all sub-groups
    Recursive,
}

impl MapMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapMode::SelfOnly => "self",
            MapMode::All => "all",
            MapMode::Others => "other",
            MapMode::Recursive => "recur",
        }
    }
}

impl fmt::Display for MapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which lock an operation had to wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTarget {
    List(ListId),
    Node(NodeId),
}

impl fmt::Display for LockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockTarget::List(id) => write!(f, "{}", id),
            LockTarget::Node(id) => write!(f, "{}", id),
        }
    }
}

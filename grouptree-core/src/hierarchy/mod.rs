//! Hierarchical concurrent membership structure
//!
//! A `Hierarchy` stores groups as nodes linked into circular doubly-linked
//! rings. Every node owns two lists: its sub-groups and its members, so the
//! whole structure is a tree of rings.
//!
//! # Architecture
//!
//! - `arena`: generational slot storage; handles are `NodeId` / `ListId`
//! - `locking`: the single place the lock acquisition order lives
//! - `lifecycle`: `create`, `new_list`, `append`, `pop`, `destroy`
//! - `traversal`: `map`, `get`, `find`
//! - `tree`: `TreeSnapshot` and the branch-glyph renderer
//! - `observer`: hooks for structural events, `tracing` by default
//!
//! # Concurrency
//!
//! `append` and `pop` are atomic with respect to ring integrity. Each takes the
//! list lock first and then the node locks around the splice point, always in
//! the same order. Traversals take no list locks; wrap them in
//! `Hierarchy::with_list_locked` when a stable view is needed.

mod arena;
pub mod error;
mod lifecycle;
mod locking;
mod manager;
pub mod observer;
mod traversal;
mod tree;
pub mod types;

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod lifecycle_tests;
#[cfg(test)]
#[path = "tests/traversal_tests.rs"]
mod traversal_tests;
#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tree_tests;
#[cfg(test)]
#[path = "tests/ring_properties.rs"]
mod ring_properties;

pub use error::{HierarchyError, HierarchyResult};
pub use manager::{Hierarchy, NodeRef};
pub use observer::{
    HierarchyObserver, NoopObserver, ObservedEvent, RecordingObserver, TracingObserver,
};
pub use tree::{TreeEntry, TreeSnapshot};
pub use types::{ListId, LockTarget, MapMode, NodeId};

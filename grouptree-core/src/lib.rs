//! grouptree - hierarchical concurrent membership structure
//!
//! Groups (channels) are nodes linked into circular sibling rings. Every node
//! owns a list of sub-groups and a list of members, so the whole structure is a
//! tree of rings. Insertion and removal are safe under concurrent callers thanks
//! to a fixed per-list/per-node lock ordering.
//!
//! ## Modules
//!
//! - **`hierarchy`**: the arena, lifecycle manager (`create`, `append`, `pop`),
//!   traversal engine (`map`, `get`, `tree`) and observer hooks.
//! - **`config`**: environment and TOML based configuration.
//! - **`logging`**: `tracing` subscriber setup.
//! - **`metrics`**: metric descriptions and an in-process collector.

pub mod config;
pub mod hierarchy;
pub mod logging;
pub mod metrics;

#[cfg(test)]
pub mod test_utils;

pub use config::{Config, ConfigError, HierarchyConfig};
pub use hierarchy::{
    Hierarchy, HierarchyError, HierarchyObserver, HierarchyResult, ListId, MapMode, NodeId,
    NodeRef, TracingObserver, TreeEntry, TreeSnapshot,
};
pub use logging::{init_logging, LogLevel};

//! Test fixtures for creating common hierarchy shapes

use crate::config::HierarchyConfig;
use crate::hierarchy::{Hierarchy, ListId, NodeId, RecordingObserver};
use std::sync::Arc;
use std::time::Duration;

/// Config used by most tests: small limits, tracing of tree lines on
pub fn test_config() -> HierarchyConfig {
    HierarchyConfig {
        max_nodes: 1024,
        max_lists: 64,
        max_depth: 8,
        unique_names: true,
        trace_tree: true,
        contention_warn_after: Duration::from_millis(50),
    }
}

/// Hierarchy with a recording observer attached
pub fn recording_hierarchy() -> (Hierarchy<u32>, Arc<RecordingObserver>) {
    recording_hierarchy_with(test_config())
}

pub fn recording_hierarchy_with(config: HierarchyConfig) -> (Hierarchy<u32>, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::new());
    let hierarchy = Hierarchy::with_observer(config, observer.clone());
    (hierarchy, observer)
}

/// Create one node per name (payload = position) and append them to `list`
pub fn append_named(hierarchy: &Hierarchy<u32>, list: ListId, names: &[&str]) -> Vec<NodeId> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let node = hierarchy.create(*name, i as u32).unwrap();
            hierarchy.append(list, node).unwrap();
            node
        })
        .collect()
}

/// New root list holding one node per name
pub fn list_of(hierarchy: &Hierarchy<u32>, names: &[&str]) -> (ListId, Vec<NodeId>) {
    let list = hierarchy.new_list().unwrap();
    let nodes = append_named(hierarchy, list, names);
    (list, nodes)
}

/// Builder for nested group layouts
///
/// ```ignore
/// GroupBuilder::new("g1").users(&["alice"]).child(GroupBuilder::new("g1a"))
/// ```
pub struct GroupBuilder {
    name: String,
    users: Vec<String>,
    children: Vec<GroupBuilder>,
}

impl GroupBuilder {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), users: Vec::new(), children: Vec::new() }
    }

    pub fn users(mut self, users: &[&str]) -> Self {
        self.users.extend(users.iter().map(|user| user.to_string()));
        self
    }

    pub fn child(mut self, child: GroupBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Create the group, its members and its sub-groups, then attach it to `list`
    pub fn build(self, hierarchy: &Hierarchy<u32>, list: ListId) -> NodeId {
        let group = hierarchy.create(self.name, 0).unwrap();
        let handle = hierarchy.node(group).unwrap();
        for user in self.users {
            let member = hierarchy.create(user, 0).unwrap();
            hierarchy.append(handle.users(), member).unwrap();
        }
        for child in self.children {
            child.build(hierarchy, handle.sublist());
        }
        hierarchy.append(list, group).unwrap();
        group
    }
}

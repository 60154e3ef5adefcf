//! Assertions over ring structure

use crate::hierarchy::{Hierarchy, ListId, NodeId};

/// Names of the members of `list`, in ring order from the head
pub fn ring_names<T>(hierarchy: &Hierarchy<T>, list: ListId) -> Vec<String> {
    hierarchy
        .members(list)
        .unwrap()
        .into_iter()
        .map(|id| hierarchy.node(id).unwrap().name().to_string())
        .collect()
}

/// Assert `list` is a well-formed ring holding exactly `expected`, in order
pub fn assert_ring<T>(hierarchy: &Hierarchy<T>, list: ListId, expected: &[&str]) {
    if let Err(e) = hierarchy.verify_list(list) {
        panic!("Ring of {} is broken: {}", list, e);
    }
    assert_eq!(hierarchy.len(list).unwrap(), expected.len(), "len of {}", list);
    assert_eq!(ring_names(hierarchy, list), expected, "members of {}", list);
}

/// Assert `node` is allocated but linked nowhere
pub fn assert_detached<T>(hierarchy: &Hierarchy<T>, node: NodeId) {
    let node = hierarchy.node(node).unwrap();
    assert!(!node.is_attached(), "{} is still attached", node.id());
    assert_eq!(node.superlist(), None);
    assert_eq!(node.next(), None);
    assert_eq!(node.prev(), None);
}

//! Generational slot storage for nodes and lists
//!
//! Slot tables are guarded by `RwLock`s that are only held for lookups,
//! inserts and removals, never while a list or node lock is awaited. Each slot
//! is handed out as an `Arc`, so an operation that already looked a node up
//! keeps a valid object even if the slot is freed concurrently; the retired
//! flag in the node's links tells it the node is gone.

use super::error::{HierarchyError, HierarchyResult};
use super::types::{ListId, NodeId};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Ring links of a node, guarded by the node's lock
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Links {
    pub next: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub superlist: Option<ListId>,
    pub attached: bool,
    /// Set once by `destroy`; a retired node can never be linked again
    pub retired: bool,
}

impl Links {
    pub fn clear(&mut self) {
        self.next = None;
        self.prev = None;
        self.superlist = None;
        self.attached = false;
    }
}

pub(crate) struct NodeSlot<T> {
    pub id: NodeId,
    pub name: String,
    pub data: T,
    pub sublist: ListId,
    pub users: ListId,
    pub links: Arc<Mutex<Links>>,
}

impl<T> NodeSlot<T> {
    /// Copy of the links taken under the node lock
    pub fn links(&self) -> Links {
        *self.links.lock()
    }
}

/// Head and length of a list, guarded by the list lock
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListState {
    pub head: Option<NodeId>,
    pub len: usize,
    /// Set when the list is freed; appends to a closed list are refused
    pub closed: bool,
}

pub(crate) struct ListSlot {
    pub id: ListId,
    /// Node owning this list as its sublist or users list; `None` for roots
    pub owner: Option<NodeId>,
    pub state: Arc<Mutex<ListState>>,
}

impl ListSlot {
    pub fn snapshot(&self) -> ListState {
        *self.state.lock()
    }
}

struct Entry<S> {
    generation: u32,
    value: Option<Arc<S>>,
}

/// Vector of generational slots with a free list
struct SlotTable<S> {
    entries: Vec<Entry<S>>,
    free: Vec<u32>,
    live: usize,
}

impl<S> SlotTable<S> {
    fn new() -> Self {
        SlotTable { entries: Vec::new(), free: Vec::new(), live: 0 }
    }

    /// Index and generation the next insert will use
    fn peek(&self) -> (u32, u32) {
        match self.free.last() {
            Some(&index) => (index, self.entries[index as usize].generation),
            None => (self.entries.len() as u32, 0),
        }
    }

    fn insert(&mut self, value: S) -> Arc<S> {
        let value = Arc::new(value);
        match self.free.pop() {
            Some(index) => {
                self.entries[index as usize].value = Some(value.clone());
            }
            None => {
                self.entries.push(Entry { generation: 0, value: Some(value.clone()) });
            }
        }
        self.live += 1;
        value
    }

    fn get(&self, index: u32, generation: u32) -> Option<Arc<S>> {
        let entry = self.entries.get(index as usize)?;
        if entry.generation != generation {
            return None;
        }
        entry.value.clone()
    }

    fn remove(&mut self, index: u32, generation: u32) -> Option<Arc<S>> {
        let entry = self.entries.get_mut(index as usize)?;
        if entry.generation != generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index);
        self.live -= 1;
        Some(value)
    }

    fn len(&self) -> usize {
        self.live
    }
}

pub(crate) struct Arena<T> {
    nodes: RwLock<SlotTable<NodeSlot<T>>>,
    lists: RwLock<SlotTable<ListSlot>>,
    root_lists: AtomicUsize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            nodes: RwLock::new(SlotTable::new()),
            lists: RwLock::new(SlotTable::new()),
            root_lists: AtomicUsize::new(0),
        }
    }

    pub fn node(&self, id: NodeId) -> HierarchyResult<Arc<NodeSlot<T>>> {
        self.nodes.read().get(id.index, id.generation).ok_or(HierarchyError::UnknownNode(id))
    }

    pub fn list(&self, id: ListId) -> HierarchyResult<Arc<ListSlot>> {
        self.lists.read().get(id.index, id.generation).ok_or(HierarchyError::UnknownList(id))
    }

    /// Allocate a detached node together with its sublist and users list
    pub fn insert_node(
        &self,
        name: String,
        data: T,
        max_nodes: usize,
    ) -> HierarchyResult<Arc<NodeSlot<T>>> {
        // Table lock order: nodes, then lists.
        let mut nodes = self.nodes.write();
        if nodes.len() >= max_nodes {
            return Err(HierarchyError::CapacityExhausted { kind: "nodes", limit: max_nodes });
        }
        let (index, generation) = nodes.peek();
        let id = NodeId::new(index, generation);

        let (sublist, users) = {
            let mut lists = self.lists.write();
            let sublist = Self::push_list(&mut lists, Some(id));
            let users = Self::push_list(&mut lists, Some(id));
            (sublist, users)
        };

        Ok(nodes.insert(NodeSlot {
            id,
            name,
            data,
            sublist,
            users,
            links: Arc::new(Mutex::new(Links::default())),
        }))
    }

    pub fn insert_root_list(&self, max_lists: usize) -> HierarchyResult<Arc<ListSlot>> {
        let mut lists = self.lists.write();
        if self.root_lists.load(Ordering::Acquire) >= max_lists {
            return Err(HierarchyError::CapacityExhausted { kind: "root lists", limit: max_lists });
        }
        let id = Self::push_list(&mut lists, None);
        self.root_lists.fetch_add(1, Ordering::AcqRel);
        lists.get(id.index, id.generation).ok_or(HierarchyError::UnknownList(id))
    }

    fn push_list(lists: &mut SlotTable<ListSlot>, owner: Option<NodeId>) -> ListId {
        let (index, generation) = lists.peek();
        let id = ListId::new(index, generation);
        lists.insert(ListSlot { id, owner, state: Arc::new(Mutex::new(ListState::default())) });
        id
    }

    /// Free a node slot and both of its child lists
    pub fn remove_node(&self, slot: &NodeSlot<T>) -> HierarchyResult<()> {
        let mut nodes = self.nodes.write();
        nodes
            .remove(slot.id.index, slot.id.generation)
            .ok_or(HierarchyError::UnknownNode(slot.id))?;
        let mut lists = self.lists.write();
        lists.remove(slot.sublist.index, slot.sublist.generation);
        lists.remove(slot.users.index, slot.users.generation);
        Ok(())
    }

    pub fn remove_root_list(&self, id: ListId) -> HierarchyResult<()> {
        let mut lists = self.lists.write();
        lists.remove(id.index, id.generation).ok_or(HierarchyError::UnknownList(id))?;
        self.root_lists.fetch_sub(1, Ordering::AcqRel);
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }

    /// Live lists, child lists included
    pub fn list_count(&self) -> usize {
        self.lists.read().len()
    }

    pub fn root_list_count(&self) -> usize {
        self.root_lists.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_insert_creates_child_lists() {
        let arena: Arena<u32> = Arena::new();
        let slot = arena.insert_node("room1".into(), 7, 10).unwrap();

        assert_eq!(slot.name, "room1");
        assert_eq!(slot.data, 7);
        assert_eq!(arena.node_count(), 1);
        assert_eq!(arena.list_count(), 2);

        let sublist = arena.list(slot.sublist).unwrap();
        let users = arena.list(slot.users).unwrap();
        assert_eq!(sublist.owner, Some(slot.id));
        assert_eq!(users.owner, Some(slot.id));
        assert_eq!(sublist.snapshot(), ListState::default());
        assert_eq!(slot.links(), Links::default());
    }

    #[test]
    fn test_removed_slot_rejects_stale_handle() {
        let arena: Arena<()> = Arena::new();
        let slot = arena.insert_node("a".into(), (), 10).unwrap();
        let stale = slot.id;
        let stale_users = slot.users;

        arena.remove_node(&slot).unwrap();
        assert_eq!(arena.node(stale).err(), Some(HierarchyError::UnknownNode(stale)));
        assert_eq!(arena.list(stale_users).err(), Some(HierarchyError::UnknownList(stale_users)));

        // The slot is reused under a new generation
        let reused = arena.insert_node("b".into(), (), 10).unwrap();
        assert_eq!(reused.id.index, stale.index);
        assert_ne!(reused.id.generation, stale.generation);
        assert!(arena.node(stale).is_err());
        assert_eq!(arena.node(reused.id).unwrap().name, "b");
    }

    #[test]
    fn test_node_capacity() {
        let arena: Arena<()> = Arena::new();
        arena.insert_node("a".into(), (), 2).unwrap();
        arena.insert_node("b".into(), (), 2).unwrap();
        let err = arena.insert_node("c".into(), (), 2).err().unwrap();
        assert_eq!(err, HierarchyError::CapacityExhausted { kind: "nodes", limit: 2 });
    }

    #[test]
    fn test_root_list_capacity_ignores_child_lists() {
        let arena: Arena<()> = Arena::new();
        arena.insert_node("a".into(), (), 10).unwrap();
        let root = arena.insert_root_list(1).unwrap();
        assert_eq!(root.owner, None);
        assert_eq!(arena.root_list_count(), 1);
        assert!(arena.insert_root_list(1).is_err());

        arena.remove_root_list(root.id).unwrap();
        assert_eq!(arena.root_list_count(), 0);
        assert!(arena.insert_root_list(1).is_ok());
    }

    #[test]
    fn test_links_clear_keeps_retired_flag() {
        let mut links = Links {
            next: Some(NodeId::new(1, 0)),
            prev: Some(NodeId::new(1, 0)),
            superlist: Some(ListId::new(0, 0)),
            attached: true,
            retired: true,
        };
        links.clear();
        assert_eq!(links.next, None);
        assert_eq!(links.superlist, None);
        assert!(!links.attached);
        assert!(links.retired);
    }
}

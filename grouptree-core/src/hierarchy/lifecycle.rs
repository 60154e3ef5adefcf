//! Lifecycle manager: creating, attaching, detaching and destroying nodes

use super::arena::{ListSlot, NodeSlot};
use super::error::{HierarchyError, HierarchyResult};
use super::locking::{SpliceLocks, UnlinkLocks};
use super::manager::Hierarchy;
use super::types::{ListId, NodeId};

/// Key reserved for node metadata in tree snapshots
pub(crate) const META_KEY: &str = ".";

impl<T> Hierarchy<T> {
    /// Allocate a detached node with empty sub-group and member lists
    ///
    /// Fails with `CapacityExhausted` once `max_nodes` nodes are live.
    pub fn create(&self, name: impl Into<String>, data: T) -> HierarchyResult<NodeId> {
        let name = name.into();
        if name.is_empty() || name == META_KEY {
            return Err(HierarchyError::InvalidName(name));
        }
        let slot = self.arena.insert_node(name, data, self.config.max_nodes)?;
        self.metrics.inc_nodes_created(self.arena.node_count());
        self.observer.node_created(slot.id, &slot.name);
        Ok(slot.id)
    }

    /// Allocate an empty root list (level 0)
    pub fn new_list(&self) -> HierarchyResult<ListId> {
        let slot = self.arena.insert_root_list(self.config.max_lists)?;
        self.observer.list_created(slot.id);
        Ok(slot.id)
    }

    /// Attach `node` at the tail of `list` (just before the head)
    pub fn append(&self, list: ListId, node: NodeId) -> HierarchyResult<NodeId> {
        let list_slot = self.arena.list(list)?;
        let node_slot = self.arena.node(node)?;

        // Checks and splice happen under one topology guard, so two appends
        // can never nest groups under each other.
        let (_shared, _exclusive) = match list_slot.owner {
            Some(_) => (None, Some(self.topology.write())),
            None => (Some(self.topology.read()), None),
        };
        let level = self.ancestry(&list_slot, Some(node))?;
        if level + self.subtree_height(&node_slot)? > self.config.max_depth {
            return Err(HierarchyError::DepthExceeded(self.config.max_depth));
        }

        let locker = self.locker();
        let mut state = locker.list(&list_slot);
        if state.closed {
            return Err(HierarchyError::UnknownList(list));
        }
        if self.config.unique_names {
            self.check_unique(&list_slot, state.head, state.len, &node_slot)?;
        }

        let mut links = locker.node(&node_slot);
        if links.retired {
            return Err(HierarchyError::UnknownNode(node));
        }
        if links.attached {
            return Err(HierarchyError::AlreadyAttached(node));
        }

        let len = match state.head {
            None => {
                links.next = Some(node);
                links.prev = Some(node);
                links.superlist = Some(list);
                links.attached = true;
                state.head = Some(node);
                state.len += 1;
                let len = state.len;
                drop(links);
                drop(state);
                len
            }
            Some(first) => {
                let locks = SpliceLocks::acquire(&locker, &self.arena, list, links, first)?;
                state.len += 1;
                let len = state.len;
                drop(state);
                locks.splice(list, node);
                len
            }
        };

        self.metrics.inc_appends();
        self.observer.appended(list, node, len);
        Ok(node)
    }

    /// Reject `node` if a sibling in the ring already carries its name
    ///
    /// Runs under the list lock, so `len` is exact.
    fn check_unique(
        &self,
        list_slot: &ListSlot,
        head: Option<NodeId>,
        len: usize,
        node_slot: &NodeSlot<T>,
    ) -> HierarchyResult<()> {
        let Some(head) = head else {
            return Ok(());
        };
        for sibling in self.ring_from(head).take(len) {
            let sibling = sibling?;
            if sibling.id != node_slot.id && sibling.name == node_slot.name {
                return Err(HierarchyError::DuplicateName {
                    list: list_slot.id,
                    name: node_slot.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Detach `node` from `list`
    ///
    /// Returns `Ok(None)` without touching `list` when the node is not
    /// attached anywhere. The node stays allocated and may be appended again;
    /// `destroy` frees it for good.
    pub fn pop(&self, list: ListId, node: NodeId) -> HierarchyResult<Option<NodeId>> {
        let list_slot = self.arena.list(list)?;
        let node_slot = self.arena.node(node)?;
        self.unlink_from(&list_slot, &node_slot)
    }

    fn unlink_from(
        &self,
        list_slot: &ListSlot,
        node_slot: &NodeSlot<T>,
    ) -> HierarchyResult<Option<NodeId>> {
        let (list, node) = (list_slot.id, node_slot.id);
        let locker = self.locker();

        {
            let mut links = locker.node(node_slot);
            if links.retired {
                return Err(HierarchyError::UnknownNode(node));
            }
            if !links.attached {
                links.clear();
                self.metrics.inc_noop_pops();
                return Ok(None);
            }
            if links.superlist != Some(list) {
                return Err(HierarchyError::NotInList { node, list });
            }
        }

        let mut state = locker.list(list_slot);
        let locks = UnlinkLocks::acquire(&locker, &self.arena, list, node_slot)?;

        // Re-check under the list lock: another caller may have won the race.
        if !locks.links().attached {
            locks.clear();
            self.metrics.inc_noop_pops();
            return Ok(None);
        }
        if locks.links().superlist != Some(list) {
            return Err(HierarchyError::NotInList { node, list });
        }

        if state.head == Some(node) {
            state.head = locks.successor();
        }
        state.len -= 1;
        let len = state.len;
        drop(state);

        locks.unlink();

        self.metrics.inc_pops();
        self.observer.popped(list, node, len);
        Ok(Some(node))
    }

    /// Permanently free `node`, popping it first if it is still attached
    ///
    /// The node's sub-group and member lists must be empty; otherwise the
    /// call fails with `HasChildren` and leaves the node where it was.
    /// Afterwards every handle to the node or its child lists is stale.
    pub fn destroy(&self, node: NodeId) -> HierarchyResult<()> {
        let node_slot = self.arena.node(node)?;
        let sublist = self.arena.list(node_slot.sublist)?;
        let users = self.arena.list(node_slot.users)?;
        let locker = self.locker();

        // Child lists stay locked through the pop, so nothing can join them
        // between the emptiness check and retirement.
        let mut sublist_state = locker.list(&sublist);
        let mut users_state = locker.list(&users);
        if sublist_state.len > 0 || users_state.len > 0 {
            return Err(HierarchyError::HasChildren(node));
        }

        if let Some(list) = node_slot.links().superlist {
            let list_slot = self.arena.list(list)?;
            self.unlink_from(&list_slot, &node_slot)?;
        }

        let mut links = locker.node(&node_slot);
        if links.retired {
            return Err(HierarchyError::UnknownNode(node));
        }
        if links.attached {
            return Err(HierarchyError::AlreadyAttached(node));
        }
        links.retired = true;
        links.clear();
        sublist_state.closed = true;
        users_state.closed = true;
        drop(links);
        drop(users_state);
        drop(sublist_state);

        self.arena.remove_node(&node_slot)?;
        self.metrics.inc_nodes_destroyed(self.arena.node_count());
        self.observer.destroyed(node);
        Ok(())
    }

    /// Free an empty root list
    pub fn remove_list(&self, list: ListId) -> HierarchyResult<()> {
        let slot = self.arena.list(list)?;
        if let Some(owner) = slot.owner {
            return Err(HierarchyError::OwnedList { list, owner });
        }
        {
            let mut state = self.locker().list(&slot);
            if state.len > 0 {
                return Err(HierarchyError::ListNotEmpty { list, len: state.len });
            }
            if state.closed {
                return Err(HierarchyError::UnknownList(list));
            }
            state.closed = true;
        }
        self.arena.remove_root_list(list)
    }
}

//! Lock acquisition protocol shared by `append` and `pop`
//!
//! Order, identical for every caller:
//!
//! 0. append only: the hierarchy's topology lock, exclusive when the target
//!    list is owned by a node, shared for root lists
//! 1. the list lock
//! 2. append: incoming node, then `first` (the head), then `last` (`first.prev`)
//!    if it differs from `first`
//! 3. pop: the node, then `next` if it differs from the node, then `prev` if it
//!    differs from `next`
//!
//! Every node lock of an operation is taken while the list lock is held, so two
//! operations on the same list never interleave their node acquisitions. The
//! list lock is dropped before links are rewritten; the node locks keep the
//! splice atomic for anyone reading those nodes. Locks are released in reverse
//! acquisition order.
//!
//! `destroy` locks the node's own child lists before detaching it from its
//! parent list; nothing holding a parent list or node lock waits for a child
//! list of that node.

use super::arena::{Arena, Links, ListSlot, ListState, NodeSlot};
use super::error::{HierarchyError, HierarchyResult};
use super::observer::HierarchyObserver;
use super::types::{ListId, LockTarget, NodeId};
use crate::metrics::MetricsCollector;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub(crate) type NodeGuard = ArcMutexGuard<RawMutex, Links>;
pub(crate) type ListGuard = ArcMutexGuard<RawMutex, ListState>;

/// Acquires hierarchy locks, reporting waits above the contention threshold
pub(crate) struct Locker<'h> {
    pub observer: &'h dyn HierarchyObserver,
    pub metrics: &'h MetricsCollector,
    pub warn_after: Duration,
}

impl<'h> Locker<'h> {
    pub fn list(&self, slot: &ListSlot) -> ListGuard {
        self.acquire(&slot.state, LockTarget::List(slot.id))
    }

    pub fn node<T>(&self, slot: &NodeSlot<T>) -> NodeGuard {
        self.acquire(&slot.links, LockTarget::Node(slot.id))
    }

    fn acquire<S>(&self, mutex: &Arc<Mutex<S>>, target: LockTarget) -> ArcMutexGuard<RawMutex, S> {
        if let Some(guard) = mutex.try_lock_arc() {
            return guard;
        }
        let started = Instant::now();
        let guard = mutex.lock_arc();
        let waited = started.elapsed();
        self.metrics.record_lock_wait(waited);
        if waited >= self.warn_after {
            self.observer.lock_contended(target, waited);
        }
        guard
    }
}

/// Node locks held by an append into a non-empty list
pub(crate) struct SpliceLocks {
    node: NodeGuard,
    first_id: NodeId,
    first: NodeGuard,
    last_id: NodeId,
    /// `None` when the ring has a single member (`last == first`)
    last: Option<NodeGuard>,
}

impl SpliceLocks {
    /// Lock `first` and `last` around the insertion point
    ///
    /// `node` must already be locked; the caller holds the list lock.
    pub fn acquire<T>(
        locker: &Locker<'_>,
        arena: &Arena<T>,
        list: ListId,
        node: NodeGuard,
        first_id: NodeId,
    ) -> HierarchyResult<Self> {
        let first_slot = arena.node(first_id)?;
        let first = locker.node(&first_slot);
        let last_id = first.prev.ok_or_else(|| HierarchyError::RingCorrupted {
            list,
            reason: format!("head {} has no prev link", first_id),
        })?;
        let last = if last_id != first_id {
            let last_slot = arena.node(last_id)?;
            Some(locker.node(&last_slot))
        } else {
            None
        };
        Ok(SpliceLocks { node, first_id, first, last_id, last })
    }

    /// Link `node_id` between `last` and `first`, then release all node locks
    pub fn splice(self, list: ListId, node_id: NodeId) {
        let SpliceLocks { mut node, first_id, mut first, last_id, mut last } = self;

        node.next = Some(first_id);
        node.prev = Some(last_id);
        node.superlist = Some(list);
        node.attached = true;
        first.prev = Some(node_id);
        match last.as_mut() {
            Some(last) => last.next = Some(node_id),
            None => first.next = Some(node_id),
        }

        drop(last);
        drop(first);
        drop(node);
    }
}

/// Node locks held by a pop
pub(crate) struct UnlinkLocks {
    node: NodeGuard,
    next_id: Option<NodeId>,
    next: Option<NodeGuard>,
    prev_id: Option<NodeId>,
    prev: Option<NodeGuard>,
}

impl UnlinkLocks {
    /// Lock the node and its neighbours; the caller holds the lock of `list`
    ///
    /// A node found detached, or attached to another list, is returned with
    /// only its own lock held. Its neighbours then belong to a list whose lock
    /// the caller does not hold, and locking them could deadlock.
    pub fn acquire<T>(
        locker: &Locker<'_>,
        arena: &Arena<T>,
        list: ListId,
        slot: &NodeSlot<T>,
    ) -> HierarchyResult<Self> {
        let node = locker.node(slot);
        if node.superlist != Some(list) {
            return Ok(UnlinkLocks { node, next_id: None, next: None, prev_id: None, prev: None });
        }
        let (next_id, prev_id) = match (node.attached, node.next, node.prev) {
            (true, Some(next), Some(prev)) => (next, prev),
            _ => {
                return Ok(UnlinkLocks { node, next_id: None, next: None, prev_id: None, prev: None })
            }
        };

        let next = if next_id != slot.id {
            let next_slot = arena.node(next_id)?;
            Some(locker.node(&next_slot))
        } else {
            None
        };
        let prev = if prev_id != next_id {
            let prev_slot = arena.node(prev_id)?;
            Some(locker.node(&prev_slot))
        } else {
            None
        };

        Ok(UnlinkLocks { node, next_id: Some(next_id), next, prev_id: Some(prev_id), prev })
    }

    pub fn links(&self) -> &Links {
        &self.node
    }

    /// Successor the list head moves to when this node is the head
    pub fn successor(&self) -> Option<NodeId> {
        match self.next {
            Some(_) => self.next_id,
            None => None,
        }
    }

    /// Clear the node's links without touching any neighbour
    pub fn clear(self) {
        let UnlinkLocks { mut node, .. } = self;
        node.clear();
    }

    /// Close the ring over the node, clear its links and release all locks
    pub fn unlink(self) {
        let UnlinkLocks { mut node, next_id, mut next, prev_id, mut prev } = self;

        match (next.as_mut(), prev.as_mut()) {
            (Some(next), Some(prev)) => {
                prev.next = next_id;
                next.prev = prev_id;
            }
            // Two-member ring: the remaining node is both next and prev
            (Some(other), None) => {
                other.next = next_id;
                other.prev = prev_id;
            }
            _ => {}
        }
        node.clear();

        drop(prev);
        drop(next);
        drop(node);
    }
}

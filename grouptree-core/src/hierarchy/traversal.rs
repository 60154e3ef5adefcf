//! Traversal engine: `map`, `get` and `find`
//!
//! Traversals take no list locks. Each step copies the current node's `next`
//! link under that node's lock and releases it before the callback runs, so a
//! callback may freely append or pop. Callers that need a stable view wrap the
//! traversal in `Hierarchy::with_list_locked`.

use super::arena::{Arena, NodeSlot};
use super::error::{HierarchyError, HierarchyResult};
use super::manager::{Hierarchy, NodeRef};
use super::types::{ListId, MapMode, NodeId};
use std::sync::Arc;

/// One circuit of a ring, starting at (and including) `start`
///
/// The walk ends when it returns to `start`, reaches a node without a `next`
/// link, or after as many steps as there were live nodes when it began. The
/// last bound keeps an unguarded walk finite even if `start` is popped midway.
pub(crate) struct RingIter<'h, T> {
    arena: &'h Arena<T>,
    start: NodeId,
    next: Option<NodeId>,
    remaining: usize,
}

impl<'h, T> Iterator for RingIter<'h, T> {
    type Item = HierarchyResult<Arc<NodeSlot<T>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.next.take()?;
        self.remaining -= 1;
        match self.arena.node(id) {
            Ok(slot) => {
                self.next = slot.links().next.filter(|next| *next != self.start);
                Some(Ok(slot))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

impl<T> Hierarchy<T> {
    pub(crate) fn ring_from(&self, start: NodeId) -> RingIter<'_, T> {
        RingIter {
            arena: &self.arena,
            start,
            next: Some(start),
            remaining: self.arena.node_count().max(1),
        }
    }

    /// Apply `callback` to ring members reachable from `start`
    ///
    /// - `SelfOnly`: only `start`
    /// - `All`: the whole ring, in ring order from `start`
    /// - `Others`: the whole ring except `start`
    /// - `Recursive`: for every group of the ring, all its members, then the
    ///   same recursively for its sub-groups (depth-first pre-order); the
    ///   callback only ever sees members
    ///
    /// `Recursive` fails with `DepthExceeded` rather than descend more than
    /// `max_depth` rings below `start`.
    ///
    /// The first callback error aborts the traversal and is returned as is.
    /// Effects of callbacks that already ran are kept. `start == None` is an
    /// empty traversal and succeeds.
    ///
    /// # Example
    /// ```
    /// use grouptree_core::{Hierarchy, HierarchyConfig, HierarchyError, MapMode};
    ///
    /// let hierarchy = Hierarchy::new(HierarchyConfig::default());
    /// let lobby = hierarchy.new_list().unwrap();
    /// for name in ["alice", "bob", "carol"] {
    ///     let node = hierarchy.create(name, ()).unwrap();
    ///     hierarchy.append(lobby, node).unwrap();
    /// }
    ///
    /// let mut seen = Vec::new();
    /// hierarchy
    ///     .map(hierarchy.head(lobby).unwrap(), MapMode::All, |node| {
    ///         seen.push(node.name().to_string());
    ///         Ok::<_, HierarchyError>(())
    ///     })
    ///     .unwrap();
    /// assert_eq!(seen, ["alice", "bob", "carol"]);
    /// ```
    pub fn map<F, E>(&self, start: Option<NodeId>, mode: MapMode, mut callback: F) -> Result<(), E>
    where
        F: FnMut(&NodeRef<T>) -> Result<(), E>,
        E: From<HierarchyError>,
    {
        self.metrics.inc_traversals();
        self.map_inner(start, mode, 0, &mut callback)
    }

    /// `map` starting at the head of `list`
    pub fn map_list<F, E>(&self, list: ListId, mode: MapMode, callback: F) -> Result<(), E>
    where
        F: FnMut(&NodeRef<T>) -> Result<(), E>,
        E: From<HierarchyError>,
    {
        let head = self.head(list)?;
        self.map(head, mode, callback)
    }

    fn map_inner<E>(
        &self,
        start: Option<NodeId>,
        mode: MapMode,
        depth: usize,
        callback: &mut dyn FnMut(&NodeRef<T>) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<HierarchyError>,
    {
        let Some(start) = start else {
            return Ok(());
        };

        match mode {
            MapMode::SelfOnly => {
                let slot = self.arena.node(start)?;
                callback(&NodeRef::new(slot))
            }
            MapMode::All => {
                for slot in self.ring_from(start) {
                    callback(&NodeRef::new(slot?))?;
                }
                Ok(())
            }
            MapMode::Others => {
                self.arena.node(start)?;
                for slot in self.ring_from(start).skip(1) {
                    callback(&NodeRef::new(slot?))?;
                }
                Ok(())
            }
            MapMode::Recursive => {
                // Sub-group rings below `start` never nest deeper than max_depth
                if depth >= self.config.max_depth {
                    return Err(HierarchyError::DepthExceeded(self.config.max_depth).into());
                }
                for slot in self.ring_from(start) {
                    let slot = slot?;
                    let users = self.head(slot.users)?;
                    self.map_inner(users, MapMode::All, depth, callback)?;
                    let sublist = self.head(slot.sublist)?;
                    self.map_inner(sublist, MapMode::Recursive, depth + 1, callback)?;
                }
                Ok(())
            }
        }
    }

    /// Find the node named `name` in the ring of `start`
    ///
    /// Scans at most one circuit. A detached `start` has no ring and is
    /// reported as `Detached`.
    pub fn get(&self, start: NodeId, name: &str) -> HierarchyResult<Option<NodeRef<T>>> {
        let slot = self.arena.node(start)?;
        if !slot.links().attached {
            return Err(HierarchyError::Detached(start));
        }
        self.metrics.inc_traversals();
        for slot in self.ring_from(start) {
            let slot = slot?;
            if slot.name == name {
                return Ok(Some(NodeRef::new(slot)));
            }
        }
        Ok(None)
    }

    /// `get` starting at the head of `list`; an empty list is `EmptyList`
    pub fn find(&self, list: ListId, name: &str) -> HierarchyResult<Option<NodeRef<T>>> {
        let head = self.head(list)?.ok_or(HierarchyError::EmptyList(list))?;
        self.get(head, name)
    }
}

//! Tree snapshots and their branch-glyph rendering

use super::error::{HierarchyError, HierarchyResult};
use super::lifecycle::META_KEY;
use super::manager::Hierarchy;
use super::types::ListId;
use crate::config::MAX_SUPPORTED_DEPTH;
use crate::metrics::{Timer, TREE_DURATION_MS};
use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Insertion-ordered mapping from group name to its entry
///
/// Serializes as a JSON object keyed by name, in ring order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeSnapshot {
    entries: IndexMap<String, TreeEntry>,
}

/// One group of a snapshot: its direct member count and its sub-groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeEntry {
    pub user_len: usize,
    pub children: TreeSnapshot,
}

#[derive(Serialize, Deserialize)]
struct EntryMeta {
    user_len: usize,
}

impl TreeSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`; a replaced entry keeps its position
    pub fn insert(&mut self, name: impl Into<String>, entry: TreeEntry) -> Option<TreeEntry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Groups in this snapshot and every level below it
    pub fn total_groups(&self) -> usize {
        self.entries.values().map(|entry| 1 + entry.children.total_groups()).sum()
    }

    /// Member counts summed over every level
    pub fn total_users(&self) -> usize {
        self.entries.values().map(|entry| entry.user_len + entry.children.total_users()).sum()
    }
}

impl TreeEntry {
    pub fn leaf(user_len: usize) -> Self {
        TreeEntry { user_len, children: TreeSnapshot::new() }
    }
}

impl Serialize for TreeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.children.len() + 1))?;
        map.serialize_entry(META_KEY, &EntryMeta { user_len: self.user_len })?;
        for (name, child) in self.children.iter() {
            map.serialize_entry(name, child)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TreeEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = TreeEntry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map with a '{}' metadata entry", META_KEY)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TreeEntry, A::Error> {
                let mut meta: Option<EntryMeta> = None;
                let mut children = TreeSnapshot::new();
                while let Some(key) = access.next_key::<String>()? {
                    if key == META_KEY {
                        meta = Some(access.next_value()?);
                    } else {
                        let child = access.next_value()?;
                        children.insert(key, child);
                    }
                }
                let meta = meta.ok_or_else(|| serde::de::Error::missing_field("."))?;
                Ok(TreeEntry { user_len: meta.user_len, children })
            }
        }

        deserializer.deserialize_map(EntryVisitor)
    }
}

/// Branch glyphs for one line, given the per-level "last sibling done" bits
fn tree_line(level: usize, indent: u64, is_last: bool, name: &str) -> String {
    let mut line = String::with_capacity(level * 4 + name.len() + 4);
    for depth in 0..level {
        if indent >> depth & 1 == 1 {
            line.push_str("    ");
        } else {
            line.push_str("|   ");
        }
    }
    line.push_str(if is_last { "└─ " } else { "|─ " });
    line.push_str(name);
    line
}

impl<T> Hierarchy<T> {
    /// Snapshot the groups reachable from `list`
    ///
    /// Each node of the ring becomes an entry keyed by its name carrying the
    /// length of its users list, with its sub-groups nested below. With
    /// `trace_tree` enabled every visited node is also reported to the
    /// observer as one glyph line. Like every traversal this takes no list
    /// lock across the walk.
    pub fn tree(&self, list: ListId) -> HierarchyResult<TreeSnapshot> {
        let timer = self.metrics.exports().then(|| Timer::new(TREE_DURATION_MS));
        self.metrics.inc_traversals();

        let level = self.level(list)?;
        let mut snapshot = TreeSnapshot::new();
        let trace = self.config.trace_tree;
        self.tree_into(list, &mut snapshot, level, 0, &mut |line| {
            if trace {
                self.observer.tree_line(&line);
            }
        })?;

        if let Some(timer) = timer {
            timer.stop();
        }
        Ok(snapshot)
    }

    /// Glyph lines of the tree below `list`, one per line
    pub fn render(&self, list: ListId) -> HierarchyResult<String> {
        self.metrics.inc_traversals();
        let level = self.level(list)?;
        let mut out = String::new();
        let mut scratch = TreeSnapshot::new();
        self.tree_into(list, &mut scratch, level, 0, &mut |line| {
            out.push_str(&line);
            out.push('\n');
        })?;
        Ok(out)
    }

    fn tree_into(
        &self,
        list: ListId,
        out: &mut TreeSnapshot,
        level: usize,
        mut indent: u64,
        sink: &mut dyn FnMut(String),
    ) -> HierarchyResult<()> {
        let Some(head) = self.head(list)? else {
            return Ok(());
        };
        // The indent bitset has one bit per level
        if level >= MAX_SUPPORTED_DEPTH || level >= self.config.max_depth {
            return Err(HierarchyError::DepthExceeded(self.config.max_depth));
        }

        let mut ring = self.ring_from(head).peekable();
        while let Some(slot) = ring.next() {
            let slot = slot?;
            let is_last = ring.peek().is_none();
            sink(tree_line(level, indent, is_last, &slot.name));
            if is_last {
                indent |= 1 << level;
            }

            let mut entry = TreeEntry::leaf(self.len(slot.users)?);
            self.tree_into(slot.sublist, &mut entry.children, level + 1, indent, sink)?;
            out.insert(slot.name.clone(), entry);
        }
        Ok(())
    }
}

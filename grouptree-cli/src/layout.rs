//! Group layout files
//!
//! A layout is a TOML document of nested `[[group]]` tables:
//!
//! ```toml
//! [[group]]
//! name = "general"
//! users = ["alice", "bob"]
//!
//! [[group.group]]
//! name = "announcements"
//! ```

use anyhow::{Context, Result};
use grouptree_core::{Hierarchy, HierarchyResult, ListId, NodeId};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Layout {
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupLayout>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupLayout {
    pub name: String,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupLayout>,
}

impl Layout {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read layout {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid layout {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Create every group and member of the layout under a new root list
    pub fn build(&self, hierarchy: &Hierarchy<()>) -> HierarchyResult<ListId> {
        let root = hierarchy.new_list()?;
        for group in &self.groups {
            build_group(hierarchy, root, group)?;
        }
        Ok(root)
    }
}

fn build_group(hierarchy: &Hierarchy<()>, list: ListId, layout: &GroupLayout) -> HierarchyResult<NodeId> {
    let group = hierarchy.create(layout.name.as_str(), ())?;
    let handle = hierarchy.node(group)?;
    for user in &layout.users {
        let member = hierarchy.create(user.as_str(), ())?;
        hierarchy.append(handle.users(), member)?;
    }
    for child in &layout.groups {
        build_group(hierarchy, handle.sublist(), child)?;
    }
    hierarchy.append(list, group)?;
    Ok(group)
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Index-based requirement tree.
//!
//! Nodes live in one owning vector and refer to each other by [`NodeId`].
//! A node's `children` list is the owning side of the hierarchy; `parent`
//! is a back-reference kept in step on every attach and detach.
//!
//! Deleted records are never dropped. They are detached from the hierarchy
//! into a reserved deleted list, keeping their own subtrees.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::markup::{Tag, BREAK};
use crate::requirement::{Attribute, InternalStatus, Requirement};

/// Handle to a node in a [`ReqTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entry of a source hierarchy listing.
///
/// `key` is the source-side record id (a remote key or an exchange object
/// identifier). `table_internal` marks nodes that belong to a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub key: String,
    #[serde(default)]
    pub table_internal: bool,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn new(key: impl Into<String>) -> Self {
        HierarchyNode {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_children(key: impl Into<String>, children: Vec<HierarchyNode>) -> Self {
        HierarchyNode {
            key: key.into(),
            table_internal: false,
            children,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    req: Requirement,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    table_head: bool,
}

impl Node {
    fn new(req: Requirement) -> Self {
        Node {
            req,
            parent: None,
            children: Vec::new(),
            table_head: false,
        }
    }
}

/// Requirement hierarchy with change tracking.
#[derive(Debug, Clone, Default)]
pub struct ReqTree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    deleted: Vec<NodeId>,
}

struct Builder<'a> {
    nodes: Vec<Node>,
    index: HashMap<&'a str, usize>,
    placed: Vec<bool>,
    roots: Vec<NodeId>,
}

impl Builder<'_> {
    fn attach(
        &mut self,
        node: &HierarchyNode,
        parent: Option<usize>,
        parent_internal: bool,
    ) -> Result<()> {
        let idx = *self
            .index
            .get(node.key.as_str())
            .ok_or_else(|| Error::UnknownHierarchyRef(node.key.clone()))?;
        if std::mem::replace(&mut self.placed[idx], true) {
            return Err(Error::DuplicateHierarchyRef(node.key.clone()));
        }

        self.nodes[idx].table_head = node.table_internal && !parent_internal;
        self.nodes[idx].parent = parent.map(NodeId);
        match parent {
            Some(p) => self.nodes[p].children.push(NodeId(idx)),
            None => self.roots.push(NodeId(idx)),
        }

        for child in &node.children {
            self.attach(child, Some(idx), node.table_internal)?;
        }
        Ok(())
    }
}

impl ReqTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from keyed records and a hierarchy listing.
    ///
    /// Fails on a hierarchy entry whose key is not among `records`, or that
    /// occurs twice. Table heads have their row and cell children folded into
    /// one canonical table appended to their content; the rows and cells are
    /// not kept as records. Records the hierarchy never mentions stay in the
    /// tree without a parent and outside [`roots`](Self::roots).
    pub fn build(records: Vec<(String, Requirement)>, hierarchy: &[HierarchyNode]) -> Result<Self> {
        let keys: Vec<String> = records.iter().map(|(key, _)| key.clone()).collect();
        let nodes: Vec<Node> = records.into_iter().map(|(_, req)| Node::new(req)).collect();
        let index = keys.iter().enumerate().map(|(i, k)| (k.as_str(), i)).collect();

        let mut builder = Builder {
            placed: vec![false; nodes.len()],
            nodes,
            index,
            roots: Vec::new(),
        };
        for node in hierarchy {
            builder.attach(node, None, false)?;
        }

        let mut tree = ReqTree {
            nodes: builder.nodes,
            roots: builder.roots,
            deleted: Vec::new(),
        };
        tree.flatten_tables();
        Ok(tree)
    }

    fn flatten_tables(&mut self) {
        let mut consumed = vec![false; self.nodes.len()];
        let heads: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].table_head)
            .collect();

        for head in heads {
            let rows = std::mem::take(&mut self.nodes[head].children);
            let mut body = String::new();
            for row in rows {
                let mut cells = String::new();
                for &cell in &self.nodes[row.0].children {
                    let text = self.nodes[cell.0].req.content.as_deref().unwrap_or_default();
                    cells.push_str(&Tag::Cell.wrap(&text.replace(BREAK, "")));
                    self.mark_subtree(cell, &mut consumed);
                }
                body.push_str(&Tag::TableRow.wrap(&cells));
                consumed[row.0] = true;
            }

            let table = Tag::Table.wrap(&body);
            let req = &mut self.nodes[head].req;
            req.content = Some(match req.content.take().filter(|c| !c.is_empty()) {
                Some(text) => format!("{}{}{}", text, BREAK, table),
                None => table,
            });
        }

        if consumed.iter().any(|&c| c) {
            self.compact(&consumed);
        }
    }

    fn mark_subtree(&self, id: NodeId, consumed: &mut [bool]) {
        consumed[id.0] = true;
        for &child in &self.nodes[id.0].children {
            self.mark_subtree(child, consumed);
        }
    }

    /// Drop consumed nodes and renumber the rest in their original order.
    fn compact(&mut self, consumed: &[bool]) {
        let mut remap = vec![None; self.nodes.len()];
        let mut next = 0;
        for (old, gone) in consumed.iter().enumerate() {
            if !gone {
                remap[old] = Some(NodeId(next));
                next += 1;
            }
        }
        let map = |id: &NodeId| remap[id.0];

        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = nodes
            .into_iter()
            .zip(consumed)
            .filter(|(_, gone)| !**gone)
            .map(|(mut node, _)| {
                node.parent = node.parent.as_ref().and_then(map);
                node.children = node.children.iter().filter_map(map).collect();
                node
            })
            .collect();
        self.roots = self.roots.iter().filter_map(map).collect();
        self.deleted = self.deleted.iter().filter_map(map).collect();
    }

    // Queries

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Requirement> {
        self.nodes.get(id.0).map(|n| &n.req)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Requirement> {
        self.nodes.get_mut(id.0).map(|n| &mut n.req)
    }

    /// Look up a record by its requirement id.
    pub fn find(&self, req_id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.req.req_id == req_id)
            .map(NodeId)
    }

    pub fn find_by_remote_id(&self, remote_id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.req.remote_id.as_deref() == Some(remote_id))
            .map(NodeId)
    }

    /// Every record with its id, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Requirement)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), &n.req))
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Flat, order-preserving list of every record.
    pub fn requirements(&self) -> Vec<&Requirement> {
        self.nodes.iter().map(|n| &n.req).collect()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[][..], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Pre-order walk of the hierarchy below the roots.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Records detached by [`delete`](Self::delete), in deletion order.
    pub fn deleted(&self) -> &[NodeId] {
        &self.deleted
    }

    pub fn is_table_head(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|n| n.table_head)
    }

    // Edits

    fn check(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::RequirementNotFound(id.to_string()))
        }
    }

    fn mark(&mut self, id: NodeId, status: InternalStatus) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.req.mark(status);
        }
    }

    /// Add a new record under `parent` (or at the root) and mark it CREATED.
    pub fn insert(&mut self, mut req: Requirement, parent: Option<NodeId>) -> Result<NodeId> {
        if let Some(p) = parent {
            self.check(p)?;
        }
        req.mark(InternalStatus::Created);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(req));
        self.attach(id, parent);
        Ok(id)
    }

    /// Move a record under `new_parent` (or to the root).
    ///
    /// The record is detached from its old location first, so it appears
    /// exactly once afterwards. Moving a record below itself fails. A deleted
    /// record moved back into the hierarchy is no longer DELETED.
    pub fn move_node(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<()> {
        self.check(id)?;
        if let Some(p) = new_parent {
            self.check(p)?;
            let mut cursor = Some(p);
            while let Some(ancestor) = cursor {
                if ancestor == id {
                    return Err(Error::HierarchyCycle {
                        node: self.nodes[id.0].req.req_id.clone(),
                        parent: self.nodes[p.0].req.req_id.clone(),
                    });
                }
                cursor = self.nodes[ancestor.0].parent;
            }
        }

        self.detach(id);
        self.attach(id, new_parent);
        let req = &mut self.nodes[id.0].req;
        req.internal_status.remove(&InternalStatus::Deleted);
        req.mark(InternalStatus::Moved);
        Ok(())
    }

    /// Mark a record DELETED and detach it into the deleted list.
    pub fn delete(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        if self.deleted.contains(&id) {
            return Ok(());
        }
        self.detach(id);
        self.deleted.push(id);
        self.mark(id, InternalStatus::Deleted);
        Ok(())
    }

    /// Apply `edit` to a record and flag `attribute` as changed.
    pub fn update<F>(&mut self, id: NodeId, attribute: Attribute, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Requirement),
    {
        let req = self
            .get_mut(id)
            .ok_or_else(|| Error::RequirementNotFound(id.to_string()))?;
        edit(req);
        req.set_updated(attribute);
        Ok(())
    }

    /// Forget pending reconciliation state on every record.
    pub fn clear_sync_state(&mut self) {
        for node in &mut self.nodes {
            node.req.clear_sync_state();
        }
    }

    fn detach(&mut self, id: NodeId) {
        match self.nodes[id.0].parent.take() {
            Some(parent) => {
                self.nodes[parent.0].children.retain(|&c| c != id);
                self.mark(parent, InternalStatus::ChildrenUpdated);
            }
            None => {
                self.roots.retain(|&r| r != id);
                self.deleted.retain(|&d| d != id);
            }
        }
    }

    fn attach(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.nodes[id.0].parent = parent;
        match parent {
            Some(p) => {
                self.nodes[p.0].children.push(id);
                self.mark(p, InternalStatus::ChildrenUpdated);
            }
            None => self.roots.push(id),
        }
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;

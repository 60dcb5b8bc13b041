//! Parent/child links between persistent components of one page.
//!
//! Nodes live in an arena owned by the page scope; links are indices, so
//! the tree holds no reference cycles. A component registers under its
//! nearest persistent ancestor once; re-registration returns the existing
//! node. A component that leaves the render tree takes its subtree out of
//! the graph with it.

use std::collections::HashMap;

use super::position::PositionIdentifier;
use crate::error::StateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

/// Progress of the root's restoration, observed by descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreStatus {
    #[default]
    Pending,
    Restored,
    Failed,
}

#[derive(Debug)]
struct GraphNode<E> {
    key: usize,
    entry: E,
    position: Option<PositionIdentifier>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena of the persistent components currently mounted under one page.
///
/// Slots of removed nodes stay empty, so a `NodeId` never names a
/// different component later.
#[derive(Debug)]
pub struct StateGraph<E> {
    nodes: Vec<Option<GraphNode<E>>>,
    by_key: HashMap<usize, NodeId>,
}

impl<E> StateGraph<E> {
    /// A graph holding only the root. `key` identifies the root instance.
    pub fn new(key: usize, root: E) -> Self {
        let mut by_key = HashMap::new();
        by_key.insert(key, NodeId::ROOT);
        Self {
            nodes: vec![Some(GraphNode {
                key,
                entry: root,
                position: None,
                parent: None,
                children: Vec::new(),
            })],
            by_key,
        }
    }

    /// Register `entry` as a child of `parent`, once per `key`.
    pub fn attach(
        &mut self,
        parent: NodeId,
        key: usize,
        position: PositionIdentifier,
        entry: E,
    ) -> Result<NodeId, StateError> {
        if let Some(&existing) = self.by_key.get(&key) {
            return Ok(existing);
        }
        let id = NodeId(self.nodes.len());
        let Some(parent_node) = self.node_mut(parent) else {
            return Err(StateError::invalid_operation(format!(
                "state parent {parent:?} does not belong to this page"
            )));
        };
        parent_node.children.push(id);

        self.nodes.push(Some(GraphNode {
            key,
            entry,
            position: Some(position),
            parent: Some(parent),
            children: Vec::new(),
        }));
        self.by_key.insert(key, id);
        Ok(id)
    }

    /// Remove `node` and its whole subtree. Returns the number of nodes
    /// removed; the root and unknown nodes remove nothing.
    pub fn remove(&mut self, node: NodeId) -> usize {
        if node.is_root() {
            return 0;
        }
        let Some(parent) = self.parent(node) else {
            return 0;
        };
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|&child| child != node);
        }

        let mut removed = 0;
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            let Some(slot) = self.nodes.get_mut(id.0).and_then(Option::take) else {
                continue;
            };
            self.by_key.remove(&slot.key);
            pending.extend(slot.children);
            removed += 1;
        }
        removed
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    pub fn entry(&self, node: NodeId) -> Option<&E> {
        self.node(node).map(|n| &n.entry)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    /// Children in registration order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Position among siblings; `None` for the root.
    pub fn position(&self, node: NodeId) -> Option<&PositionIdentifier> {
        self.node(node).and_then(|n| n.position.as_ref())
    }

    /// Position ids from the root (exclusive) down to `node` (inclusive).
    pub fn path(&self, node: NodeId) -> Vec<PositionIdentifier> {
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(position) = self.position(id) {
                path.push(position.clone());
            }
            current = self.parent(id);
        }
        path.reverse();
        path
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    fn node(&self, node: NodeId) -> Option<&GraphNode<E>> {
        self.nodes.get(node.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, node: NodeId) -> Option<&mut GraphNode<E>> {
        self.nodes.get_mut(node.0).and_then(Option::as_mut)
    }
}

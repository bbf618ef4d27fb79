//! Validation and indexing of the flat node list.
//!
//! Nodes reference each other by id only, so nothing about the input
//! guarantees it forms a tree. [`validate`] checks every structural
//! invariant up front and hands back an [`IndexedTree`] arena that layout
//! can walk without further existence checks.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use crate::ir::{NodeId, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSide {
    Left,
    Right,
}

impl ChildSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTree {
    #[error("no root node (every node has a parent)")]
    NoRoot,
    #[error("multiple root nodes ({first} and {second})")]
    MultipleRoots { first: NodeId, second: NodeId },
    #[error("duplicate node id {0}")]
    DuplicateId(NodeId),
    #[error("node {node} references missing {field} {target}")]
    DanglingReference {
        node: NodeId,
        field: &'static str,
        target: NodeId,
    },
    #[error("node {0} lists itself as a child")]
    SelfChild(NodeId),
    #[error("node {child} is claimed by both {first} and {second}")]
    DuplicateOwnership {
        child: NodeId,
        first: NodeId,
        second: NodeId,
    },
    #[error("node {child} names parent {declared:?} but is a child of {owner:?}")]
    ParentMismatch {
        child: NodeId,
        declared: Option<NodeId>,
        owner: Option<NodeId>,
    },
    #[error("node {0} is not reachable from the root")]
    Unreachable(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("tree is empty")]
    Empty,
    #[error("malformed tree: {0}")]
    Malformed(#[from] MalformedTree),
}

/// A node set that passed validation: exactly one root, every reference
/// resolved, every node reachable exactly once.
#[derive(Debug, Clone)]
pub struct IndexedTree {
    root: NodeId,
    nodes: BTreeMap<NodeId, TreeNode>,
}

impl IndexedTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Existing children of `id`, left before right.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|node| [node.left, node.right])
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut best = 0;
        let mut stack = vec![(self.root, 1usize)];
        while let Some((id, depth)) = stack.pop() {
            best = best.max(depth);
            for child in self.children(id) {
                stack.push((child, depth + 1));
            }
        }
        best
    }
}

pub fn validate(nodes: &[TreeNode]) -> Result<IndexedTree, ValidationError> {
    if nodes.is_empty() {
        return Err(ValidationError::Empty);
    }

    let mut index: BTreeMap<NodeId, TreeNode> = BTreeMap::new();
    let mut root: Option<NodeId> = None;
    for node in nodes {
        if index.insert(node.id, *node).is_some() {
            return Err(MalformedTree::DuplicateId(node.id).into());
        }
        if node.parent.is_none() {
            if let Some(first) = root {
                return Err(MalformedTree::MultipleRoots {
                    first,
                    second: node.id,
                }
                .into());
            }
            root = Some(node.id);
        }
    }
    let root = root.ok_or(MalformedTree::NoRoot)?;

    let mut owners: HashMap<NodeId, NodeId> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        if let Some(parent) = node.parent
            && !index.contains_key(&parent)
        {
            return Err(MalformedTree::DanglingReference {
                node: node.id,
                field: "parent",
                target: parent,
            }
            .into());
        }
        for (side, child) in [(ChildSide::Left, node.left), (ChildSide::Right, node.right)] {
            let Some(child) = child else {
                continue;
            };
            if child == node.id {
                return Err(MalformedTree::SelfChild(node.id).into());
            }
            if !index.contains_key(&child) {
                return Err(MalformedTree::DanglingReference {
                    node: node.id,
                    field: side.as_str(),
                    target: child,
                }
                .into());
            }
            if let Some(first) = owners.insert(child, node.id) {
                return Err(MalformedTree::DuplicateOwnership {
                    child,
                    first,
                    second: node.id,
                }
                .into());
            }
        }
    }

    for node in nodes {
        let owner = owners.get(&node.id).copied();
        if owner != node.parent {
            return Err(MalformedTree::ParentMismatch {
                child: node.id,
                declared: node.parent,
                owner,
            }
            .into());
        }
    }

    // Ownership is now a function child -> parent with a single parentless
    // node, so any node the walk misses sits on a detached cycle.
    let mut stack = vec![root];
    let mut visited: HashSet<NodeId> = HashSet::with_capacity(nodes.len());
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        if let Some(node) = index.get(&id) {
            stack.extend(node.right);
            stack.extend(node.left);
        }
    }
    if visited.len() != index.len() {
        let missing = nodes
            .iter()
            .map(|node| node.id)
            .find(|id| !visited.contains(id))
            .unwrap_or(root);
        return Err(MalformedTree::Unreachable(missing).into());
    }

    Ok(IndexedTree { root, nodes: index })
}

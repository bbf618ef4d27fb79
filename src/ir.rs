use serde::{Deserialize, Serialize};
use std::fmt;

/// Node key. Doubles as the value stored in the tree and the label drawn on the node.
pub type NodeId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Red,
    Black,
}

impl ColorTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Black => "black",
        }
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNode {
    pub id: NodeId,
    pub color: ColorTag,
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

impl TreeNode {
    pub fn new(id: NodeId, color: ColorTag) -> Self {
        Self {
            id,
            color,
            parent: None,
            left: None,
            right: None,
        }
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_left(mut self, left: NodeId) -> Self {
        self.left = Some(left);
        self
    }

    pub fn with_right(mut self, right: NodeId) -> Self {
        self.right = Some(right);
        self
    }
}

/// One entry of the backend's `nodes` array.
///
/// The backend also ships its own `x`, `y` and `level` hints; they are
/// accepted and ignored since positions are always recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub data: NodeId,
    pub color: ColorTag,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub left: Option<NodeId>,
    #[serde(default)]
    pub right: Option<NodeId>,
}

impl From<&NodeRecord> for TreeNode {
    fn from(record: &NodeRecord) -> Self {
        Self {
            id: record.data,
            color: record.color,
            parent: record.parent,
            left: record.left,
            right: record.right,
        }
    }
}

impl From<&TreeNode> for NodeRecord {
    fn from(node: &TreeNode) -> Self {
        Self {
            data: node.id,
            color: node.color,
            parent: node.parent,
            left: node.left,
            right: node.right,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreePayload {
    #[serde(default)]
    pub empty: bool,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

/// Body handed to `draw()`: `{ "tree": { "empty": .., "nodes": [..] } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeData {
    #[serde(default)]
    pub tree: TreePayload,
}

impl TreeData {
    pub fn from_nodes(nodes: &[TreeNode]) -> Self {
        Self {
            tree: TreePayload {
                empty: nodes.is_empty(),
                nodes: nodes.iter().map(NodeRecord::from).collect(),
                ..Default::default()
            },
        }
    }

    /// Node list as seen by validation. An `empty` flag wins over whatever
    /// the array holds.
    pub fn nodes(&self) -> Vec<TreeNode> {
        if self.tree.empty {
            return Vec::new();
        }
        self.tree.nodes.iter().map(TreeNode::from).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.empty || self.tree.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub node_count: usize,
    pub height: usize,
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

impl StatsSnapshot {
    pub fn new(node_count: usize, height: usize, valid: bool) -> Self {
        Self {
            node_count,
            height,
            valid,
        }
    }
}

/// Emitted when a rendered node is clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeClicked {
    pub id: NodeId,
    pub color_tag: ColorTag,
}

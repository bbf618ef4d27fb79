use std::collections::BTreeMap;

use crate::ir::{ColorTag, NodeId};
use crate::model::ChildSide;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    pub id: NodeId,
    pub color: ColorTag,
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub x: f32,
    pub y: f32,
    pub depth: usize,
    /// Horizontal extent reserved for this node's subtree, centred on `x`.
    pub span: f32,
}

impl PositionedNode {
    pub fn span_bounds(&self) -> (f32, f32) {
        (self.x - self.span / 2.0, self.x + self.span / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub from: NodeId,
    pub to: NodeId,
    pub side: ChildSide,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLayout {
    pub nodes: BTreeMap<NodeId, PositionedNode>,
    pub edges: Vec<EdgeLayout>,
}

impl TreeLayout {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&PositionedNode> {
        self.nodes.get(&id)
    }

    pub fn positions(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.nodes.values().map(|node| (node.x, node.y))
    }

    /// Ids ordered by x, then y, then id: the order a left-to-right sweep visits them.
    pub fn left_to_right(&self) -> Vec<NodeId> {
        let mut nodes: Vec<&PositionedNode> = self.nodes.values().collect();
        nodes.sort_by(|a, b| {
            a.x.total_cmp(&b.x)
                .then(a.y.total_cmp(&b.y))
                .then(a.id.cmp(&b.id))
        });
        nodes.into_iter().map(|node| node.id).collect()
    }
}

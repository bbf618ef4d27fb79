pub(crate) mod types;
pub mod viewport;

pub use types::*;
pub use viewport::{DisplaySize, Viewport, display_size, fit_viewport};

use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::ir::NodeId;
use crate::model::{ChildSide, IndexedTree};

/// Symmetric subtree-width layout.
///
/// Every subtree gets a horizontal span equal to the sum of its children's
/// spans (a leaf gets `min_spacing`). Children sit side by side, left before
/// right, centred under their parent, one `level_height` further down. Sibling
/// spans never intersect, so nodes sharing a depth are at least
/// `min_spacing` apart. The result depends only on the tree's shape and the
/// config, never on the order the records arrived in.
pub fn compute_layout(tree: &IndexedTree, config: &LayoutConfig) -> TreeLayout {
    let widths = subtree_widths(tree, config.min_spacing);
    let mut layout = TreeLayout::default();

    let root = tree.root();
    let root_span = widths.get(&root).copied().unwrap_or(config.min_spacing);
    let mut stack: Vec<(NodeId, f32, f32, usize, f32)> =
        vec![(root, config.canvas_center_x(), config.top_margin, 0, root_span)];

    while let Some((id, center_x, y, depth, span)) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        layout.nodes.insert(
            id,
            PositionedNode {
                id,
                color: node.color,
                parent: node.parent,
                left: node.left,
                right: node.right,
                x: center_x,
                y,
                depth,
                span,
            },
        );

        let children: Vec<(NodeId, f32)> = tree
            .children(id)
            .map(|child| (child, widths.get(&child).copied().unwrap_or(config.min_spacing)))
            .collect();
        let total: f32 = children.iter().map(|(_, width)| width).sum();
        let mut cursor = center_x - total / 2.0;
        let mut placed = Vec::with_capacity(children.len());
        for (child, width) in children {
            placed.push((child, cursor + width / 2.0, y + config.level_height, depth + 1, width));
            cursor += width;
        }
        // Reverse so the left child is popped, and therefore placed, first.
        stack.extend(placed.into_iter().rev());
    }

    layout.edges = collect_edges(&layout);
    layout
}

/// Post-order width pass. A leaf reserves `min_spacing`; an inner node the
/// sum of its children, floored at `min_spacing`.
fn subtree_widths(tree: &IndexedTree, min_spacing: f32) -> HashMap<NodeId, f32> {
    let mut order = Vec::with_capacity(tree.len());
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        order.push(id);
        stack.extend(tree.children(id));
    }

    let mut widths: HashMap<NodeId, f32> = HashMap::with_capacity(order.len());
    for &id in order.iter().rev() {
        let sum: f32 = tree
            .children(id)
            .map(|child| widths.get(&child).copied().unwrap_or(min_spacing))
            .sum();
        widths.insert(id, sum.max(min_spacing));
    }
    widths
}

fn collect_edges(layout: &TreeLayout) -> Vec<EdgeLayout> {
    let mut edges = Vec::with_capacity(layout.len().saturating_sub(1));
    for parent in layout.nodes.values() {
        for (side, child) in [(ChildSide::Left, parent.left), (ChildSide::Right, parent.right)] {
            let Some(child) = child.and_then(|id| layout.nodes.get(&id)) else {
                continue;
            };
            edges.push(EdgeLayout {
                from: parent.id,
                to: child.id,
                side,
                x1: parent.x,
                y1: parent.y,
                x2: child.x,
                y2: child.y,
            });
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ColorTag::{Black, Red};
    use crate::ir::TreeNode;
    use crate::model::validate;

    fn layout_of(nodes: &[TreeNode]) -> TreeLayout {
        let tree = validate(nodes).unwrap();
        compute_layout(&tree, &LayoutConfig::default())
    }

    #[test]
    fn single_node_sits_at_top_centre() {
        let layout = layout_of(&[TreeNode::new(5, Black)]);
        let node = layout.get(5).unwrap();
        assert_eq!((node.x, node.y), (600.0, 80.0));
        assert!(layout.edges.is_empty());
    }

    #[test]
    fn balanced_triple_is_symmetric() {
        let layout = layout_of(&[
            TreeNode::new(10, Black).with_left(5).with_right(15),
            TreeNode::new(5, Red).with_parent(10),
            TreeNode::new(15, Red).with_parent(10),
        ]);
        let root = layout.get(10).unwrap();
        let left = layout.get(5).unwrap();
        let right = layout.get(15).unwrap();
        assert_eq!(left.y, right.y);
        assert_eq!(left.y, root.y + 100.0);
        assert_eq!(root.x - left.x, right.x - root.x);
        assert_eq!(right.x - left.x, 80.0);
        assert_eq!(root.span, 160.0);
        assert_eq!(layout.edges.len(), 2);
        assert_eq!(layout.edges[0].side, ChildSide::Left);
    }

    #[test]
    fn right_chain_stacks_vertically() {
        let layout = layout_of(&[
            TreeNode::new(5, Black).with_right(10),
            TreeNode::new(10, Red).with_parent(5).with_right(15),
            TreeNode::new(15, Black).with_parent(10),
        ]);
        let ys: Vec<f32> = [5, 10, 15].iter().map(|id| layout.get(*id).unwrap().y).collect();
        assert!(ys.windows(2).all(|pair| pair[0] < pair[1]));
        for id in [5, 10, 15] {
            let node = layout.get(id).unwrap();
            assert_eq!(node.x, 600.0);
            assert_eq!(node.span, 80.0);
        }
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let depth = 50_000;
        let nodes: Vec<TreeNode> = (0..depth)
            .map(|i| {
                let mut node = TreeNode::new(i, Black);
                if i > 0 {
                    node = node.with_parent(i - 1);
                }
                if i + 1 < depth {
                    node = node.with_left(i + 1);
                }
                node
            })
            .collect();
        let layout = layout_of(&nodes);
        assert_eq!(layout.len(), depth as usize);
        let last = layout.get(depth - 1).unwrap();
        assert_eq!(last.depth, depth as usize - 1);
    }

    #[test]
    fn left_to_right_orders_by_x() {
        let layout = layout_of(&[
            TreeNode::new(10, Black).with_left(5).with_right(15),
            TreeNode::new(5, Red).with_parent(10),
            TreeNode::new(15, Red).with_parent(10),
        ]);
        assert_eq!(layout.left_to_right(), vec![5, 10, 15]);
    }
}

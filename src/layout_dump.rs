use crate::highlight::{HighlightStateMachine, HighlightTag};
use crate::ir::NodeId;
use crate::layout::{TreeLayout, Viewport};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub viewport: Viewport,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: NodeId,
    pub color: String,
    pub parent: Option<NodeId>,
    pub x: f32,
    pub y: f32,
    pub depth: usize,
    pub span: f32,
    pub tags: Vec<HighlightTag>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: NodeId,
    pub to: NodeId,
    pub side: String,
    pub points: [[f32; 2]; 2],
}

impl LayoutDump {
    pub fn from_layout(layout: &TreeLayout, viewport: Viewport, highlight: &HighlightStateMachine) -> Self {
        let nodes = layout
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id,
                color: node.color.as_str().to_string(),
                parent: node.parent,
                x: node.x,
                y: node.y,
                depth: node.depth,
                span: node.span,
                tags: highlight.tags(node.id).into_iter().collect(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from,
                to: edge.to,
                side: edge.side.as_str().to_string(),
                points: [[edge.x1, edge.y1], [edge.x2, edge.y2]],
            })
            .collect();

        LayoutDump {
            viewport,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(
    path: &Path,
    layout: &TreeLayout,
    viewport: Viewport,
    highlight: &HighlightStateMachine,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, viewport, highlight);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

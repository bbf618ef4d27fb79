use crate::config::{Config, LayoutConfig, RenderConfig};
use crate::highlight::{HighlightStateMachine, HighlightTag};
use crate::ir::{ColorTag, NodeClicked, NodeId, TreeData};
use crate::layout::{DisplaySize, TreeLayout, Viewport, compute_layout, display_size, fit_viewport};
use crate::model::{IndexedTree, MalformedTree, ValidationError, validate};
use crate::theme::Theme;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Placeholder,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Primitive {
    Edge {
        from: NodeId,
        to: NodeId,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Node {
        id: NodeId,
        color: ColorTag,
        cx: f32,
        cy: f32,
        r: f32,
        tags: BTreeSet<HighlightTag>,
        hovered: bool,
    },
    Message {
        kind: MessageKind,
        text: String,
        x: f32,
        y: f32,
    },
}

impl Primitive {
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::Node { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// What a single `draw()` ended up showing.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    Empty,
    Malformed(MalformedTree),
    Drawn { nodes: usize },
}

/// Retained drawing state: the primitive list plus the layout it came from.
#[derive(Debug, Default)]
pub struct Renderer {
    tree: Option<IndexedTree>,
    primitives: Vec<Primitive>,
    layout: TreeLayout,
    viewport: Viewport,
    hovered: Option<NodeId>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn display_size(&self, render: &RenderConfig) -> DisplaySize {
        display_size(&self.viewport, render)
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn rendered_ids(&self) -> Vec<NodeId> {
        self.layout.nodes.keys().copied().collect()
    }

    /// Full rebuild from wire data. Never fails: empty and malformed input
    /// turn into an in-place message.
    pub fn draw(&mut self, data: &TreeData, highlight: &HighlightStateMachine, config: &Config) -> DrawOutcome {
        self.draw_validated(validate(&data.nodes()), highlight, config)
    }

    pub fn draw_validated(
        &mut self,
        validated: Result<IndexedTree, ValidationError>,
        highlight: &HighlightStateMachine,
        config: &Config,
    ) -> DrawOutcome {
        self.tree = None;
        self.primitives.clear();
        self.layout = TreeLayout::default();
        self.hovered = None;

        let tree = match validated {
            Ok(tree) => tree,
            Err(ValidationError::Empty) => {
                self.viewport = Viewport::DEFAULT;
                self.push_message(MessageKind::Placeholder, config.render.empty_message.clone());
                tracing::debug!("drew empty tree placeholder");
                return DrawOutcome::Empty;
            }
            Err(ValidationError::Malformed(reason)) => {
                self.viewport = Viewport::DEFAULT;
                self.push_message(MessageKind::Error, format!("Error: {reason}"));
                tracing::warn!(%reason, "refusing to lay out malformed tree");
                return DrawOutcome::Malformed(reason);
            }
        };

        self.tree = Some(tree);
        let nodes = self.lay_out(highlight, config);
        tracing::debug!(nodes, edges = self.layout.edges.len(), "drew tree");
        DrawOutcome::Drawn { nodes }
    }

    /// Recomputes positions for the tree already on the surface, keeping the
    /// hover and highlight styling. Used after the canvas changes size.
    pub fn relayout(&mut self, highlight: &HighlightStateMachine, config: &Config) -> bool {
        if self.tree.is_none() {
            return false;
        }
        let hovered = self.hovered;
        self.lay_out(highlight, config);
        if let Some(id) = hovered {
            for primitive in &mut self.primitives {
                if let Primitive::Node { id: node, hovered, .. } = primitive {
                    *hovered = *node == id;
                }
            }
            self.hovered = hovered;
        }
        true
    }

    fn lay_out(&mut self, highlight: &HighlightStateMachine, config: &Config) -> usize {
        let Some(tree) = &self.tree else {
            return 0;
        };
        self.primitives.clear();
        self.layout = compute_layout(tree, &config.layout);
        self.viewport = fit_viewport(self.layout.positions(), config.layout.viewport_padding);

        for edge in &self.layout.edges {
            self.primitives.push(Primitive::Edge {
                from: edge.from,
                to: edge.to,
                x1: edge.x1,
                y1: edge.y1,
                x2: edge.x2,
                y2: edge.y2,
            });
        }
        for node in self.layout.nodes.values() {
            self.primitives.push(Primitive::Node {
                id: node.id,
                color: node.color,
                cx: node.x,
                cy: node.y,
                r: config.layout.node_radius,
                tags: highlight.tags(node.id),
                hovered: false,
            });
        }
        self.layout.len()
    }

    /// Style-only pass: copies the current highlight tags onto node primitives.
    pub fn restyle(&mut self, highlight: &HighlightStateMachine) {
        for primitive in &mut self.primitives {
            if let Primitive::Node { id, tags, .. } = primitive {
                *tags = highlight.tags(*id);
            }
        }
    }

    /// Re-fits the viewport to the current positions.
    pub fn refit(&mut self, layout: &LayoutConfig) {
        if self.layout.is_empty() {
            return;
        }
        self.viewport = fit_viewport(self.layout.positions(), layout.viewport_padding);
    }

    /// Topmost node primitive under a layout-space point.
    pub fn node_at(&self, x: f32, y: f32) -> Option<NodeId> {
        self.primitives.iter().rev().find_map(|primitive| match primitive {
            Primitive::Node { id, cx, cy, r, .. } => {
                let (dx, dy) = (x - cx, y - cy);
                (dx * dx + dy * dy <= r * r).then_some(*id)
            }
            _ => None,
        })
    }

    pub fn clicked(&self, id: NodeId) -> Option<NodeClicked> {
        self.primitives.iter().find_map(|primitive| match primitive {
            Primitive::Node { id: node, color, .. } if *node == id => Some(NodeClicked {
                id,
                color_tag: *color,
            }),
            _ => None,
        })
    }

    pub fn pointer_click(&self, x: f32, y: f32) -> Option<NodeClicked> {
        self.node_at(x, y).and_then(|id| self.clicked(id))
    }

    /// Emphasizes the primitive under the pointer, and only that one.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Option<NodeId> {
        let target = self.node_at(x, y);
        if target != self.hovered {
            for primitive in &mut self.primitives {
                if let Primitive::Node { id, hovered, .. } = primitive {
                    *hovered = Some(*id) == target;
                }
            }
            self.hovered = target;
        }
        target
    }

    fn push_message(&mut self, kind: MessageKind, text: String) {
        self.primitives.push(Primitive::Message {
            kind,
            text,
            x: self.viewport.x + self.viewport.width / 2.0,
            y: self.viewport.y + self.viewport.height / 2.0,
        });
    }
}

pub fn render_svg(renderer: &Renderer, theme: &Theme, config: &Config) -> String {
    let mut svg = String::new();
    let viewport = renderer.viewport();
    let size = renderer.display_size(&config.render);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.2}\" height=\"{:.2}\" viewBox=\"{}\" preserveAspectRatio=\"xMidYMid meet\">",
        size.width,
        size.height,
        viewport.to_view_box()
    ));
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
        viewport.x, viewport.y, viewport.width, viewport.height, theme.background
    ));

    svg.push_str("<g class=\"tree-group\">");
    svg.push_str("<g class=\"edge-group\">");
    for primitive in renderer.primitives() {
        if let Primitive::Edge { x1, y1, x2, y2, .. } = primitive {
            svg.push_str(&format!(
                "<line class=\"edge\" x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{}\" stroke-width=\"2\" stroke-opacity=\"{}\"/>",
                theme.edge_color, theme.edge_opacity
            ));
        }
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"node-group\">");
    for primitive in renderer.primitives() {
        match primitive {
            Primitive::Node {
                id,
                color,
                cx,
                cy,
                r,
                tags,
                hovered,
            } => svg.push_str(&node_svg(*id, *color, *cx, *cy, *r, tags, *hovered, theme, config)),
            Primitive::Message { kind, text, x, y } => {
                let (class, fill) = match kind {
                    MessageKind::Placeholder => ("empty-tree-message", theme.placeholder_color.as_str()),
                    MessageKind::Error => ("error-message", theme.error_color.as_str()),
                };
                svg.push_str(&format!(
                    "<text class=\"{class}\" x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{fill}\">{}</text>",
                    theme.font_family,
                    theme.font_size,
                    escape_xml(text)
                ));
            }
            Primitive::Edge { .. } => {}
        }
    }
    svg.push_str("</g>");
    svg.push_str("</g>");

    svg.push_str("</svg>");
    svg
}

#[allow(clippy::too_many_arguments)]
fn node_svg(
    id: NodeId,
    color: ColorTag,
    cx: f32,
    cy: f32,
    r: f32,
    tags: &BTreeSet<HighlightTag>,
    hovered: bool,
    theme: &Theme,
    config: &Config,
) -> String {
    let mut classes = format!("node-circle {}", color.as_str());
    for tag in tags {
        classes.push(' ');
        classes.push_str(tag.as_class());
    }
    if hovered {
        classes.push_str(" hovered");
    }

    let (stroke, stroke_width) = match highlight_stroke(tags, theme) {
        Some(stroke) => (stroke, 4.0),
        None => (theme.stroke_for(color), 2.0),
    };
    let transform = if hovered {
        let scale = config.render.hover_scale;
        format!(" transform=\"translate({cx:.2} {cy:.2}) scale({scale}) translate({:.2} {:.2})\"", -cx, -cy)
    } else {
        String::new()
    };

    let label = id.to_string();
    let font_size = label_font_size(&label, r, theme.font_size);
    format!(
        "<g class=\"node\" data-value=\"{id}\"{transform}><circle class=\"{classes}\" cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" fill=\"{}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/><text class=\"node-text\" x=\"{cx:.2}\" y=\"{cy:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{font_size:.2}\" fill=\"{}\">{}</text></g>",
        theme.fill_for(color),
        theme.font_family,
        theme.node_text_color,
        escape_xml(&label)
    )
}

/// Strongest visible highlight wins: search, then validation, then selection.
fn highlight_stroke<'a>(tags: &BTreeSet<HighlightTag>, theme: &'a Theme) -> Option<&'a str> {
    [
        (HighlightTag::Searching, &theme.search_stroke),
        (HighlightTag::ValidatingErr, &theme.validation_err_stroke),
        (HighlightTag::ValidatingOk, &theme.validation_ok_stroke),
        (HighlightTag::Selected, &theme.selected_stroke),
    ]
    .into_iter()
    .find(|(tag, _)| tags.contains(tag))
    .map(|(_, stroke)| stroke.as_str())
}

/// Shrinks the label font until the estimated text width fits inside the circle.
fn label_font_size(label: &str, radius: f32, base: f32) -> f32 {
    let chars = label.chars().count().max(1) as f32;
    let available = radius * 1.6;
    let estimated = chars * base * 0.6;
    if estimated <= available {
        base
    } else {
        (base * available / estimated).max(6.0)
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .or_else(|| usvg::Size::from_wh(800.0, 600.0))
        .ok_or_else(|| anyhow::anyhow!("Invalid output size"))?;
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TreeNode;
    use crate::ir::ColorTag::{Black, Red};
    use crate::timer::Scheduler;

    fn triple() -> TreeData {
        TreeData::from_nodes(&[
            TreeNode::new(10, Black).with_left(5).with_right(15),
            TreeNode::new(5, Red).with_parent(10),
            TreeNode::new(15, Red).with_parent(10),
        ])
    }

    fn highlight() -> HighlightStateMachine {
        HighlightStateMachine::new(&Config::default().timing)
    }

    #[test]
    fn edges_precede_nodes() {
        let mut renderer = Renderer::new();
        let outcome = renderer.draw(&triple(), &highlight(), &Config::default());
        assert_eq!(outcome, DrawOutcome::Drawn { nodes: 3 });
        let kinds: Vec<bool> = renderer
            .primitives()
            .iter()
            .map(|primitive| matches!(primitive, Primitive::Edge { .. }))
            .collect();
        assert_eq!(kinds, vec![true, true, false, false, false]);
    }

    #[test]
    fn redraw_is_idempotent() {
        let mut renderer = Renderer::new();
        let config = Config::default();
        renderer.draw(&triple(), &highlight(), &config);
        let first = renderer.primitives().to_vec();
        renderer.draw(&triple(), &highlight(), &config);
        assert_eq!(renderer.primitives(), first.as_slice());
    }

    #[test]
    fn empty_and_malformed_render_messages() {
        let mut renderer = Renderer::new();
        let config = Config::default();
        assert_eq!(
            renderer.draw(&TreeData::default(), &highlight(), &config),
            DrawOutcome::Empty
        );
        assert!(matches!(
            renderer.primitives(),
            [Primitive::Message {
                kind: MessageKind::Placeholder,
                ..
            }]
        ));

        let dangling = TreeData::from_nodes(&[TreeNode::new(10, Black).with_left(3)]);
        let outcome = renderer.draw(&dangling, &highlight(), &config);
        assert!(matches!(outcome, DrawOutcome::Malformed(_)));
        match renderer.primitives() {
            [Primitive::Message { kind, text, .. }] => {
                assert_eq!(*kind, MessageKind::Error);
                assert!(text.contains("missing left 3"));
            }
            other => panic!("unexpected primitives: {other:?}"),
        }
        assert!(renderer.rendered_ids().is_empty());
    }

    #[test]
    fn hit_testing_and_hover() {
        let mut renderer = Renderer::new();
        renderer.draw(&triple(), &highlight(), &Config::default());
        let root = renderer.layout().get(10).unwrap().clone();
        assert_eq!(renderer.node_at(root.x + 10.0, root.y), Some(10));
        assert_eq!(renderer.node_at(root.x, root.y + 50.0), None);
        assert_eq!(
            renderer.pointer_click(root.x, root.y),
            Some(NodeClicked {
                id: 10,
                color_tag: Black
            })
        );

        assert_eq!(renderer.pointer_move(root.x, root.y), Some(10));
        let hovered: Vec<NodeId> = renderer
            .primitives()
            .iter()
            .filter_map(|primitive| match primitive {
                Primitive::Node { id, hovered: true, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(hovered, vec![10]);
        renderer.pointer_move(-1000.0, -1000.0);
        assert_eq!(renderer.hovered(), None);
    }

    #[test]
    fn restyle_reflects_highlight_tags() {
        let config = Config::default();
        let mut timers: Scheduler<crate::highlight::HighlightTimer> = Scheduler::new();
        let mut machine = highlight();
        let mut renderer = Renderer::new();
        renderer.draw(&triple(), &machine, &config);
        machine.replace_rendered(renderer.rendered_ids(), &mut timers);
        machine.toggle_selected(5);
        renderer.restyle(&machine);

        let svg = render_svg(&renderer, &config.theme, &config);
        assert!(svg.contains("node-circle red selected"));
        assert!(svg.contains(&config.theme.selected_stroke));
        assert!(svg.contains("data-value=\"15\""));
    }

    #[test]
    fn svg_escapes_messages() {
        let mut config = Config::default();
        config.render.empty_message = "<nothing> & more".to_string();
        let mut renderer = Renderer::new();
        renderer.draw(&TreeData::default(), &highlight(), &config);
        let svg = render_svg(&renderer, &config.theme, &config);
        assert!(svg.contains("&lt;nothing&gt; &amp; more"));
        assert!(svg.contains("viewBox=\"0 0 800 600\""));
    }

    #[test]
    fn long_labels_shrink() {
        assert_eq!(label_font_size("42", 25.0, 14.0), 14.0);
        assert!(label_font_size("-123456789", 25.0, 14.0) < 14.0);
    }
}

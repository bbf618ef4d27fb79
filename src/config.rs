use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal space reserved for a leaf's subtree.
    pub min_spacing: f32,
    /// Vertical distance between depths.
    pub level_height: f32,
    pub top_margin: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub node_radius: f32,
    pub viewport_padding: f32,
}

impl LayoutConfig {
    pub fn canvas_center_x(&self) -> f32 {
        self.canvas_width / 2.0
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_spacing: 80.0,
            level_height: 100.0,
            top_margin: 80.0,
            canvas_width: 1200.0,
            canvas_height: 600.0,
            node_radius: 25.0,
            viewport_padding: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub search_ms: u64,
    pub validate_ms: u64,
    pub stagger_ms: u64,
    pub inter_step_ms: u64,
}

impl TimingConfig {
    pub fn search(&self) -> Duration {
        Duration::from_millis(self.search_ms)
    }

    pub fn validate(&self) -> Duration {
        Duration::from_millis(self.validate_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    pub fn inter_step(&self) -> Duration {
        Duration::from_millis(self.inter_step_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            search_ms: 6000,
            validate_ms: 1000,
            stagger_ms: 50,
            inter_step_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    /// Floor for the displayed surface height, whatever the fitted viewport says.
    pub min_height: f32,
    pub empty_message: String,
    pub hover_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 600.0,
            min_height: 400.0,
            empty_message: "Tree is empty. Insert some nodes to get started!".to_string(),
            hover_scale: 1.1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub timing: TimingConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOverrides {
    min_spacing: Option<f32>,
    level_height: Option<f32>,
    top_margin: Option<f32>,
    canvas_width: Option<f32>,
    canvas_height: Option<f32>,
    node_radius: Option<f32>,
    viewport_padding: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimingOverrides {
    search_ms: Option<u64>,
    validate_ms: Option<u64>,
    stagger_ms: Option<u64>,
    inter_step_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderOverrides {
    width: Option<f32>,
    height: Option<f32>,
    min_height: Option<f32>,
    empty_message: Option<String>,
    hover_scale: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    red_fill: Option<String>,
    red_stroke: Option<String>,
    black_fill: Option<String>,
    black_stroke: Option<String>,
    node_text_color: Option<String>,
    edge_color: Option<String>,
    selected_stroke: Option<String>,
    search_stroke: Option<String>,
    validation_ok_stroke: Option<String>,
    validation_err_stroke: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutOverrides>,
    timing: Option<TimingOverrides>,
    render: Option<RenderOverrides>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::by_name(theme_name) {
            Some(theme) => config.theme = theme,
            None => tracing::warn!(theme = theme_name, "unknown theme, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.red_fill {
            config.theme.red_fill = v;
        }
        if let Some(v) = vars.red_stroke {
            config.theme.red_stroke = v;
        }
        if let Some(v) = vars.black_fill {
            config.theme.black_fill = v;
        }
        if let Some(v) = vars.black_stroke {
            config.theme.black_stroke = v;
        }
        if let Some(v) = vars.node_text_color {
            config.theme.node_text_color = v;
        }
        if let Some(v) = vars.edge_color {
            config.theme.edge_color = v;
        }
        if let Some(v) = vars.selected_stroke {
            config.theme.selected_stroke = v;
        }
        if let Some(v) = vars.search_stroke {
            config.theme.search_stroke = v;
        }
        if let Some(v) = vars.validation_ok_stroke {
            config.theme.validation_ok_stroke = v;
        }
        if let Some(v) = vars.validation_err_stroke {
            config.theme.validation_err_stroke = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.min_spacing {
            config.layout.min_spacing = v.max(1.0);
        }
        if let Some(v) = layout.level_height {
            config.layout.level_height = v.max(1.0);
        }
        if let Some(v) = layout.top_margin {
            config.layout.top_margin = v;
        }
        if let Some(v) = layout.canvas_width {
            config.layout.canvas_width = v.max(1.0);
        }
        if let Some(v) = layout.canvas_height {
            config.layout.canvas_height = v.max(1.0);
        }
        if let Some(v) = layout.node_radius {
            config.layout.node_radius = v.max(1.0);
        }
        if let Some(v) = layout.viewport_padding {
            config.layout.viewport_padding = v;
        }
    }

    if let Some(timing) = parsed.timing {
        if let Some(v) = timing.search_ms {
            config.timing.search_ms = v;
        }
        if let Some(v) = timing.validate_ms {
            config.timing.validate_ms = v;
        }
        if let Some(v) = timing.stagger_ms {
            config.timing.stagger_ms = v;
        }
        if let Some(v) = timing.inter_step_ms {
            config.timing.inter_step_ms = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.min_height {
            config.render.min_height = v;
        }
        if let Some(v) = render.empty_message {
            config.render.empty_message = v;
        }
        if let Some(v) = render.hover_scale {
            config.render.hover_scale = v;
        }
    }

    Ok(config)
}

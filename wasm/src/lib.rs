use rbtree_viz::config::Config;
use rbtree_viz::theme::Theme;
use rbtree_viz::{TreeData, render_tree_svg};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
}

fn build_config(options: TreeRenderOptions) -> Config {
    let mut config = Config::default();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::by_name) {
        config.theme = theme;
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    if let Some(width) = options.width {
        config.render.width = width;
        config.layout.canvas_width = width;
    }
    if let Some(height) = options.height {
        config.render.height = height;
        config.layout.canvas_height = height;
    }
    config
}

/// Renders a `{ "tree": .. }` body to SVG.
#[wasm_bindgen]
pub fn render_tree_svg_json(tree_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<TreeRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        TreeRenderOptions::default()
    };
    let data: TreeData =
        serde_json::from_str(tree_json).map_err(|error| JsValue::from_str(&error.to_string()))?;
    Ok(render_tree_svg(&data, &build_config(options)))
}

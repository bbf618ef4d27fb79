use serde::{Deserialize, Serialize};

use crate::ir::ColorTag;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub red_fill: String,
    pub red_stroke: String,
    pub black_fill: String,
    pub black_stroke: String,
    pub node_text_color: String,
    pub edge_color: String,
    pub edge_opacity: f32,
    pub selected_stroke: String,
    pub search_stroke: String,
    pub validation_ok_stroke: String,
    pub validation_err_stroke: String,
    pub placeholder_color: String,
    pub error_color: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            background: "#FFFFFF".to_string(),
            red_fill: "#EF4444".to_string(),
            red_stroke: "#B91C1C".to_string(),
            black_fill: "#1F2937".to_string(),
            black_stroke: "#111827".to_string(),
            node_text_color: "#FFFFFF".to_string(),
            edge_color: "#64748B".to_string(),
            edge_opacity: 0.7,
            selected_stroke: "#3B82F6".to_string(),
            search_stroke: "#F59E0B".to_string(),
            validation_ok_stroke: "#10B981".to_string(),
            validation_err_stroke: "#EF4444".to_string(),
            placeholder_color: "#6B7280".to_string(),
            error_color: "#EF4444".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            background: "#0F172A".to_string(),
            red_fill: "#DC2626".to_string(),
            red_stroke: "#FCA5A5".to_string(),
            black_fill: "#020617".to_string(),
            black_stroke: "#94A3B8".to_string(),
            node_text_color: "#F8FAFC".to_string(),
            edge_color: "#94A3B8".to_string(),
            edge_opacity: 0.7,
            selected_stroke: "#60A5FA".to_string(),
            search_stroke: "#FBBF24".to_string(),
            validation_ok_stroke: "#34D399".to_string(),
            validation_err_stroke: "#F87171".to_string(),
            placeholder_color: "#94A3B8".to_string(),
            error_color: "#F87171".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "classic" | "default" | "light" => Some(Self::classic()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }

    pub fn fill_for(&self, color: ColorTag) -> &str {
        match color {
            ColorTag::Red => &self.red_fill,
            ColorTag::Black => &self.black_fill,
        }
    }

    pub fn stroke_for(&self, color: ColorTag) -> &str {
        match color {
            ColorTag::Red => &self.red_stroke,
            ColorTag::Black => &self.black_stroke,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

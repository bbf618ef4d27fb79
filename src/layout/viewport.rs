use serde::Serialize;

use crate::config::RenderConfig;

/// Rectangle in layout space the surface is scaled/translated to show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const DEFAULT: Viewport = Viewport {
        x: 0.0,
        y: 0.0,
        width: 800.0,
        height: 600.0,
    };

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    pub fn to_view_box(&self) -> String {
        format!("{} {} {} {}", self.x, self.y, self.width, self.height)
    }

    /// Maps a point on a surface of size `display` back into layout space,
    /// assuming the viewport is scaled uniformly and centred ("meet").
    pub fn screen_to_layout(&self, display: &DisplaySize, sx: f32, sy: f32) -> (f32, f32) {
        if self.width <= 0.0 || self.height <= 0.0 {
            return (self.x + sx, self.y + sy);
        }
        let scale = (display.width / self.width).min(display.height / self.height);
        let offset_x = (display.width - self.width * scale) / 2.0;
        let offset_y = (display.height - self.height * scale) / 2.0;
        (
            self.x + (sx - offset_x) / scale,
            self.y + (sy - offset_y) / scale,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Bounding box of `positions` grown by `padding` on every side.
pub fn fit_viewport<I>(positions: I, padding: f32) -> Viewport
where
    I: IntoIterator<Item = (f32, f32)>,
{
    let mut bounds: Option<(f32, f32, f32, f32)> = None;
    for (x, y) in positions {
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }
    let Some((min_x, min_y, max_x, max_y)) = bounds else {
        return Viewport::DEFAULT;
    };
    Viewport {
        x: min_x - padding,
        y: min_y - padding,
        width: (max_x - min_x) + 2.0 * padding,
        height: (max_y - min_y) + 2.0 * padding,
    }
}

/// Size the host surface is displayed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

/// Keeps the viewport's aspect ratio at the configured width, never dropping
/// below the configured minimum height.
pub fn display_size(viewport: &Viewport, render: &RenderConfig) -> DisplaySize {
    let width = render.width.max(1.0);
    let scaled = if viewport.width > 0.0 {
        viewport.height * width / viewport.width
    } else {
        render.height
    };
    DisplaySize {
        width,
        height: scaled.max(render.min_height),
    }
}

//! Card geometry. Everything here is a pure function of the source size,
//! the swatch count and the configuration, never of the palette colors.

use crate::config::Config;
use crate::error::{PaletteError, Result};

/// Panel position on the background, top-left anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PanelRect {
    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.width as f32 / 2.0
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CardLayout {
    pub width: u32,
    pub height: u32,
    pub panel: PanelRect,
    /// Swatch centers in background coordinates.
    pub swatches: Vec<(f32, f32)>,
    /// Top edge of the hex labels.
    pub label_top: f32,
    /// Top edge of the title.
    pub title_top: f32,
}

impl CardLayout {
    pub fn compute(source_width: u32, source_height: u32, swatch_count: usize, config: &Config) -> Result<Self> {
        let (width, height) = backdrop_size(
            source_width,
            source_height,
            config.display_width,
            config.max_composite_pixels,
        )?;
        let panel = panel_rect(width, height, config);
        let swatches = swatch_centers(&panel, swatch_count, config);
        let layout = Self {
            width,
            height,
            panel,
            swatches,
            label_top: (panel.bottom() - config.label_offset) as f32,
            title_top: config.title_top as f32,
        };
        tracing::debug!(
            width,
            height,
            panel = ?layout.panel,
            swatches = layout.swatches.len(),
            "Computed card layout"
        );
        Ok(layout)
    }
}

/// Scale to `display_width`, keeping the aspect ratio:
/// `height = round(source_height * display_width / source_width)`.
///
/// A canvas larger than `max_pixels` is rejected before anything is allocated.
pub fn backdrop_size(
    source_width: u32,
    source_height: u32,
    display_width: u32,
    max_pixels: u64,
) -> Result<(u32, u32)> {
    if source_width == 0 || source_height == 0 {
        return Err(PaletteError::Render(format!(
            "cannot scale a {source_width}x{source_height} image"
        )));
    }
    if display_width == 0 {
        return Err(PaletteError::Render("display width is zero".to_string()));
    }
    let height = (source_height as f64 * display_width as f64 / source_width as f64)
        .round()
        .max(1.0);
    let pixels = height * display_width as f64;
    if height > u32::MAX as f64 || pixels > max_pixels as f64 {
        return Err(PaletteError::ResourceExceeded {
            what: "composite pixel count",
            actual: pixels as u64,
            max: max_pixels,
        });
    }
    Ok((display_width, height as u32))
}

/// Horizontally centered, `bottom_margin` above the background's bottom edge.
/// On very short backgrounds `y` goes negative and the panel is clipped.
pub fn panel_rect(background_width: u32, background_height: u32, config: &Config) -> PanelRect {
    let width = config.panel_width(background_width);
    PanelRect {
        x: (background_width as i32 - width as i32) / 2,
        y: background_height as i32 - config.panel_height as i32 - config.bottom_margin as i32,
        width,
        height: config.panel_height,
    }
}

/// Evenly spread across the panel between the circle margins. A single
/// swatch sits at the panel's horizontal center.
///
/// Spacing is fractional rather than floored, so five swatches on a 650px
/// panel land at x = 357.5 instead of 357.
pub fn swatch_centers(panel: &PanelRect, count: usize, config: &Config) -> Vec<(f32, f32)> {
    let cy = (panel.y + (panel.height / 2) as i32 - config.swatch_lift) as f32;
    match count {
        0 => Vec::new(),
        1 => vec![(panel.center_x(), cy)],
        n => {
            let margin = config.circle_margin as f32;
            let spacing = (panel.width as f32 - 2.0 * margin) / (n - 1) as f32;
            let left = panel.x as f32 + margin;
            (0..n).map(|i| (left + i as f32 * spacing, cy)).collect()
        }
    }
}

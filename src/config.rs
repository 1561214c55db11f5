use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PaletteError, Result};

/// Color space the quantizer clusters in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// Euclidean distance over 8-bit sRGB channels.
    #[default]
    Rgb,
    /// CIE Lab, perceptually closer but slower.
    Lab,
}

/// Everything that shapes one palette card request.
///
/// Missing keys in a JSON document fall back to [`Config::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Number of colors to extract.
    pub palette_size: usize,
    /// Upper bound accepted for `palette_size`.
    pub max_palette_size: usize,
    pub color_space: ColorSpace,
    pub clustering_max_iterations: usize,
    /// How many times an empty cluster is reseeded before it is dropped.
    pub max_reseed_attempts: usize,
    /// Fixed seed for reproducible clustering. Drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Source images with more pixels than this are rejected.
    pub pixel_count_ceiling: u64,
    /// Downscale so the longest side is at most this before sampling.
    pub sampling_max_side: Option<u32>,
    /// Composites with more pixels than this are rejected before rendering.
    pub max_composite_pixels: u64,

    pub display_width: u32,
    pub panel_max_width: u32,
    pub panel_height: u32,
    pub side_margin: u32,
    pub bottom_margin: u32,
    pub corner_radius: f32,
    pub panel_fill_alpha: u8,
    pub circle_radius: f32,
    pub circle_margin: u32,
    pub halo_width: f32,
    pub halo_alpha: u8,
    /// Swatch centers sit this far above the panel's vertical middle.
    pub swatch_lift: i32,
    /// Label tops sit this far above the panel's bottom edge.
    pub label_offset: i32,
    pub title_top: i32,
    pub backdrop_blur_radius: f32,
    pub panel_blur_radius: f32,
    pub overlay_darken_alpha: u8,

    pub title: String,
    pub title_font_size: f32,
    pub label_font_size: f32,
    /// Preferred bold display families, first match wins.
    pub font_families: Vec<String>,
    pub font_path: Option<PathBuf>,
    pub load_system_fonts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette_size: 5,
            max_palette_size: 64,
            color_space: ColorSpace::Rgb,
            clustering_max_iterations: 300,
            max_reseed_attempts: 10,
            seed: None,
            pixel_count_ceiling: 24_000_000,
            sampling_max_side: None,
            max_composite_pixels: 24_000_000,

            display_width: 1000,
            panel_max_width: 650,
            panel_height: 180,
            side_margin: 20,
            bottom_margin: 30,
            corner_radius: 15.0,
            panel_fill_alpha: 64,
            circle_radius: 25.0,
            circle_margin: 40,
            halo_width: 3.0,
            halo_alpha: 200,
            swatch_lift: 30,
            label_offset: 50,
            title_top: 20,
            backdrop_blur_radius: 10.0,
            panel_blur_radius: 5.0,
            overlay_darken_alpha: 128,

            title: "Color Palette".to_string(),
            title_font_size: 48.0,
            label_font_size: 20.0,
            font_families: vec!["DejaVu Sans".to_string()],
            font_path: None,
            load_system_fonts: true,
        }
    }
}

impl Config {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| PaletteError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PaletteError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_json_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Check the palette size requested for this run against the configured bounds.
    pub fn check_palette_size(&self, k: usize) -> Result<()> {
        if k < 1 {
            return Err(PaletteError::InvalidArgument(
                "palette size must be at least 1".to_string(),
            ));
        }
        if k > self.max_palette_size {
            return Err(PaletteError::ResourceExceeded {
                what: "palette size",
                actual: k as u64,
                max: self.max_palette_size as u64,
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(PaletteError::InvalidConfig(msg));

        // Cluster indices are stored as u8 by the Lab quantizer.
        if self.max_palette_size == 0 || self.max_palette_size > 256 {
            return invalid(format!(
                "maxPaletteSize must be within 1..=256, got {}",
                self.max_palette_size
            ));
        }
        self.check_palette_size(self.palette_size)?;
        if self.clustering_max_iterations == 0 {
            return invalid("clusteringMaxIterations must be at least 1".to_string());
        }
        if self.pixel_count_ceiling == 0 {
            return invalid("pixelCountCeiling must be at least 1".to_string());
        }
        if self.max_composite_pixels == 0 {
            return invalid("maxCompositePixels must be at least 1".to_string());
        }
        if self.sampling_max_side == Some(0) {
            return invalid("samplingMaxSide must be at least 1".to_string());
        }
        if self.display_width <= 2 * self.side_margin {
            return invalid(format!(
                "displayWidth {} leaves no room for side margins of {}",
                self.display_width, self.side_margin
            ));
        }
        let panel_width = self.panel_width(self.display_width);
        if panel_width <= 2 * self.circle_margin {
            return invalid(format!(
                "panel width {panel_width} leaves no room for circle margins of {}",
                self.circle_margin
            ));
        }
        if self.panel_height == 0 {
            return invalid("panelHeight must be at least 1".to_string());
        }
        for (name, v) in [
            ("circleRadius", self.circle_radius),
            ("haloWidth", self.halo_width),
            ("cornerRadius", self.corner_radius),
            ("backdropBlurRadius", self.backdrop_blur_radius),
            ("panelBlurRadius", self.panel_blur_radius),
            ("titleFontSize", self.title_font_size),
            ("labelFontSize", self.label_font_size),
        ] {
            if !v.is_finite() || v < 0.0 {
                return invalid(format!("{name} must be a non-negative number, got {v}"));
            }
        }
        Ok(())
    }

    /// `min(panelMaxWidth, backgroundWidth - 2 * sideMargin)`.
    pub fn panel_width(&self, background_width: u32) -> u32 {
        self.panel_max_width
            .min(background_width.saturating_sub(2 * self.side_margin))
    }
}

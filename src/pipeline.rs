use image::DynamicImage;

use crate::caption::create_color_caption;
use crate::config::Config;
use crate::error::Result;
use crate::quantize::{Palette, Quantizer, quantizer_for};
use crate::render::{FontBook, PaletteRenderer, encode_png};
use crate::sampler::{SamplerOptions, decode_image, sample_pixels};

/// Everything produced for one image.
#[derive(Debug, Clone)]
pub struct PaletteCard {
    pub palette: Palette,
    pub caption: String,
    /// PNG-encoded composite.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// decode → sample → quantize → caption → render → encode.
///
/// A card is only returned once every step has succeeded.
pub struct PaletteCardPipeline {
    config: Config,
    quantizer: Box<dyn Quantizer>,
    renderer: PaletteRenderer,
}

impl PaletteCardPipeline {
    /// Quantizer and fonts are picked from `config`.
    pub fn new(config: Config) -> Result<Self> {
        let quantizer = quantizer_for(&config);
        let fonts = FontBook::from_config(&config);
        Self::with_parts(config, quantizer, fonts)
    }

    /// Inject a specific quantizer and font book, e.g. a seeded quantizer and
    /// an empty font book in tests.
    pub fn with_parts(config: Config, quantizer: Box<dyn Quantizer>, fonts: FontBook) -> Result<Self> {
        config.validate()?;
        let renderer = PaletteRenderer::new(config.clone(), fonts);
        Ok(Self {
            config,
            quantizer,
            renderer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self, bytes: &[u8]) -> Result<PaletteCard> {
        let image = decode_image(bytes, self.config.pixel_count_ceiling)?;
        self.run_image(&image)
    }

    pub fn run_image(&self, image: &DynamicImage) -> Result<PaletteCard> {
        let k = self.config.palette_size;
        self.config.check_palette_size(k)?;

        let samples = sample_pixels(
            image,
            &SamplerOptions {
                pixel_count_ceiling: self.config.pixel_count_ceiling,
                max_side: self.config.sampling_max_side,
            },
        )?;
        let palette = self.quantizer.cluster(&samples, k)?;
        let caption = create_color_caption(&palette);
        let composite = self.renderer.render(image, &palette)?;
        let png = encode_png(&composite)?;

        tracing::info!(
            source_width = image.width(),
            source_height = image.height(),
            colors = palette.len(),
            width = composite.width(),
            height = composite.height(),
            png_bytes = png.len(),
            "Rendered palette card"
        );

        Ok(PaletteCard {
            width: composite.width(),
            height: composite.height(),
            palette,
            caption,
            png,
        })
    }
}

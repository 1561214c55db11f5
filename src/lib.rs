//! Extract a small color palette from an image and render it as a branded
//! card: labeled swatches on a frosted panel over a blurred, darkened copy
//! of the source image.
//!
//! The same pipeline backs the wasm export [`palette_card`], the native
//! [`palette_card_bytes`] helper and the `palette-card-cli` binary.

use js_sys::{Array, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

pub mod caption;
pub mod color;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod quantize;
pub mod render;
pub mod request;
pub mod sampler;

pub use caption::create_color_caption;
pub use color::{Color, parse_hex, rgb_to_hex};
pub use config::{ColorSpace, Config};
pub use error::{PaletteError, Result};
pub use pipeline::{PaletteCard, PaletteCardPipeline};
pub use quantize::{KMeans, LabKMeans, Palette, Quantizer, quantizer_for};
pub use render::{FontBook, PaletteRenderer, encode_png};
pub use request::{FileSource, ImageSource, ResponseSink, TempUpload, handle_request};
pub use sampler::{SampleCollection, SamplerOptions, decode_image, sample_pixels};

/// Build a palette card from an encoded image.
///
/// Returns an object with:
/// - `image`: PNG bytes of the card (`Uint8Array`)
/// - `palette`: `#rrggbb` strings in cluster order
/// - `caption`: one `"<n>. <hex> - RGB(r, g, b)"` line per color
///
/// Browsers have no host fonts to fall back on, so titles and labels are
/// only drawn when `font` carries TTF/OTF data.
#[wasm_bindgen]
pub fn palette_card(input: Vec<u8>, n_colors: usize, font: Option<Vec<u8>>) -> std::result::Result<Object, JsValue> {
    let config = Config {
        palette_size: n_colors,
        load_system_fonts: false,
        ..Config::default()
    };
    let fonts = match font {
        Some(data) => FontBook::from_font_data(data, &config.font_families),
        None => FontBook::empty(),
    };
    let quantizer = quantizer_for(&config);
    let pipeline = PaletteCardPipeline::with_parts(config, quantizer, fonts)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let card = pipeline
        .run(&input)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let img_js = Uint8Array::from(card.png.as_slice());
    let palette_js = Array::new();
    for color in card.palette.iter() {
        palette_js.push(&JsValue::from_str(&color.to_hex()));
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("image"), &img_js)?;
    Reflect::set(&result, &JsValue::from_str("palette"), &palette_js)?;
    Reflect::set(&result, &JsValue::from_str("caption"), &JsValue::from_str(&card.caption))?;

    Ok(result)
}

/// Native counterpart of [`palette_card`]: returns the PNG, the palette as
/// hex strings and the caption. Uses the default configuration with
/// `n_colors` swatches; `seed` makes the clustering reproducible.
#[cfg(not(target_arch = "wasm32"))]
pub fn palette_card_bytes(
    input: &[u8],
    n_colors: usize,
    seed: Option<u64>,
) -> Result<(Vec<u8>, Vec<String>, String)> {
    let config = Config {
        palette_size: n_colors,
        seed,
        ..Config::default()
    };
    let card = PaletteCardPipeline::new(config)?.run(input)?;
    let palette_hex = card.palette.iter().map(|c| c.to_hex()).collect();
    Ok((card.png, palette_hex, card.caption))
}

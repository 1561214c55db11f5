use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageReader, imageops::FilterType};

use crate::color::Color;
use crate::error::{PaletteError, Result};

/// Flat, position-free RGB samples taken from an image, one per pixel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleCollection {
    samples: Vec<Color>,
}

impl SampleCollection {
    pub fn new(samples: Vec<Color>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[Color] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.samples.iter()
    }
}

impl FromIterator<Color> for SampleCollection {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Limits applied while sampling.
#[derive(Clone, Copy, Debug)]
pub struct SamplerOptions {
    pub pixel_count_ceiling: u64,
    pub max_side: Option<u32>,
}

/// Decode raw bytes into an image, guessing the format from the content.
///
/// The header dimensions are checked against `pixel_count_ceiling` before any
/// pixel data is allocated.
pub fn decode_image(bytes: &[u8], pixel_count_ceiling: u64) -> Result<DynamicImage> {
    let (w, h) = guessed_reader(bytes)?
        .into_dimensions()
        .map_err(|e| PaletteError::Decode(e.to_string()))?;
    check_pixel_count(w, h, pixel_count_ceiling)?;

    let img = guessed_reader(bytes)?
        .decode()
        .map_err(|e| PaletteError::Decode(e.to_string()))?;
    tracing::debug!(width = img.width(), height = img.height(), color = ?img.color(), "Decoded image");
    Ok(img)
}

fn guessed_reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PaletteError::Decode(e.to_string()))?;
    if reader.format().is_none() {
        return Err(PaletteError::Decode("unrecognised image format".to_string()));
    }
    Ok(reader)
}

fn check_pixel_count(width: u32, height: u32, ceiling: u64) -> Result<()> {
    let pixel_count = width as u64 * height as u64;
    if pixel_count > ceiling {
        return Err(PaletteError::ResourceExceeded {
            what: "pixel count",
            actual: pixel_count,
            max: ceiling,
        });
    }
    Ok(())
}

/// Turn an image into a [`SampleCollection`].
///
/// Grayscale, RGB and RGBA layouts (8/16-bit and float) are normalised to
/// 8-bit RGB. Alpha is dropped, not used as a weight or a filter.
pub fn sample_pixels(image: &DynamicImage, options: &SamplerOptions) -> Result<SampleCollection> {
    let (w, h) = image.dimensions();
    check_pixel_count(w, h, options.pixel_count_ceiling)?;

    let rgb = match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_)
        | DynamicImage::ImageRgb32F(_)
        | DynamicImage::ImageRgba32F(_) => match downscale_for_sampling(image, options.max_side) {
            Some(small) => small.to_rgb8(),
            None => image.to_rgb8(),
        },
        other => {
            return Err(PaletteError::UnsupportedFormat(format!(
                "{:?} cannot be normalised to RGB",
                other.color()
            )));
        }
    };

    let samples: SampleCollection = rgb
        .pixels()
        .map(|p| Color::new(p.0[0], p.0[1], p.0[2]))
        .collect();
    tracing::debug!(samples = samples.len(), "Sampled pixels");
    Ok(samples)
}

/// `None` when the image already fits within `max_side`.
fn downscale_for_sampling(image: &DynamicImage, max_side: Option<u32>) -> Option<DynamicImage> {
    let (w, h) = image.dimensions();
    match max_side {
        Some(max_side) if w.max(h) > max_side => {
            let ratio = max_side as f32 / w.max(h) as f32;
            let nw = ((w as f32) * ratio).round().max(1.0) as u32;
            let nh = ((h as f32) * ratio).round().max(1.0) as u32;
            Some(image.resize_exact(nw, nh, FilterType::Nearest))
        }
        _ => None,
    }
}

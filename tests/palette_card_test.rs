//! End-to-end tests: encoded image bytes in, palette card out.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use image_to_palette_card::{
    Color, ColorSpace, Config, FontBook, KMeans, LabKMeans, PaletteCardPipeline, PaletteError,
    parse_hex, quantizer_for,
};
use pretty_assertions::assert_eq;

const RED: Rgb<u8> = Rgb([220, 30, 40]);
const GREEN: Rgb<u8> = Rgb([30, 200, 60]);
const BLUE: Rgb<u8> = Rgb([20, 40, 210]);

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn banded(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| match x * 3 / width {
        0 => RED,
        1 => GREEN,
        _ => BLUE,
    }))
}

fn pipeline(config: Config) -> PaletteCardPipeline {
    PaletteCardPipeline::with_parts(config, Box::new(KMeans::seeded(17)), FontBook::empty()).unwrap()
}

fn config_with_k(k: usize) -> Config {
    Config {
        palette_size: k,
        load_system_fonts: false,
        ..Config::default()
    }
}

fn sorted_hex(colors: &[Color]) -> Vec<String> {
    let mut hex: Vec<String> = colors.iter().map(|c| c.to_hex()).collect();
    hex.sort();
    hex
}

#[test]
fn test_1200x800_with_three_colors() {
    let bytes = encode(banded(1200, 800), ImageFormat::Png);
    let card = pipeline(config_with_k(3)).run(&bytes).unwrap();

    assert_eq!((card.width, card.height), (1000, 667));
    assert_eq!(card.caption.lines().count(), 3);
    assert_eq!(
        sorted_hex(card.palette.colors()),
        vec!["#1428d2".to_string(), "#1ec83c".to_string(), "#dc1e28".to_string()]
    );

    let decoded = image::load_from_memory(&card.png).unwrap();
    assert_eq!(decoded.dimensions(), (1000, 667));
}

#[test]
fn test_caption_lines_parse_back_to_palette() {
    let bytes = encode(banded(300, 90), ImageFormat::Png);
    let card = pipeline(config_with_k(3)).run(&bytes).unwrap();

    for (i, line) in card.caption.lines().enumerate() {
        let (prefix, rest) = line.split_once(". ").unwrap();
        assert_eq!(prefix, (i + 1).to_string());
        let (hex, rgb) = rest.split_once(" - ").unwrap();
        let color = parse_hex(hex).unwrap();
        assert_eq!(color, card.palette.colors()[i]);
        assert_eq!(rgb, format!("RGB({}, {}, {})", color.r, color.g, color.b));
    }
}

#[test]
fn test_single_color_image_with_k5() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([90, 120, 150])));
    let card = pipeline(config_with_k(5))
        .run(&encode(img, ImageFormat::Png))
        .unwrap();

    assert_eq!(card.palette.colors(), &[Color::new(90, 120, 150)]);
    assert_eq!(card.caption, "1. #5a7896 - RGB(90, 120, 150)");
    assert_eq!((card.width, card.height), (1000, 750));
}

#[test]
fn test_k1_swatch_is_centered() {
    let bytes = encode(banded(1200, 800), ImageFormat::Png);
    let card = pipeline(config_with_k(1)).run(&bytes).unwrap();
    assert_eq!(card.palette.len(), 1);

    let c = card.palette.colors()[0];
    let decoded = image::load_from_memory(&card.png).unwrap().to_rgb8();
    assert_eq!(decoded.get_pixel(500, 517).0, [c.r, c.g, c.b]);
    // same canvas and panel as with three colors
    assert_eq!((card.width, card.height), (1000, 667));
}

#[test]
fn test_rgba_jpeg_and_grayscale_inputs() {
    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 20, Rgba([10, 20, 30, 0])));
    let card = pipeline(config_with_k(2))
        .run(&encode(rgba, ImageFormat::Png))
        .unwrap();
    assert_eq!(card.palette.colors(), &[Color::new(10, 20, 30)]);

    let jpeg = encode(banded(90, 60), ImageFormat::Jpeg);
    let card = pipeline(config_with_k(3)).run(&jpeg).unwrap();
    assert_eq!(card.palette.len(), 3);
    assert_eq!((card.width, card.height), (1000, 667));

    let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(10, 10, image::Luma([200])));
    let card = pipeline(config_with_k(3))
        .run(&encode(gray, ImageFormat::Png))
        .unwrap();
    assert_eq!(card.palette.colors(), &[Color::new(200, 200, 200)]);
}

#[test]
fn test_lab_space_pipeline() {
    let config = Config {
        color_space: ColorSpace::Lab,
        seed: Some(3),
        ..config_with_k(3)
    };
    let card = PaletteCardPipeline::with_parts(
        config.clone(),
        Box::new(LabKMeans::default().with_seed(config.seed)),
        FontBook::empty(),
    )
    .unwrap()
    .run(&encode(banded(120, 60), ImageFormat::Png))
    .unwrap();
    assert_eq!(card.palette.len(), 3);

    // config-selected quantizer works the same way
    let card = PaletteCardPipeline::with_parts(config.clone(), quantizer_for(&config), FontBook::empty())
        .unwrap()
        .run(&encode(banded(120, 60), ImageFormat::Png))
        .unwrap();
    assert_eq!(card.palette.len(), 3);
}

#[test]
fn test_pixel_ceiling_is_enforced() {
    let config = Config {
        pixel_count_ceiling: 1_000,
        ..config_with_k(3)
    };
    let err = pipeline(config)
        .run(&encode(banded(100, 100), ImageFormat::Png))
        .unwrap_err();
    assert!(matches!(err, PaletteError::ResourceExceeded { actual: 10_000, .. }));
}

#[test]
fn test_palette_size_outside_bounds_is_rejected() {
    let err = PaletteCardPipeline::with_parts(config_with_k(0), Box::new(KMeans::default()), FontBook::empty())
        .err()
        .unwrap();
    assert!(matches!(err, PaletteError::InvalidArgument(_)));

    let err = PaletteCardPipeline::with_parts(config_with_k(65), Box::new(KMeans::default()), FontBook::empty())
        .err()
        .unwrap();
    assert!(matches!(err, PaletteError::ResourceExceeded { .. }));
}

#[test]
fn test_garbage_bytes_are_decode_errors() {
    let err = pipeline(config_with_k(3)).run(b"GIF89a but not really").unwrap_err();
    assert!(matches!(err, PaletteError::Decode(_)));
}

#[test]
fn test_native_bytes_helper() {
    let bytes = encode(banded(60, 30), ImageFormat::Png);
    let (png, palette, caption) = image_to_palette_card::palette_card_bytes(&bytes, 3, Some(9)).unwrap();
    assert_eq!(palette.len(), 3);
    assert_eq!(caption.lines().count(), 3);
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.dimensions(), (1000, 500));
}

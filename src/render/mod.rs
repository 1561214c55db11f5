//! Palette card compositing.
//!
//! The card is drawn in five ordered stages over a [`Canvas`]:
//! 1. backdrop: the source scaled to the display width, blurred and darkened
//! 2. panel: a frosted rounded rectangle near the bottom
//! 3. swatches: one haloed circle per palette color
//! 4. labels: the hex code under each swatch
//! 5. title: centered near the top
//!
//! Each stage is a free function so it can be exercised on its own.

mod fonts;
mod layout;
mod text;

pub use fonts::FontBook;
pub use layout::{CardLayout, PanelRect, backdrop_size, panel_rect, swatch_centers};
pub use text::TextRun;

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage, imageops, imageops::FilterType};
use tiny_skia::{
    FillRule, IntSize, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Transform,
};

use crate::config::Config;
use crate::error::{PaletteError, Result};
use crate::quantize::Palette;

/// Cubic Bézier control distance for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Premultiplied RGBA drawing surface the stages paint on.
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha copy of the canvas.
    pub fn to_image(&self) -> Result<RgbaImage> {
        let mut buf = Vec::with_capacity(self.pixmap.data().len());
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            buf.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), buf)
            .ok_or_else(|| PaletteError::Render("canvas buffer size mismatch".to_string()))
    }
}

/// Draws palette cards. Holds its configuration and fonts so repeated
/// renders share them.
#[derive(Debug, Clone)]
pub struct PaletteRenderer {
    config: Config,
    fonts: FontBook,
}

impl PaletteRenderer {
    pub fn new(config: Config, fonts: FontBook) -> Self {
        Self { config, fonts }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Composite `palette` over `source`. Nothing is returned unless every
    /// stage succeeded.
    pub fn render(&self, source: &DynamicImage, palette: &Palette) -> Result<RgbaImage> {
        if palette.is_empty() {
            return Err(PaletteError::InvalidArgument(
                "cannot render an empty palette".to_string(),
            ));
        }
        let layout = CardLayout::compute(source.width(), source.height(), palette.len(), &self.config)?;

        let mut canvas = draw_backdrop(source, &layout, &self.config)?;
        draw_panel(&mut canvas, &layout.panel, &self.config)?;
        draw_swatches(&mut canvas, &layout, palette, &self.config);
        draw_labels(&mut canvas, &layout, palette, &self.config, &self.fonts)?;
        draw_title(&mut canvas, &layout, &self.config, &self.fonts)?;

        canvas.to_image()
    }
}

/// Stage 1: scaled, blurred, uniformly darkened copy of the source.
pub fn draw_backdrop(source: &DynamicImage, layout: &CardLayout, config: &Config) -> Result<Canvas> {
    let (w, h) = (layout.width, layout.height);
    let resized = source.resize_exact(w, h, FilterType::Lanczos3).to_rgb8();
    let blurred = if config.backdrop_blur_radius > 0.0 {
        imageops::blur(&resized, config.backdrop_blur_radius)
    } else {
        resized
    };
    let opaque = DynamicImage::ImageRgb8(blurred).to_rgba8();

    let size = IntSize::from_wh(w, h)
        .ok_or_else(|| PaletteError::Render(format!("invalid backdrop size {w}x{h}")))?;
    let mut pixmap = Pixmap::from_vec(opaque.into_raw(), size)
        .ok_or_else(|| PaletteError::Render(format!("cannot allocate {w}x{h} canvas")))?;

    let rect = Rect::from_xywh(0.0, 0.0, w as f32, h as f32)
        .ok_or_else(|| PaletteError::Render("invalid overlay rectangle".to_string()))?;
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, config.overlay_darken_alpha);
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);

    Ok(Canvas { pixmap })
}

/// Stage 2: frosted translucent panel.
pub fn draw_panel(canvas: &mut Canvas, panel: &PanelRect, config: &Config) -> Result<()> {
    if panel.width == 0 || panel.height == 0 {
        return Ok(());
    }
    let mut layer = Pixmap::new(panel.width, panel.height).ok_or_else(|| {
        PaletteError::Render(format!("cannot allocate {}x{} panel", panel.width, panel.height))
    })?;
    let rect = Rect::from_xywh(0.0, 0.0, panel.width as f32, panel.height as f32)
        .ok_or_else(|| PaletteError::Render("invalid panel rectangle".to_string()))?;
    let path = rounded_rect(rect, config.corner_radius)
        .ok_or_else(|| PaletteError::Render("invalid panel outline".to_string()))?;

    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, config.panel_fill_alpha);
    paint.anti_alias = true;
    layer.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

    let layer = blur_pixmap(layer, config.panel_blur_radius)?;
    canvas.pixmap.draw_pixmap(
        panel.x,
        panel.y,
        layer.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(())
}

/// Stage 3: a light halo under an opaque circle of the exact palette color.
pub fn draw_swatches(canvas: &mut Canvas, layout: &CardLayout, palette: &Palette, config: &Config) {
    for (&(cx, cy), color) in layout.swatches.iter().zip(palette.iter()) {
        fill_circle(
            &mut canvas.pixmap,
            cx,
            cy,
            config.circle_radius + config.halo_width,
            [255, 255, 255, config.halo_alpha],
        );
        fill_circle(
            &mut canvas.pixmap,
            cx,
            cy,
            config.circle_radius,
            [color.r, color.g, color.b, 255],
        );
    }
}

/// Stage 4: hex code centered under each swatch.
pub fn draw_labels(
    canvas: &mut Canvas,
    layout: &CardLayout,
    palette: &Palette,
    config: &Config,
    fonts: &FontBook,
) -> Result<()> {
    let runs: Vec<TextRun> = layout
        .swatches
        .iter()
        .zip(palette.iter())
        .map(|(&(cx, _), color)| TextRun {
            text: color.to_hex(),
            center_x: cx,
            top: layout.label_top,
            size: config.label_font_size,
        })
        .collect();
    text::draw_text(&mut canvas.pixmap, fonts, &runs)
}

/// Stage 5: title centered near the top.
pub fn draw_title(canvas: &mut Canvas, layout: &CardLayout, config: &Config, fonts: &FontBook) -> Result<()> {
    if config.title.is_empty() {
        return Ok(());
    }
    let run = TextRun {
        text: config.title.clone(),
        center_x: layout.width as f32 / 2.0,
        top: layout.title_top,
        size: config.title_font_size,
    };
    text::draw_text(&mut canvas.pixmap, fonts, &[run])
}

/// Lossless PNG of the finished card. The card is opaque, so alpha is dropped.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buf = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buf);
        rgb.write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| PaletteError::Render(format!("PNG encode error: {e}")))?;
    }
    Ok(buf)
}

fn fill_circle(pixmap: &mut Pixmap, cx: f32, cy: f32, radius: f32, rgba: [u8; 4]) {
    let Some(path) = PathBuilder::from_circle(cx, cy, radius) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
}

fn rounded_rect(rect: Rect, radius: f32) -> Option<Path> {
    let r = radius.min(rect.width() / 2.0).min(rect.height() / 2.0);
    if r <= 0.0 {
        return Some(PathBuilder::from_rect(rect));
    }
    let (l, t, rt, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    let k = r * KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(l + r, t);
    pb.line_to(rt - r, t);
    pb.cubic_to(rt - r + k, t, rt, t + r - k, rt, t + r);
    pb.line_to(rt, b - r);
    pb.cubic_to(rt, b - r + k, rt - r + k, b, rt - r, b);
    pb.line_to(l + r, b);
    pb.cubic_to(l + r - k, b, l, b - r + k, l, b - r);
    pb.line_to(l, t + r);
    pb.cubic_to(l, t + r - k, l + r - k, t, l + r, t);
    pb.close();
    pb.finish()
}

/// Gaussian blur applied directly to the premultiplied channels.
fn blur_pixmap(pixmap: Pixmap, sigma: f32) -> Result<Pixmap> {
    if sigma <= 0.0 {
        return Ok(pixmap);
    }
    let (w, h) = (pixmap.width(), pixmap.height());
    let buf = RgbaImage::from_raw(w, h, pixmap.take())
        .ok_or_else(|| PaletteError::Render("panel buffer size mismatch".to_string()))?;
    let blurred = imageops::blur(&buf, sigma);
    let size = IntSize::from_wh(w, h)
        .ok_or_else(|| PaletteError::Render(format!("invalid panel size {w}x{h}")))?;
    Pixmap::from_vec(blurred.into_raw(), size)
        .ok_or_else(|| PaletteError::Render("cannot rebuild blurred panel".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use image::{Rgb, RgbImage};

    fn white_source(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([255, 255, 255])))
    }

    fn renderer() -> PaletteRenderer {
        PaletteRenderer::new(Config::default(), FontBook::empty())
    }

    fn rgb_at(img: &RgbaImage, x: f32, y: f32) -> [u8; 4] {
        img.get_pixel(x as u32, y as u32).0
    }

    #[test]
    fn test_output_size_follows_source_aspect() {
        let palette = Palette::from_colors(vec![Color::new(255, 0, 0); 3]);
        let card = renderer().render(&white_source(120, 80), &palette).unwrap();
        assert_eq!(card.dimensions(), (1000, 667));

        let tall = renderer().render(&white_source(50, 100), &palette).unwrap();
        assert_eq!(tall.dimensions(), (1000, 2000));
    }

    #[test]
    fn test_swatch_centers_carry_exact_colors() {
        let colors = vec![Color::new(200, 16, 32), Color::new(3, 140, 90), Color::new(17, 17, 250)];
        let palette = Palette::from_colors(colors.clone());
        let card = renderer().render(&white_source(120, 80), &palette).unwrap();
        let layout = CardLayout::compute(120, 80, 3, &Config::default()).unwrap();
        for (&(cx, cy), c) in layout.swatches.iter().zip(&colors) {
            assert_eq!(rgb_at(&card, cx, cy), [c.r, c.g, c.b, 255]);
        }
    }

    #[test]
    fn test_single_swatch_is_drawn_at_panel_center() {
        let palette = Palette::from_colors(vec![Color::new(10, 200, 30)]);
        let card = renderer().render(&white_source(120, 80), &palette).unwrap();
        assert_eq!(rgb_at(&card, 500.0, 517.0), [10, 200, 30, 255]);
    }

    #[test]
    fn test_backdrop_is_darkened() {
        let palette = Palette::from_colors(vec![Color::new(0, 0, 0)]);
        let card = renderer().render(&white_source(120, 80), &palette).unwrap();
        let [r, g, b, a] = rgb_at(&card, 500.0, 300.0);
        assert_eq!(a, 255);
        for v in [r, g, b] {
            assert!((124..=131).contains(&v), "backdrop value {v}");
        }
    }

    #[test]
    fn test_panel_and_halo_lighten_the_backdrop() {
        let palette = Palette::from_colors(vec![Color::new(0, 0, 0); 3]);
        let card = renderer().render(&white_source(120, 80), &palette).unwrap();
        let backdrop = rgb_at(&card, 500.0, 300.0)[0];
        // inside the panel, away from swatches
        let panel = rgb_at(&card, 300.0, 620.0)[0];
        // on the halo ring just outside the first swatch
        let halo = rgb_at(&card, 215.0 + 26.0, 517.0)[0];
        assert!(panel > backdrop + 10, "panel {panel} vs backdrop {backdrop}");
        assert!(halo > 200, "halo {halo}");
    }

    #[test]
    fn test_empty_palette_is_rejected() {
        let err = renderer()
            .render(&white_source(10, 10), &Palette::from_colors(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, PaletteError::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_sized_source_is_render_error() {
        let palette = Palette::from_colors(vec![Color::new(0, 0, 0)]);
        let err = renderer()
            .render(&DynamicImage::new_rgb8(0, 10), &palette)
            .unwrap_err();
        assert!(matches!(err, PaletteError::Render(_)));
    }

    #[test]
    fn test_short_background_clips_panel_without_failing() {
        let palette = Palette::from_colors(vec![Color::new(1, 2, 3); 4]);
        let card = renderer().render(&white_source(1000, 50), &palette).unwrap();
        assert_eq!(card.dimensions(), (1000, 50));
    }

    #[test]
    fn test_png_encoding_is_lossless() {
        let palette = Palette::from_colors(vec![Color::new(12, 34, 56)]);
        let card = renderer().render(&white_source(40, 40), &palette).unwrap();
        let png = encode_png(&card).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), card.dimensions());
        assert_eq!(decoded, card);
    }

    #[test]
    fn test_rounded_rect_handles_small_and_zero_radius() {
        let rect = Rect::from_xywh(0.0, 0.0, 10.0, 4.0).unwrap();
        assert!(rounded_rect(rect, 15.0).is_some());
        assert!(rounded_rect(rect, 0.0).is_some());
    }
}

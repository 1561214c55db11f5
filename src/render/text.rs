use resvg::usvg;
use tiny_skia::{Pixmap, Transform};

use super::fonts::FontBook;
use crate::error::{PaletteError, Result};

/// Distance from the top of a line to its baseline, as a fraction of the
/// font size.
const ASCENT_RATIO: f32 = 0.93;

/// A single line of white text centered on `center_x`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub center_x: f32,
    pub top: f32,
    pub size: f32,
}

/// Rasterize `runs` onto `pixmap`. Does nothing when no font is available.
pub fn draw_text(pixmap: &mut Pixmap, fonts: &FontBook, runs: &[TextRun]) -> Result<()> {
    let Some(family) = fonts.family() else {
        tracing::debug!(runs = runs.len(), "No font resolved, skipping text");
        return Ok(());
    };
    if runs.is_empty() {
        return Ok(());
    }

    let svg = text_svg(pixmap.width(), pixmap.height(), family, runs);
    let options = usvg::Options {
        fontdb: fonts.database(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &options)
        .map_err(|e| PaletteError::Render(format!("text layout failed: {e}")))?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
    Ok(())
}

fn text_svg(width: u32, height: u32, family: &str, runs: &[TextRun]) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    for run in runs {
        svg.push_str(&format!(
            r##"<text x="{:.2}" y="{:.2}" font-family="'{}'" font-weight="bold" font-size="{:.1}" fill="#ffffff" text-anchor="middle">{}</text>"##,
            run.center_x,
            run.top + run.size * ASCENT_RATIO,
            escape_xml(family),
            run.size,
            escape_xml(&run.text),
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

use crate::quantize::Palette;

/// One line per palette color, 1-indexed:
///
/// ```text
/// 1. #1f2e3d - RGB(31, 46, 61)
/// ```
///
/// Lines are joined with `\n` and there is no trailing newline.
pub fn create_color_caption(palette: &Palette) -> String {
    palette
        .iter()
        .enumerate()
        .map(|(i, color)| {
            format!(
                "{}. {} - RGB({}, {}, {})",
                i + 1,
                color.to_hex(),
                color.r,
                color.g,
                color.b
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

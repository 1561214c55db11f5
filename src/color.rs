use std::fmt;
use std::str::FromStr;

use palette::Srgb;

use crate::error::{PaletteError, Result};

/// An 8-bit sRGB color. Components are `u8`, so they always lie in `[0, 255]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from floating point channels, rounding to the nearest
    /// integer and clamping into `[0, 255]`.
    pub fn from_f32_clamped(rgb: [f32; 3]) -> Self {
        let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        Self::new(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]))
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// `#` followed by six lowercase hex digits.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Srgb<u8>> for Color {
    fn from(c: Srgb<u8>) -> Self {
        Self::new(c.red, c.green, c.blue)
    }
}

impl From<Color> for Srgb<u8> {
    fn from(c: Color) -> Self {
        Srgb::new(c.r, c.g, c.b)
    }
}

impl From<[u8; 3]> for Color {
    fn from(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

/// Format a color the way it is shown on the card and in the caption.
pub fn rgb_to_hex(color: Color) -> String {
    color.to_hex()
}

/// Parse a `#rrggbb` string (either case). Shorthand and unprefixed forms
/// are rejected so that only strings produced by [`rgb_to_hex`] round-trip.
pub fn parse_hex(s: &str) -> Result<Color> {
    let digits = s
        .strip_prefix('#')
        .ok_or_else(|| PaletteError::InvalidArgument(format!("hex color must start with '#': {s:?}")))?;
    if digits.len() != 6 {
        return Err(PaletteError::InvalidArgument(format!(
            "hex color must have 6 digits: {s:?}"
        )));
    }
    let rgb = Srgb::<u8>::from_str(digits)
        .map_err(|e| PaletteError::InvalidArgument(format!("invalid hex color {s:?}: {e}")))?;
    Ok(rgb.into())
}

impl FromStr for Color {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex(s)
    }
}

//! Explicit color model for chart styling.
//!
//! Series colors live as channel structs inside the crate; the CSS string
//! forms (`rgb(...)` / `rgba(...)`) exist only at the rendering boundary.
//! Fill colors are derived from stroke colors by changing alpha, so the
//! derivation works for any color, not just ones that happen to be encoded
//! a particular way as text.

use serde::{Deserialize, Serialize};

/// An RGB color with an alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel, 0-255.
    pub r: u8,
    /// Green channel, 0-255.
    pub g: u8,
    /// Blue channel, 0-255.
    pub b: u8,
    /// Alpha, 0.0-1.0.
    pub a: f32,
}

impl Color {
    /// Fully opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Color from RGB channels and an explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// The same color with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Parse a `#rrggbb` hex literal.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Self::rgb(r, g, b))
    }

    /// CSS form for the rendering layer: `rgb(r, g, b)` when fully opaque,
    /// `rgba(r, g, b, a)` otherwise.
    pub fn to_css(self) -> String {
        if (self.a - 1.0).abs() < f32::EPSILON {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

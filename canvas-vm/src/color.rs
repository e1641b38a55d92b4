//! # Colours
//!
//! Four 8-bit channels. Colour literals in source are bare RGB hex and always
//! come out fully opaque.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ARGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::argb(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color { a, r, g, b }
    }

    /// Fully opaque colour
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { a: 255, r, g, b }
    }

    /// Pack as `0xAARRGGBB`
    pub fn to_argb(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    /// Unpack from `0xAARRGGBB`
    pub fn from_argb(value: u32) -> Self {
        let [a, r, g, b] = value.to_be_bytes();
        Color { a, r, g, b }
    }

    /// Parse 3 or 6 hex digits, with or without a leading `#`.
    ///
    /// Three digits are expanded by doubling each one (`abc` -> `aabbcc`).
    /// Any other length yields `None`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#').unwrap_or(text);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };

        let value = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Color::from_argb(0xFF00_0000 | value))
    }

    /// `#rrggbb` for opaque colours, `#aarrggbb` otherwise
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.a, self.r, self.g, self.b)
        }
    }

    /// Operand bytes of a COLOR_LITERAL instruction.
    ///
    /// The ARGB word is stored with the alpha byte moved behind the colour
    /// channels: `#ff0000` is encoded as `FF 00 00 FF`.
    pub fn to_operand(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Inverse of [`Color::to_operand`]
    pub fn from_operand(bytes: [u8; 4]) -> Self {
        let [r, g, b, a] = bytes;
        Color { a, r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

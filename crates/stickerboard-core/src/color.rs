//! Hex color values as stored in canvas documents.

use peniko::Color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Why a string could not be read as a `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color must start with '#'")]
    MissingPrefix,
    #[error("expected 6 hex digits, found {0} characters")]
    InvalidLength(usize),
    #[error("color contains non-hex digits")]
    InvalidDigits,
}

/// An opaque 24-bit RGB color.
///
/// Documents carry colors as `#rrggbb`. There is no alpha channel on the
/// wire; conversion to [`Color`] always produces an opaque color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#` followed by exactly six hex digits, either case.
    pub fn parse(s: &str) -> Result<Self, ColorParseError> {
        let digits = s.strip_prefix('#').ok_or(ColorParseError::MissingPrefix)?;
        if digits.chars().count() != 6 {
            return Err(ColorParseError::InvalidLength(digits.chars().count()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::InvalidDigits);
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| ColorParseError::InvalidDigits)?;
        Ok(Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        })
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// A random opaque color, for pickers that seed new widgets.
    pub fn random() -> Self {
        Self::new(rand::random(), rand::random(), rand::random())
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for HexColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<HexColor> for Color {
    fn from(color: HexColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, 255)
    }
}

impl From<Color> for HexColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b)
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Renderer fallback for text without an explicit color.
pub fn default_text_color() -> Color {
    Color::from_rgba8(0, 0, 0, 255)
}

/// Renderer fallback for a canvas without a background color.
pub fn default_background() -> Color {
    Color::from_rgba8(255, 255, 255, 255)
}

/// Resolve an optional document color against a renderer default.
pub fn resolve(color: Option<HexColor>, fallback: Color) -> Color {
    color.map(Color::from).unwrap_or(fallback)
}

/// Deserialize an optional color, turning anything unreadable into `None`.
///
/// A bad color is never allowed to fail the surrounding widget or
/// document; it is logged and treated as unset.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<HexColor>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => match HexColor::parse(&s) {
            Ok(color) => Some(color),
            Err(e) => {
                log::warn!("Ignoring color {:?}: {}", s, e);
                None
            }
        },
        Some(other) => {
            log::warn!("Ignoring non-string color value: {}", other);
            None
        }
    })
}

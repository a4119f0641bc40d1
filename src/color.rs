/// Color types and hex parsing shared by the remapper, renderer and serializer
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WaveformError;

/// Opaque RGB triple, as written in color mappings and settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Squared per-channel distance; the metric used for nearest-color lookup
    pub fn distance_squared(&self, other: &Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    pub fn with_alpha(self, a: u8) -> Rgba {
        Rgba::new(self.r, self.g, self.b, a)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = WaveformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Rgba::from_str(s)?.rgb())
    }
}

/// RGBA color; alpha 255 is fully opaque
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`. The `#` is optional and a
/// missing alpha means opaque.
impl FromStr for Rgba {
    type Err = WaveformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let invalid = || WaveformError::InvalidColor(s.to_string());

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());

        match hex.len() {
            3 => {
                let short = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| invalid())
                };
                Ok(Rgba::new(short(0)?, short(1)?, short(2)?, 255))
            }
            6 => Ok(Rgba::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Ok(Rgba::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(invalid()),
        }
    }
}

/// One recoloring step: the palette entry nearest `source` becomes `destination`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMapping {
    pub source: Rgb,
    pub destination: Rgb,
}

impl ColorMapping {
    pub fn new(source: Rgb, destination: Rgb) -> Self {
        ColorMapping { source, destination }
    }
}

/// Accepts `SRC:DST`, e.g. `#ff0000:#00ff00`
impl FromStr for ColorMapping {
    type Err = WaveformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, destination) = s
            .split_once(':')
            .ok_or_else(|| WaveformError::InvalidColor(format!("{} (expected SRC:DST)", s)))?;
        Ok(ColorMapping::new(source.parse()?, destination.parse()?))
    }
}

/// Hex pair as it appears in the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexMapping {
    pub source: String,
    pub destination: String,
}

impl TryFrom<&HexMapping> for ColorMapping {
    type Error = WaveformError;

    fn try_from(hex: &HexMapping) -> Result<Self, Self::Error> {
        Ok(ColorMapping::new(hex.source.parse()?, hex.destination.parse()?))
    }
}

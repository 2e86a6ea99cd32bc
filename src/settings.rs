//! Display-affecting settings and the page scale they imply.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;

/// Opaque RGB background color, written as `#rrggbb` in config and on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{s}' must start with '#'"))?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("color '{s}' must be #rrggbb"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("color '{s}': {e}"))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Settings the shell may change while a document is open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Maximum page width in pixels before zoom.
    pub max_width: u32,
    /// Vertical gap between consecutive pages.
    pub spacing: u32,
    pub background: Color,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_width: 800,
            spacing: 10,
            background: Color::BLACK,
        }
    }
}

/// Inputs of the page scaling rule. Decode results carry the params they were
/// produced with so the View can tell a stale result from a current one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    pub max_width: u32,
    pub zoom: f64,
}

impl ScaleParams {
    pub fn new(max_width: u32, zoom: f64) -> Self {
        Self {
            max_width,
            zoom: clamp_zoom(zoom),
        }
    }
}

pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_color() {
        assert_eq!("#1e1e2e".parse::<Color>(), Ok(Color::rgb(0x1e, 0x1e, 0x2e)));
        assert_eq!(" #FFFFFF ".parse::<Color>(), Ok(Color::rgb(255, 255, 255)));
        assert!("1e1e2e".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn color_display_roundtrips_case_insensitively() {
        let c: Color = "#A0B1C2".parse().unwrap();
        assert_eq!(c.to_string(), "#a0b1c2");
    }

    #[test]
    fn zoom_is_clamped() {
        assert_eq!(ScaleParams::new(800, 100.0).zoom, MAX_ZOOM);
        assert_eq!(ScaleParams::new(800, 0.0).zoom, MIN_ZOOM);
        assert_eq!(ScaleParams::new(800, f64::NAN).zoom, 1.0);
    }
}

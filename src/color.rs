use cssparser::parse_color_keyword;
use serde::{Deserialize, Deserializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parses `rrggbb` or the short `rgb` form, without the leading `#`.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Color::from_rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
        6 => Some(Color::from_rgb(pair(0)?, pair(2)?, pair(4)?)),
        _ => None,
    }
}

/// Accepts `#rgb`, `#rrggbb`, `rgb(r, g, b)` and the CSS color keywords.
pub fn parse_color_str(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix("#") {
        parse_hex_color(hex)
    } else if let Some(rgb) = value.strip_prefix("rgb(") {
        let mut params = rgb.strip_suffix(")")?.split(',').map(|p| p.trim());
        let r = u8::from_str(params.next()?).ok()?;
        let g = u8::from_str(params.next()?).ok()?;
        let b = u8::from_str(params.next()?).ok()?;
        match params.next() {
            None => Some(Color::from_rgb(r, g, b)),
            Some(_) => None,
        }
    } else {
        match parse_color_keyword(value).ok()? {
            cssparser::Color::CurrentColor => None,
            cssparser::Color::RGBA(rgba) => Some(Color::from_rgb(rgba.red, rgba.green, rgba.blue)),
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color_str(s).ok_or_else(|| format!("invalid color: {}", s))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Color::from_str(&value).map_err(serde::de::Error::custom)
    }
}

//! Display colors and the character→color lookup used by the board decoder.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::common::ConfigError;

/// An opaque RGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const RED: Color = Color::rgb(0xe0, 0x1b, 0x24);
    pub const GREEN: Color = Color::rgb(0x2e, 0xc2, 0x7e);
    pub const BLUE: Color = Color::rgb(0x1c, 0x71, 0xd8);
    pub const YELLOW: Color = Color::rgb(0xf6, 0xd3, 0x2d);
    pub const ORANGE: Color = Color::rgb(0xff, 0x78, 0x00);
    pub const PURPLE: Color = Color::rgb(0x91, 0x41, 0xac);
    pub const GRAY: Color = Color::rgb(0x77, 0x76, 0x7b);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn named(name: &str) -> Option<Color> {
        let color = match name.to_ascii_lowercase().as_str() {
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::RED,
            "green" => Color::GREEN,
            "blue" => Color::BLUE,
            "yellow" => Color::YELLOW,
            "orange" => Color::ORANGE,
            "purple" => Color::PURPLE,
            "gray" | "grey" => Color::GRAY,
            _ => return None,
        };
        Some(color)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    /// Parses `#rrggbb` or one of the named colors (`red`, `white`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_owned());
        let Some(hex) = s.strip_prefix('#') else {
            return Color::named(s).ok_or_else(invalid);
        };
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Character→color lookup consumed by the board decoder.
///
/// Implementations must be pure: the same key always resolves to the same
/// color. `None` means the key is not part of the palette.
pub trait Palette {
    fn resolve(&self, key: char) -> Option<Color>;
}

impl<F> Palette for F
where
    F: Fn(char) -> Option<Color>,
{
    fn resolve(&self, key: char) -> Option<Color> {
        self(key)
    }
}

impl Palette for HashMap<char, Color> {
    fn resolve(&self, key: char) -> Option<Color> {
        self.get(&key).copied()
    }
}

/// Key the server uses for wall cells.
pub const WALL_KEY: char = '/';

const PLAYER_COLORS: [Color; 8] = [
    Color::RED,
    Color::WHITE,
    Color::BLUE,
    Color::GREEN,
    Color::YELLOW,
    Color::ORANGE,
    Color::PURPLE,
    Color::BLACK,
];

/// Default palette for the server's player alphabet.
///
/// Players are assigned consecutive characters from `A` through `z` in join
/// order, punctuation between `Z` and `a` included; each gets a color from a
/// fixed rotation. [`WALL_KEY`] renders gray.
/// Explicit overrides take precedence over the rotation.
#[derive(Debug, Clone, Default)]
pub struct PlayerPalette {
    overrides: HashMap<char, Color>,
}

impl PlayerPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `key` to `color`, replacing any earlier override.
    pub fn with_override(mut self, key: char, color: Color) -> Self {
        self.overrides.insert(key, color);
        self
    }

    /// Parse a `KEY=COLOR` override such as `X=red` or `O=#ffffff`.
    pub fn parse_override(entry: &str) -> Result<(char, Color), ConfigError> {
        let invalid = || ConfigError::InvalidPaletteEntry(entry.to_owned());
        let (key, color) = entry.split_once('=').ok_or_else(invalid)?;
        let mut chars = key.chars();
        let (Some(key), None) = (chars.next(), chars.next()) else {
            return Err(invalid());
        };
        if key == '.' || key == ' ' {
            return Err(invalid());
        }
        Ok((key, color.parse()?))
    }
}

impl Palette for PlayerPalette {
    fn resolve(&self, key: char) -> Option<Color> {
        if let Some(color) = self.overrides.get(&key) {
            return Some(*color);
        }
        let slot = match key {
            WALL_KEY => return Some(Color::GRAY),
            'A'..='z' => key as usize - 'A' as usize,
            _ => return None,
        };
        Some(PLAYER_COLORS[slot % PLAYER_COLORS.len()])
    }
}

use std::fmt;
use std::str::FromStr;

/// An RGBA color as written by Tiled: `#RRGGBB` or `#AARRGGBB`, the `#` being optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    /// Alpha channel; 255 is written in the short `#RRGGBB` form.
    pub alpha: u8,
}

impl Color {
    /// Opaque black, the default text color.
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    /// An opaque color.
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    /// Hex form without the leading `#`, as used by `<image trans>`.
    pub fn to_bare_hex(&self) -> String {
        let mut s = self.to_string();
        s.remove(0);
        s
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Returned when a color string is not 6 or 8 hex digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError;

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected #RRGGBB or #AARRGGBB")
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError);
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ParseColorError);
        match hex.len() {
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color {
                alpha: byte(0)?,
                red: byte(2)?,
                green: byte(4)?,
                blue: byte(6)?,
            }),
            _ => Err(ParseColorError),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
        } else {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.alpha, self.red, self.green, self.blue
            )
        }
    }
}

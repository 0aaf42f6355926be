use std::fmt;

use crate::error::ColorInputError;

/// One channel of an RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    R,
    G,
    B,
}

impl Channel {
    /// Multipart field name for the channel
    pub fn field(&self) -> &'static str {
        match self {
            Channel::R => "r",
            Channel::G => "g",
            Channel::B => "b",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::R => "R",
            Channel::G => "G",
            Channel::B => "B",
        };
        f.write_str(name)
    }
}

/// Color the endpoint should paint the tiles with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TargetColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::R => self.r,
            Channel::G => self.g,
            Channel::B => self.b,
        }
    }
}

impl fmt::Display for TargetColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Fixed colors offered next to the custom input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Red,
    Green,
    Blue,
}

impl Preset {
    pub fn all() -> &'static [Preset] {
        &[Preset::Red, Preset::Green, Preset::Blue]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Preset::Red => "Red Tiles",
            Preset::Green => "Green Tiles",
            Preset::Blue => "Blue Tiles",
        }
    }

    pub fn color(&self) -> TargetColor {
        match self {
            Preset::Red => TargetColor::new(255, 0, 0),
            Preset::Green => TargetColor::new(0, 255, 0),
            Preset::Blue => TargetColor::new(0, 0, 255),
        }
    }
}

/// Raw text of the three custom channel fields.
///
/// The text is only interpreted by [`CustomColorInput::parse`], at the moment
/// the custom recolor is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomColorInput {
    r: String,
    g: String,
    b: String,
}

impl Default for CustomColorInput {
    fn default() -> Self {
        Self {
            r: "0".to_string(),
            g: "0".to_string(),
            b: "0".to_string(),
        }
    }
}

impl CustomColorInput {
    pub fn new(r: &str, g: &str, b: &str) -> Self {
        Self {
            r: r.to_string(),
            g: g.to_string(),
            b: b.to_string(),
        }
    }

    pub fn get(&self, channel: Channel) -> &str {
        match channel {
            Channel::R => &self.r,
            Channel::G => &self.g,
            Channel::B => &self.b,
        }
    }

    pub fn set(&mut self, channel: Channel, text: &str) {
        let field = match channel {
            Channel::R => &mut self.r,
            Channel::G => &mut self.g,
            Channel::B => &mut self.b,
        };
        *field = text.to_string();
    }

    /// Parse all three fields, failing on the first rejected one
    pub fn parse(&self) -> Result<TargetColor, ColorInputError> {
        Ok(TargetColor {
            r: parse_channel(Channel::R, &self.r)?,
            g: parse_channel(Channel::G, &self.g)?,
            b: parse_channel(Channel::B, &self.b)?,
        })
    }
}

/// Parse one channel: rounds decimals, clamps to `0..=255`, rejects empty,
/// non-numeric and non-finite text.
pub fn parse_channel(channel: Channel, text: &str) -> Result<u8, ColorInputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ColorInputError::Empty(channel));
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ColorInputError::NotANumber(channel, text.to_string()))?;
    if !value.is_finite() {
        return Err(ColorInputError::NotANumber(channel, text.to_string()));
    }
    Ok(value.round().clamp(0.0, 255.0) as u8)
}

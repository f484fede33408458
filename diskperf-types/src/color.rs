//! Bar colors, one per metric slot.

use core::fmt;
use core::str::FromStr;

use crate::MetricSlot;

/// An RGB color written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct BarColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl BarColor {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Error returned when a color string is not `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color {:?}, expected #RRGGBB", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for BarColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for BarColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl TryFrom<String> for BarColor {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BarColor> for String {
    fn from(color: BarColor) -> Self {
        color.to_string()
    }
}

/// The color of each bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BarColors {
    pub read: BarColor,
    pub write: BarColor,
    pub combined: BarColor,
}

impl Default for BarColors {
    fn default() -> Self {
        Self {
            read: BarColor::rgb(0x00, 0x00, 0xFF),
            write: BarColor::rgb(0xFF, 0x00, 0x00),
            combined: BarColor::rgb(0x00, 0xFF, 0x00),
        }
    }
}

impl BarColors {
    /// The color used for a slot.
    pub fn get(&self, slot: MetricSlot) -> BarColor {
        match slot {
            MetricSlot::Read => self.read,
            MetricSlot::Write => self.write,
            MetricSlot::Combined => self.combined,
        }
    }

    /// Replace the color used for a slot.
    pub fn set(&mut self, slot: MetricSlot, color: BarColor) {
        match slot {
            MetricSlot::Read => self.read = color,
            MetricSlot::Write => self.write = color,
            MetricSlot::Combined => self.combined = color,
        }
    }
}

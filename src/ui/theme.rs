//! Theme configuration for the terminal view.
//!
//! Supports light and dark themes with automatic terminal detection. Bar
//! colors are not part of the theme; they come from the display settings.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use diskperf_types::BarColor;

/// Color and style theme for the terminal view.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for the title and key hints.
    pub highlight: Color,
    /// Color for the fatal error banner.
    pub critical: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for the title line.
    pub header: Style,
    /// Style for secondary text.
    pub dim: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            critical: Color::Red,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            critical: Color::Red,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for a bar drawn in `color`.
    pub fn bar_style(&self, color: BarColor) -> Style {
        Style::default().fg(bar_color(color))
    }
}

/// Convert a configured bar color to a terminal color.
pub fn bar_color(color: BarColor) -> Color {
    Color::Rgb(color.red, color.green, color.blue)
}

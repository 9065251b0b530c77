//! Theme and styling configuration.

use ratatui::style::{Color, Modifier, Style};

/// Color theme for the combobox demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Primary foreground color.
    pub fg: Color,
    /// Border color while the input has focus.
    pub focus: Color,
    /// Background of selected-value chips.
    pub chip: Color,
    /// Color of the "new" badge on freshly created options.
    pub badge: Color,
    /// Color for hints and placeholders.
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::White,
            focus: Color::Cyan,
            chip: Color::Blue,
            badge: Color::Green,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    /// Style for a selected-value chip.
    pub fn chip_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.chip)
    }

    /// Style for the highlighted option.
    pub fn highlight_style(&self) -> Style {
        Style::default()
            .bg(self.muted)
            .add_modifier(Modifier::BOLD)
    }

    /// Border style depending on focus.
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.focus)
        } else {
            Style::default().fg(self.muted)
        }
    }
}

//! Key hint bar shown below the combobox.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::events::KEY_HINTS;

/// Render the key hints on a single line.
pub fn render_help_bar(frame: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new(Line::from(hint_spans(KEY_HINTS)));
    frame.render_widget(paragraph, area);
}

/// Turn (keys, description) pairs into styled spans.
fn hint_spans(hints: &[(&'static str, &'static str)]) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (i, (keys, description)) in hints.iter().enumerate() {
        spans.push(Span::styled(format!("[{}]", keys), Style::default().fg(Color::Cyan)));
        let gap = if i + 1 < hints.len() { "  " } else { "" };
        spans.push(Span::styled(
            format!(" {}{}", description, gap),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans
}

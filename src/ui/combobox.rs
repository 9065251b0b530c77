//! Combobox rendering.
//!
//! Draws an [`AutoCompleteEngine`] as a bordered box: selected values as
//! chips, the search input, and the popup list when open.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::theme::Theme;
use crate::engine::{AutoCompleteEngine, EngineView, Mode, PopupStatus, SelectionValue};

const PLACEHOLDER: &str = "Type to search...";
const PROMPT: &str = "> ";

/// Renders an engine snapshot.
pub struct Combobox<'a> {
    engine: &'a AutoCompleteEngine,
    title: &'a str,
    theme: Theme,
}

impl<'a> Combobox<'a> {
    /// Create a renderer for `engine`.
    pub fn new(engine: &'a AutoCompleteEngine, title: &'a str) -> Self {
        Self {
            engine,
            title,
            theme: Theme::default(),
        }
    }

    /// Use a custom theme.
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Render into `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let view = self.engine.view();

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(view.focused));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Selected values
                Constraint::Length(1), // Search input
                Constraint::Min(3),    // Popup
            ])
            .split(inner);

        self.render_value(frame, chunks[0], &view);
        self.render_input(frame, chunks[1], &view);
        if view.open {
            self.render_popup(frame, chunks[2], &view);
        }
    }

    fn render_value(&self, frame: &mut Frame, area: Rect, view: &EngineView<'_>) {
        let label = match view.value.mode() {
            Mode::Single => " Value ",
            Mode::Multiple => " Tags ",
        };
        let block = Block::default()
            .title(label)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.muted));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if view.value.is_empty() {
            let empty = Paragraph::new("Nothing selected").style(Style::default().fg(self.theme.muted));
            frame.render_widget(empty, inner);
            return;
        }

        let mut spans: Vec<Span> = Vec::new();
        for (i, item) in view.value.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(format!(" {} ", item.name), self.theme.chip_style()));
        }
        let paragraph = Paragraph::new(Line::from(spans)).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect, view: &EngineView<'_>) {
        let (text, style) = if view.search_text.is_empty() {
            (PLACEHOLDER, Style::default().fg(self.theme.muted))
        } else {
            (view.search_text, Style::default().fg(self.theme.fg))
        };
        let line = Line::from(vec![
            Span::styled(PROMPT, Style::default().fg(self.theme.focus)),
            Span::styled(text.to_string(), style),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        if view.focused {
            let offset = (PROMPT.len() + view.search_text.chars().count()) as u16;
            let x = area.x.saturating_add(offset).min(area.right().saturating_sub(1));
            frame.set_cursor_position((x, area.y));
        }
    }

    fn render_popup(&self, frame: &mut Frame, area: Rect, view: &EngineView<'_>) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(view.list_focused));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match view.status {
            PopupStatus::Loading => {
                let loading = Paragraph::new("Searching...").style(Style::default().fg(self.theme.muted));
                frame.render_widget(loading, inner);
            }
            PopupStatus::Empty => {
                let text = if view.search_text.is_empty() {
                    "No options available"
                } else if self.engine.creation_enabled() {
                    "No matches, press Enter to create"
                } else {
                    "No matching options"
                };
                frame.render_widget(Paragraph::new(text).style(Style::default().fg(self.theme.muted)), inner);
            }
            PopupStatus::Ready => {
                let items: Vec<ListItem> = view.options.iter().map(|option| self.option_item(option, view)).collect();
                let list = List::new(items)
                    .highlight_style(self.theme.highlight_style())
                    .highlight_symbol("> ");
                let mut state = ListState::default();
                state.select(view.active_index);
                frame.render_stateful_widget(list, inner, &mut state);
            }
        }
    }

    fn option_item(&self, option: &SelectionValue, view: &EngineView<'_>) -> ListItem<'static> {
        let selected = view.value.contains_id(&option.id);
        let prefix = if selected { "[+] " } else { "    " };
        let style = if selected {
            Style::default().fg(self.theme.badge)
        } else {
            Style::default().fg(self.theme.fg)
        };
        let mut spans = vec![Span::styled(format!("{}{}", prefix, option.name), style)];
        if self.engine.is_newly_created(&option.id) {
            spans.push(Span::styled(
                " new",
                Style::default().fg(self.theme.badge).add_modifier(Modifier::ITALIC),
            ));
        }
        ListItem::new(Line::from(spans))
    }
}

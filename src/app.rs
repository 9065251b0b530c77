//! Demo application state and event loop.
//!
//! This module implements The Elm Architecture (TEA) pattern: terminal events
//! flow through [`App::update`], which feeds the combobox engine and reacts
//! to the events it emits, and [`App::view`] renders the current state.

use std::path::Path;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::config::Settings;
use crate::engine::{
    AutoCompleteEngine, EngineEvent, Mode, Propagation, SearchError, Selection, SelectionValue,
};
use crate::error::{AppError, Result};
use crate::events::{is_quit, Event};
use crate::tasks::{SearchCatalog, SearchMessage, SearchSpawner};
use crate::ui::{render_help_bar, Combobox};

/// Options used when no options file is given.
const DEFAULT_CATALOG: &[&str] = &[
    "Apple",
    "Apricot",
    "Banana",
    "Blackberry",
    "Blueberry",
    "Cherry",
    "Grape",
    "Lemon",
    "Mango",
    "Orange",
    "Peach",
    "Pear",
    "Pineapple",
    "Plum",
    "Raspberry",
    "Strawberry",
];

/// Severity of the status line message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Informational.
    Info,
    /// Something went wrong but the demo keeps running.
    Warning,
}

/// The main application struct that holds all state.
///
/// This implements the Model part of The Elm Architecture (TEA).
pub struct App {
    /// The combobox being demonstrated.
    engine: AutoCompleteEngine,
    /// Title shown in the header.
    title: String,
    /// Whether the application should quit.
    should_quit: bool,
    /// Last status message.
    status: Option<(StatusKind, String)>,
    /// Results of background searches, when searching asynchronously.
    search_rx: Option<mpsc::UnboundedReceiver<SearchMessage>>,
    /// Catalog searched in the background, grown by created options.
    catalog: Option<SearchCatalog>,
}

impl App {
    /// Create the demo application.
    ///
    /// With asynchronous search enabled, searches run on tokio tasks, so this
    /// must be called inside a tokio runtime.
    pub fn new(settings: &Settings, catalog: Vec<SelectionValue>) -> Self {
        let config = settings.engine.clone();
        let async_search = config.async_search;
        let mut builder = AutoCompleteEngine::builder(config)
            .options(catalog.clone())
            .inserter(next_id_inserter());

        let (search_rx, catalog) = if async_search {
            let (tx, rx) = mpsc::unbounded_channel();
            let latency = Duration::from_millis(settings.demo.latency_ms);
            let catalog = SearchCatalog::new(catalog);
            builder = builder.search_handler(SearchSpawner::new(tx, catalog.clone(), latency));
            (Some(rx), Some(catalog))
        } else {
            (None, None)
        };

        info!(async_search, "Demo application created");
        Self {
            engine: builder.build(),
            title: settings.demo.title.clone(),
            should_quit: false,
            status: None,
            search_rx,
            catalog,
        }
    }

    /// The combobox engine.
    pub fn engine(&self) -> &AutoCompleteEngine {
        &self.engine
    }

    /// Check if the application should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// The last status message.
    pub fn status(&self) -> Option<(StatusKind, &str)> {
        self.status.as_ref().map(|(kind, msg)| (*kind, msg.as_str()))
    }

    /// Update the application state based on an event.
    ///
    /// This implements the Update part of The Elm Architecture (TEA).
    pub fn update(&mut self, event: Event) {
        let result = match event {
            Event::Key(key) => {
                trace!(key = ?key.code, modifiers = ?key.modifiers, "Key event");
                self.handle_key_event(key)
            }
            Event::Paste(text) => {
                debug!(len = text.len(), "Paste event");
                self.ensure_focus();
                self.engine.paste(&text)
            }
            Event::FocusGained => {
                self.engine.focus();
                Ok(())
            }
            Event::FocusLost => {
                self.engine.blur();
                Ok(())
            }
            Event::Resize(width, height) => {
                trace!(width, height, "Terminal resize event");
                Ok(())
            }
            Event::Tick => self.handle_tick(),
        };

        if let Err(err) = result {
            self.report_error(err.into());
        }
        self.process_engine_events();
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> std::result::Result<(), SearchError> {
        if is_quit(&key) {
            info!("Quit requested");
            self.should_quit = true;
            return Ok(());
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('l') if ctrl => {
                self.engine.clear();
                return Ok(());
            }
            KeyCode::Tab => {
                if self.engine.is_focused() {
                    self.engine.blur();
                } else {
                    self.engine.focus();
                }
                return Ok(());
            }
            _ => {}
        }

        self.ensure_focus();
        if self.engine.handle_key(key) == Propagation::Stop {
            return Ok(());
        }

        // Keys the engine passed on edit the search text.
        match key.code {
            KeyCode::Char(c) if !ctrl => {
                let mut text = self.engine.search_text().to_string();
                text.push(c);
                self.engine.input_search_text(text)
            }
            KeyCode::Backspace if !self.engine.search_text().is_empty() => {
                let mut text = self.engine.search_text().to_string();
                text.pop();
                self.engine.input_search_text(text)
            }
            _ => Ok(()),
        }
    }

    fn handle_tick(&mut self) -> std::result::Result<(), SearchError> {
        self.drain_search_results();
        self.engine.tick()
    }

    fn ensure_focus(&mut self) {
        if !self.engine.is_focused() {
            self.engine.focus();
        }
    }

    /// Apply finished background searches.
    fn drain_search_results(&mut self) {
        let Some(rx) = self.search_rx.as_mut() else {
            return;
        };
        let mut finished = Vec::new();
        while let Ok(message) = rx.try_recv() {
            finished.push(message);
        }

        for message in finished {
            match message {
                SearchMessage::Completed { seq, query, result } => {
                    let current = self.engine.is_search_current(seq);
                    trace!(seq, query = %query, current, "Search result received");
                    let outcome = match result {
                        Ok(options) => {
                            if current {
                                self.engine.set_options(options);
                            }
                            Ok(())
                        }
                        Err(err) => Err(err),
                    };
                    if let Err(err) = self.engine.complete_search(seq, outcome) {
                        self.report_error(err.into());
                    }
                }
            }
        }
    }

    fn process_engine_events(&mut self) {
        let mut refresh = false;
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::Change(selection) => {
                    info!(count = selection.len(), "Selection changed");
                    self.set_status(StatusKind::Info, describe_selection(&selection));
                    refresh = true;
                }
                EngineEvent::Clear => {
                    self.set_status(StatusKind::Info, "Selection cleared");
                    refresh = true;
                }
                EngineEvent::OptionsChanged(options) => {
                    debug!(count = options.len(), "Options changed");
                    if let Some(catalog) = &self.catalog {
                        let added = catalog.merge(&options);
                        debug!(added, "Catalog extended with created options");
                    }
                    refresh = true;
                }
                EngineEvent::Warning(warning) => {
                    self.set_status(StatusKind::Warning, warning.to_string());
                }
                EngineEvent::SearchTextChange(text) => trace!(text = %text, "Search text changed"),
                EngineEvent::OpenChanged(open) => trace!(open, "Popup toggled"),
                EngineEvent::OpenRequested(open) => trace!(open, "Popup toggle requested"),
            }
        }

        // Refill the option list for the emptied query.
        if refresh && self.catalog.is_some() && self.engine.search_text().is_empty() {
            if let Err(err) = self.engine.search_now() {
                self.report_error(err.into());
            }
        }
    }

    fn report_error(&mut self, err: AppError) {
        if err.is_recoverable() {
            warn!(error = %err, "Recoverable error");
        } else {
            error!(error = %err, "Unexpected error");
        }
        self.set_status(StatusKind::Warning, err.user_message());
    }

    fn set_status(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.status = Some((kind, message.into()));
    }

    /// Render the application UI.
    ///
    /// This implements the View part of The Elm Architecture (TEA).
    pub fn view(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(8),    // Combobox
                Constraint::Length(1), // Status
                Constraint::Length(1), // Key hints
            ])
            .split(frame.area());

        let header = Paragraph::new(self.title.as_str())
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center);
        frame.render_widget(header, chunks[0]);

        Combobox::new(&self.engine, mode_label(&self.engine)).render(frame, chunks[1]);
        self.render_status(frame, chunks[2]);
        render_help_bar(frame, chunks[3]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.status {
            Some((StatusKind::Info, msg)) => {
                Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Green)))
            }
            Some((StatusKind::Warning, msg)) => {
                Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Yellow)))
            }
            None => Line::from(""),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn mode_label(engine: &AutoCompleteEngine) -> &'static str {
    match (engine.mode(), engine.creation_enabled()) {
        (Mode::Single, false) => "Pick one",
        (Mode::Single, true) => "Pick or create one",
        (Mode::Multiple, false) => "Pick several",
        (Mode::Multiple, true) => "Pick or create several",
    }
}

fn describe_selection(selection: &Selection) -> String {
    if selection.is_empty() {
        return "Nothing selected".to_string();
    }
    let names: Vec<&str> = selection.iter().map(|item| item.name.as_str()).collect();
    format!("Selected: {}", names.join(", "))
}

/// An inserter assigning sequential `new-N` ids.
fn next_id_inserter() -> impl FnMut(&str, &[SelectionValue]) -> Option<Vec<SelectionValue>> {
    let mut next = 0u64;
    move |text: &str, current: &[SelectionValue]| {
        next += 1;
        let mut options = current.to_vec();
        options.push(SelectionValue::new(format!("new-{}", next), text));
        Some(options)
    }
}

/// The built-in demo catalog.
pub fn default_catalog() -> Vec<SelectionValue> {
    DEFAULT_CATALOG
        .iter()
        .enumerate()
        .map(|(i, name)| SelectionValue::new(format!("opt-{}", i + 1), *name))
        .collect()
}

/// Load options from a file.
///
/// `.json` files hold an array of `{ "id", "name" }` objects. Any other file
/// holds one option name per line; blank lines are skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or holds no options.
pub fn load_options(path: &Path) -> Result<Vec<SelectionValue>> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let options: Vec<SelectionValue> = if is_json {
        serde_json::from_str(&content).map_err(|e| AppError::options(e.to_string()))?
    } else {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, name)| SelectionValue::new(format!("opt-{}", i + 1), name))
            .collect()
    };

    if options.is_empty() {
        return Err(AppError::options(format!("{} holds no options", path.display())));
    }
    debug!(path = %path.display(), count = options.len(), "Loaded options");
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::events::Event;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.update(key(KeyCode::Char(c)));
        }
    }

    fn settings(engine: EngineConfig) -> Settings {
        let mut settings = Settings::default();
        settings.engine = engine.with_debounce_ms(0);
        settings.demo.latency_ms = 0;
        settings
    }

    fn app(engine: EngineConfig) -> App {
        App::new(&settings(engine), default_catalog())
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app(EngineConfig::default());
        app.update(ctrl('c'));
        assert!(app.should_quit());
    }

    #[test]
    fn test_typing_filters_and_enter_selects() {
        let mut app = app(EngineConfig::default());
        type_text(&mut app, "berr");
        assert!(app.engine().is_open());
        assert_eq!(app.engine().visible_options().len(), 4);

        app.update(key(KeyCode::Down));
        app.update(key(KeyCode::Enter));

        assert_eq!(app.engine().value().ids(), vec!["opt-4"]);
        assert!(!app.engine().is_open());
        assert_eq!(app.status(), Some((StatusKind::Info, "Selected: Blackberry")));
    }

    #[test]
    fn test_backspace_edits_text_before_removing_tags() {
        let mut app = app(EngineConfig::multiple());
        type_text(&mut app, "Plum");
        assert_eq!(app.engine().value().len(), 1);
        assert_eq!(app.engine().search_text(), "");

        type_text(&mut app, "pe");
        app.update(key(KeyCode::Backspace));
        assert_eq!(app.engine().search_text(), "p");
        assert_eq!(app.engine().value().len(), 1);

        app.update(key(KeyCode::Backspace));
        app.update(key(KeyCode::Backspace));
        assert!(app.engine().value().is_empty());
    }

    #[test]
    fn test_tab_toggles_focus() {
        let mut app = app(EngineConfig::default());
        app.update(key(KeyCode::Tab));
        assert!(app.engine().is_focused());
        assert!(app.engine().is_open());
        app.update(key(KeyCode::Tab));
        assert!(!app.engine().is_focused());
        assert!(!app.engine().is_open());
    }

    #[test]
    fn test_paste_bulk_creates_tags() {
        let mut app = app(EngineConfig::multiple().with_creatable(true));
        app.update(Event::Paste("Kiwi, Banana, Lime".to_string()));

        let names: Vec<_> = app.engine().value().iter().map(|v| v.name.clone()).collect();
        assert_eq!(names, vec!["Kiwi", "Banana", "Lime"]);
        assert!(app.engine().is_newly_created("new-1"));
        assert!(app.engine().is_newly_created("new-2"));
        assert_eq!(app.engine().options().len(), DEFAULT_CATALOG.len() + 2);
    }

    #[test]
    fn test_ctrl_l_clears() {
        let mut app = app(EngineConfig::multiple());
        type_text(&mut app, "Plum");
        app.update(ctrl('l'));
        assert!(app.engine().value().is_empty());
        assert_eq!(app.status(), Some((StatusKind::Info, "Selection cleared")));
    }

    #[test]
    fn test_focus_lost_blurs() {
        let mut app = app(EngineConfig::default());
        app.update(Event::FocusGained);
        type_text(&mut app, "ch");
        app.update(Event::FocusLost);
        assert!(!app.engine().is_focused());
        assert_eq!(app.engine().search_text(), "");
    }

    #[tokio::test]
    async fn test_async_search_applies_latest_results() {
        let mut app = app(EngineConfig::default().with_async_search(true));
        type_text(&mut app, "ban");
        assert!(app.engine().is_loading());

        tokio::time::sleep(Duration::from_millis(20)).await;
        app.update(Event::Tick);

        assert!(!app.engine().is_loading());
        let names: Vec<_> = app.engine().options().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Banana"]);
    }

    #[tokio::test]
    async fn test_async_commit_restores_full_option_list() {
        let mut app = app(EngineConfig::multiple().with_async_search(true));
        type_text(&mut app, "ban");
        tokio::time::sleep(Duration::from_millis(20)).await;
        app.update(Event::Tick);
        assert_eq!(app.engine().visible_options().len(), 1);

        app.update(key(KeyCode::Enter));
        assert_eq!(app.engine().value().ids(), vec!["opt-3"]);
        assert_eq!(app.engine().search_text(), "");

        tokio::time::sleep(Duration::from_millis(20)).await;
        app.update(Event::Tick);
        assert_eq!(app.engine().visible_options().len(), DEFAULT_CATALOG.len());
    }

    #[tokio::test]
    async fn test_async_search_keeps_created_options() {
        let mut app = app(EngineConfig::multiple().with_creatable(true).with_async_search(true));
        type_text(&mut app, "Kiwi");
        tokio::time::sleep(Duration::from_millis(20)).await;
        app.update(Event::Tick);
        app.update(key(KeyCode::Enter));
        assert_eq!(app.engine().value().ids(), vec!["new-1"]);

        tokio::time::sleep(Duration::from_millis(20)).await;
        app.update(Event::Tick);
        let options = app.engine().options();
        assert_eq!(options.len(), DEFAULT_CATALOG.len() + 1);
        assert!(options.iter().any(|o| o.id == "new-1"));

        type_text(&mut app, "kiw");
        tokio::time::sleep(Duration::from_millis(20)).await;
        app.update(Event::Tick);
        let names: Vec<_> = app.engine().options().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Kiwi"]);
    }

    #[test]
    fn test_report_error_sets_warning_status() {
        let mut app = app(EngineConfig::default());
        app.report_error(SearchError::failed("catalog offline").into());
        assert_eq!(app.status(), Some((StatusKind::Warning, "Search failed: catalog offline")));

        app.report_error(AppError::terminal("raw mode"));
        assert_eq!(app.status(), Some((StatusKind::Warning, "Terminal error: raw mode")));
    }

    #[test]
    fn test_load_options_from_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Red\n\n  Green \nBlue").unwrap();
        let options = load_options(file.path()).unwrap();
        assert_eq!(
            options,
            vec![
                SelectionValue::new("opt-1", "Red"),
                SelectionValue::new("opt-2", "Green"),
                SelectionValue::new("opt-3", "Blue"),
            ]
        );
    }

    #[test]
    fn test_load_options_from_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"id": "a", "name": "Alpha"}}]"#).unwrap();
        let options = load_options(file.path()).unwrap();
        assert_eq!(options, vec![SelectionValue::new("a", "Alpha")]);
    }

    #[test]
    fn test_load_options_rejects_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let err = load_options(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Options(_)));
    }

    #[test]
    fn test_describe_selection() {
        assert_eq!(describe_selection(&Selection::Single(None)), "Nothing selected");
        let selection = Selection::Multiple(vec![
            SelectionValue::new("1", "A"),
            SelectionValue::new("2", "B"),
        ]);
        assert_eq!(describe_selection(&selection), "Selected: A, B");
    }
}

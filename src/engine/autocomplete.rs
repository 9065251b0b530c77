//! The combobox state machine.
//!
//! [`AutoCompleteEngine`] owns the popup, focus, search text and highlight
//! state, and composes the value, search, creation and keyboard controllers.
//! Inputs arrive as method calls; outputs are queued as [`EngineEvent`]s and
//! collected with [`AutoCompleteEngine::drain_events`].

use std::collections::HashSet;
use std::time::Instant;

use crossterm::event::KeyEvent;
use tracing::{debug, trace, warn};

use super::creation::CreationTracker;
use super::error::{EngineWarning, SearchError};
use super::keyboard::{KeyAction, KeyContext, KeyboardController, Propagation};
use super::parser::BulkCreateParser;
use super::search::{SearchController, SearchHandler, SearchTicket};
use super::value::{ChoiceOutcome, Mode, Selection, SelectionValue, ValueController};
use crate::config::EngineConfig;

/// Creates options from text.
///
/// Returns the full updated option list including the new item, or `None`
/// if nothing could be created.
pub trait OptionInserter {
    /// Create an option named `text` given the current options.
    fn insert(&mut self, text: &str, current: &[SelectionValue]) -> Option<Vec<SelectionValue>>;
}

impl<F> OptionInserter for F
where
    F: FnMut(&str, &[SelectionValue]) -> Option<Vec<SelectionValue>>,
{
    fn insert(&mut self, text: &str, current: &[SelectionValue]) -> Option<Vec<SelectionValue>> {
        self(text, current)
    }
}

/// Notifications emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The selection changed; carries the new value.
    Change(Selection),
    /// The selection was cleared through the clear control.
    Clear,
    /// The user edited the search text.
    SearchTextChange(String),
    /// The uncontrolled popup opened or closed.
    OpenChanged(bool),
    /// The engine wants the caller-controlled popup opened or closed.
    OpenRequested(bool),
    /// The option list changed because options were created.
    OptionsChanged(Vec<SelectionValue>),
    /// A recoverable problem occurred.
    Warning(EngineWarning),
}

/// What the popup list should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupStatus {
    /// A search is running.
    Loading,
    /// No options to show.
    Empty,
    /// Options are available.
    Ready,
}

/// Read-only snapshot handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct EngineView<'a> {
    /// Options to display.
    pub options: &'a [SelectionValue],
    /// Highlighted option.
    pub active_index: Option<usize>,
    /// Current selection.
    pub value: &'a Selection,
    /// List status.
    pub status: PopupStatus,
    /// Current search text.
    pub search_text: &'a str,
    /// Whether the popup is open.
    pub open: bool,
    /// Whether the input has focus.
    pub focused: bool,
    /// Whether the list shows keyboard focus.
    pub list_focused: bool,
}

/// Builder for [`AutoCompleteEngine`].
pub struct EngineBuilder {
    config: EngineConfig,
    options: Vec<SelectionValue>,
    default_value: Option<Selection>,
    controlled_value: Option<Selection>,
    controlled_open: Option<bool>,
    search_handler: Option<Box<dyn SearchHandler>>,
    inserter: Option<Box<dyn OptionInserter>>,
}

impl EngineBuilder {
    /// Start from a configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            options: Vec::new(),
            default_value: None,
            controlled_value: None,
            controlled_open: None,
            search_handler: None,
            inserter: None,
        }
    }

    /// Initial option list.
    pub fn options(mut self, options: Vec<SelectionValue>) -> Self {
        self.options = options;
        self
    }

    /// Initial value for an uncontrolled selection.
    pub fn default_value(mut self, value: Selection) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Make the selection caller-owned, starting from `value`.
    pub fn controlled_value(mut self, value: Selection) -> Self {
        self.controlled_value = Some(value);
        self
    }

    /// Make the popup caller-owned, starting from `open`.
    pub fn controlled_open(mut self, open: bool) -> Self {
        self.controlled_open = Some(open);
        self
    }

    /// Search callback.
    pub fn search_handler(mut self, handler: impl SearchHandler + 'static) -> Self {
        self.search_handler = Some(Box::new(handler));
        self
    }

    /// Insert callback used for creation.
    pub fn inserter(mut self, inserter: impl OptionInserter + 'static) -> Self {
        self.inserter = Some(Box::new(inserter));
        self
    }

    /// Build the engine.
    pub fn build(self) -> AutoCompleteEngine {
        let mode = self.config.mode;
        let values = match self.controlled_value {
            Some(value) => ValueController::controlled(mode, value),
            None => ValueController::new(mode, self.default_value),
        };

        let mut engine = AutoCompleteEngine {
            parser: self.config.parser(),
            search: SearchController::new(self.config.debounce(), self.config.async_search),
            keyboard: KeyboardController::new(),
            tracker: CreationTracker::new(),
            values,
            options: self.options,
            visible: Vec::new(),
            open: false,
            controlled_open: self.controlled_open,
            focused: false,
            list_focused: false,
            search_text: String::new(),
            active_index: None,
            search_handler: self.search_handler,
            inserter: self.inserter,
            events: Vec::new(),
            config: self.config,
        };

        if engine.config.creatable && engine.inserter.is_none() {
            engine.warn(EngineWarning::CreatableWithoutInserter);
        }
        engine.refresh_visible();
        debug!(mode = ?mode, creatable = engine.creation_enabled(), "Combobox engine created");
        engine
    }
}

/// Searchable, creatable combobox engine.
pub struct AutoCompleteEngine {
    config: EngineConfig,
    parser: BulkCreateParser,
    keyboard: KeyboardController,
    values: ValueController,
    search: SearchController,
    tracker: CreationTracker,
    /// Every known option.
    options: Vec<SelectionValue>,
    /// Options after filtering by the search text.
    visible: Vec<SelectionValue>,
    /// Internal open state, inert when `controlled_open` is set.
    open: bool,
    controlled_open: Option<bool>,
    focused: bool,
    list_focused: bool,
    search_text: String,
    active_index: Option<usize>,
    search_handler: Option<Box<dyn SearchHandler>>,
    inserter: Option<Box<dyn OptionInserter>>,
    events: Vec<EngineEvent>,
}

impl std::fmt::Debug for AutoCompleteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoCompleteEngine")
            .field("mode", &self.config.mode)
            .field("value", self.values.value())
            .field("open", &self.is_open())
            .field("focused", &self.focused)
            .field("search_text", &self.search_text)
            .field("active_index", &self.active_index)
            .field("options", &self.options.len())
            .finish()
    }
}

impl AutoCompleteEngine {
    /// Start building an engine.
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// Create an engine with options and no callbacks.
    pub fn new(config: EngineConfig, options: Vec<SelectionValue>) -> Self {
        EngineBuilder::new(config).options(options).build()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Selection mode.
    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    /// Current selection.
    pub fn value(&self) -> &Selection {
        self.values.value()
    }

    /// Current search text.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Highlighted index into the visible options.
    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    /// Whether the popup is open.
    pub fn is_open(&self) -> bool {
        self.controlled_open.unwrap_or(self.open)
    }

    /// Whether the input has focus.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Whether the option list shows keyboard focus.
    pub fn is_list_focused(&self) -> bool {
        self.list_focused
    }

    /// Effective loading state.
    pub fn is_loading(&self) -> bool {
        self.search.is_loading()
    }

    /// Every known option.
    pub fn options(&self) -> &[SelectionValue] {
        &self.options
    }

    /// Options as displayed.
    pub fn visible_options(&self) -> &[SelectionValue] {
        &self.visible
    }

    /// Whether creation is enabled and has an inserter.
    pub fn creation_enabled(&self) -> bool {
        self.config.creatable && self.inserter.is_some()
    }

    /// Whether the option was created through this engine.
    pub fn is_created(&self, id: &str) -> bool {
        self.tracker.is_created(id)
    }

    /// Whether the option belongs to the latest creation batch.
    pub fn is_newly_created(&self, id: &str) -> bool {
        self.tracker.is_newly_created(id)
    }

    /// Snapshot for the renderer.
    pub fn view(&self) -> EngineView<'_> {
        let status = if self.is_loading() {
            PopupStatus::Loading
        } else if self.visible.is_empty() {
            PopupStatus::Empty
        } else {
            PopupStatus::Ready
        };
        EngineView {
            options: &self.visible,
            active_index: self.active_index,
            value: self.values.value(),
            status,
            search_text: &self.search_text,
            open: self.is_open(),
            focused: self.focused,
            list_focused: self.list_focused,
        }
    }

    /// Take every queued event.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // External inputs
    // ------------------------------------------------------------------

    /// Replace the option list.
    pub fn set_options(&mut self, options: Vec<SelectionValue>) {
        self.options = options;
        self.refresh_visible();
    }

    /// Resynchronise a caller-owned selection.
    pub fn set_controlled_value(&mut self, value: Selection) {
        if self.values.sync_external(value) {
            trace!("Controlled value changed");
        }
    }

    /// Set the caller-owned open state.
    pub fn set_controlled_open(&mut self, open: bool) {
        self.controlled_open = Some(open);
        if !open {
            self.active_index = None;
            self.list_focused = false;
        }
    }

    /// Set the caller-owned loading flag.
    pub fn set_external_loading(&mut self, loading: bool) {
        self.search.set_external_loading(loading);
    }

    /// Set the search text without firing callbacks or searches.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.active_index = None;
        self.refresh_visible();
    }

    // ------------------------------------------------------------------
    // User interaction
    // ------------------------------------------------------------------

    /// The input gained focus.
    pub fn focus(&mut self) {
        self.focused = true;
        self.request_open(true);
    }

    /// The input lost focus.
    pub fn blur(&mut self) {
        self.focused = false;
        self.list_focused = false;
        self.active_index = None;
        if !self.config.keep_search_text_on_blur {
            self.reset_inputs();
        }
        if self.controlled_open.is_none() {
            self.request_open(false);
        }
    }

    /// The user typed into the search box.
    ///
    /// Fires the search-text callback, filters the options, auto-selects an
    /// exact name match, and schedules a debounced search.
    pub fn input_search_text(&mut self, text: impl Into<String>) -> Result<(), SearchError> {
        let text = text.into();
        self.search_text = text.clone();
        self.events.push(EngineEvent::SearchTextChange(text.clone()));
        self.active_index = None;
        self.refresh_visible();

        if self.auto_select_exact_match() {
            return Ok(());
        }

        if !text.is_empty() {
            self.request_open(true);
        }
        match self.search.dispatch(&text, false, Instant::now()) {
            Some(ticket) => self.run_search(ticket),
            None => Ok(()),
        }
    }

    /// Text was pasted into the search box.
    ///
    /// In multiple mode with creation enabled, text containing a separator is
    /// bulk-created at once. Otherwise it is appended like typing.
    pub fn paste(&mut self, text: &str) -> Result<(), SearchError> {
        if self.mode() == Mode::Multiple && self.creation_enabled() && self.parser.has_separator(text) {
            let combined = format!("{}{}", self.search_text, text);
            let names = self.parser.parse_for_selection(&combined, self.values.value());
            self.create_batch(names);
            return Ok(());
        }
        let combined = format!("{}{}", self.search_text, text);
        self.input_search_text(combined)
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Propagation {
        let action = {
            let ctx = self.key_context();
            self.keyboard.resolve(key, &ctx)
        };
        let Some(action) = action else {
            return Propagation::Continue;
        };
        trace!(key = ?key.code, action = ?action, "Key resolved");
        let propagation = action.propagation();
        self.apply_key_action(action);
        propagation
    }

    /// The renderer highlighted an option.
    pub fn hover(&mut self, index: usize) {
        if index < self.visible.len() {
            self.active_index = Some(index);
            self.list_focused = true;
        }
    }

    /// The renderer selected an option.
    pub fn select(&mut self, option: SelectionValue) {
        self.commit(option);
    }

    /// The clear control was activated.
    ///
    /// Always returns [`Propagation::Stop`] so the click does not reopen the
    /// popup.
    pub fn clear(&mut self) -> Propagation {
        let outcome = self.values.clear();
        self.finish_change(outcome);
        self.events.push(EngineEvent::Clear);
        self.reset_inputs();
        Propagation::Stop
    }

    /// Create options from names, reusing existing options by name.
    ///
    /// Does nothing if creation is disabled.
    pub fn create(&mut self, names: Vec<String>) {
        self.create_batch(names);
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Fire a due debounced search.
    pub fn tick(&mut self) -> Result<(), SearchError> {
        self.tick_at(Instant::now())
    }

    /// Fire a debounced search due at `now`.
    pub fn tick_at(&mut self, now: Instant) -> Result<(), SearchError> {
        match self.search.poll(now) {
            Some(ticket) => self.run_search(ticket),
            None => Ok(()),
        }
    }

    /// Search the current text right away, skipping the debounce.
    pub fn search_now(&mut self) -> Result<(), SearchError> {
        let text = self.search_text.clone();
        match self.search.dispatch(&text, true, Instant::now()) {
            Some(ticket) => self.run_search(ticket),
            None => Ok(()),
        }
    }

    /// Drop a pending debounced search.
    pub fn cancel_search(&mut self) {
        self.search.cancel();
    }

    /// Report completion of an in-flight search.
    ///
    /// Stale completions do not touch the loading flag. Errors are returned
    /// to the caller in either case.
    pub fn complete_search(&mut self, seq: u64, result: Result<(), SearchError>) -> Result<(), SearchError> {
        self.search.complete(seq, result)
    }

    /// Whether `seq` is the latest dispatched search.
    pub fn is_search_current(&self, seq: u64) -> bool {
        self.search.is_current(seq)
    }

    fn run_search(&mut self, ticket: SearchTicket) -> Result<(), SearchError> {
        match self.search_handler.as_mut() {
            Some(handler) => self.search.execute(&ticket, &mut **handler),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn key_context(&self) -> KeyContext<'_> {
        KeyContext {
            mode: self.config.mode,
            open: self.is_open(),
            active_index: self.active_index,
            options: &self.visible,
            all_options: &self.options,
            selection: self.values.value(),
            search_text: &self.search_text,
            creatable: self.creation_enabled(),
            parser: &self.parser,
        }
    }

    fn apply_key_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Open { active_index } => {
                self.request_open(true);
                self.active_index = active_index;
                self.list_focused = active_index.is_some();
            }
            KeyAction::Highlight(index) => {
                self.active_index = Some(index);
                self.list_focused = true;
            }
            KeyAction::Create(names) => self.create_batch(names),
            KeyAction::Commit(option) => self.commit(option),
            KeyAction::Dismiss => {
                self.request_open(false);
                self.blur();
            }
            KeyAction::ReleaseHighlight => {
                self.active_index = None;
                self.list_focused = false;
            }
            KeyAction::RemoveLast => {
                if let Some(outcome) = self.values.remove_last() {
                    self.finish_change(outcome);
                }
            }
            KeyAction::RemoveFirst => {
                if let Some(outcome) = self.values.remove_first() {
                    self.finish_change(outcome);
                }
            }
        }
    }

    /// Open or close the popup.
    ///
    /// Opening an open popup (or closing a closed one) is ignored. With a
    /// controlled popup the request is forwarded instead of applied.
    fn request_open(&mut self, open: bool) {
        if open == self.is_open() {
            return;
        }
        if self.controlled_open.is_some() {
            self.events.push(EngineEvent::OpenRequested(open));
            return;
        }
        debug!(open, "Popup toggled");
        self.open = open;
        if !open {
            self.active_index = None;
            self.list_focused = false;
        }
        self.events.push(EngineEvent::OpenChanged(open));
    }

    fn commit(&mut self, option: SelectionValue) {
        debug!(id = %option.id, "Committing option");
        let outcome = self.values.apply_choice(Some(option));
        if !outcome.added.is_empty() {
            self.tracker.clear_newly_created(Some(outcome.added.as_slice()));
        }
        let close = outcome.close_requested;
        self.finish_change(outcome);
        self.reset_inputs();
        if close {
            self.request_open(false);
            self.focused = false;
            self.list_focused = false;
        }
    }

    /// Reconcile creation state and report a selection change.
    fn finish_change(&mut self, outcome: ChoiceOutcome) {
        if !outcome.changed() {
            return;
        }
        self.tracker.mark_unselected(&outcome.removed);
        self.tracker.mark_selected(&outcome.added);
        self.events.push(EngineEvent::Change(outcome.value));
    }

    fn create_batch(&mut self, names: Vec<String>) {
        if !self.creation_enabled() {
            return;
        }

        let mut pool = self.tracker.filter_unselected(&self.options);
        self.tracker.clear_unselected();
        self.tracker.clear_newly_created(None);

        let mut chosen: Vec<SelectionValue> = Vec::new();
        let mut created_ids: Vec<String> = Vec::new();
        for name in names {
            let lower = name.to_lowercase();
            if let Some(existing) = pool.iter().find(|option| option.name.to_lowercase() == lower) {
                chosen.push(existing.clone());
                continue;
            }

            let inserted = match self.inserter.as_mut() {
                Some(inserter) => (**inserter).insert(&name, &pool),
                None => None,
            };
            let Some(updated) = inserted else {
                self.warn(EngineWarning::MalformedInsertResult { fragment: name });
                continue;
            };

            let known: HashSet<&str> = pool.iter().map(|option| option.id.as_str()).collect();
            let created: Vec<SelectionValue> = updated
                .iter()
                .filter(|option| !known.contains(option.id.as_str()))
                .cloned()
                .collect();
            if created.is_empty() {
                self.warn(EngineWarning::MalformedInsertResult { fragment: name });
                continue;
            }

            for option in &created {
                debug!(id = %option.id, name = %option.name, "Created option");
                self.tracker.mark_created(option.id.clone());
                created_ids.push(option.id.clone());
            }
            chosen.extend(created);
            pool = updated;
        }

        if pool != self.options {
            self.options = pool;
            self.events.push(EngineEvent::OptionsChanged(self.options.clone()));
        }

        if chosen.is_empty() {
            self.reset_inputs();
            return;
        }

        let outcome = self.values.extend(chosen);
        // Created options that did not end up selected go to the next purge.
        let value = self.values.value();
        let abandoned: Vec<&String> = created_ids.iter().filter(|id| !value.contains_id(id)).collect();
        self.tracker.mark_unselected(abandoned);
        let close = outcome.close_requested;
        self.finish_change(outcome);
        self.reset_inputs();
        if close {
            self.request_open(false);
        }
    }

    /// Select an option whose name equals the search text exactly.
    fn auto_select_exact_match(&mut self) -> bool {
        if self.search_text.is_empty() {
            return false;
        }
        let value = self.values.value();
        let matched = self.options.iter().find(|option| {
            option.name == self.search_text
                && (self.config.mode == Mode::Multiple || !value.contains_id(&option.id))
        });
        match matched.cloned() {
            Some(option) => {
                debug!(id = %option.id, "Auto-selecting exact match");
                self.commit(option);
                true
            }
            None => false,
        }
    }

    fn reset_inputs(&mut self) {
        self.search.cancel();
        if !self.search_text.is_empty() {
            self.search_text.clear();
        }
        self.refresh_visible();
    }

    fn refresh_visible(&mut self) {
        self.visible = if self.config.disabled_options_filter || self.search_text.is_empty() {
            self.options.clone()
        } else {
            let needle = self.search_text.to_lowercase();
            self.options
                .iter()
                .filter(|option| option.name.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        };
        if self.active_index.is_some_and(|index| index >= self.visible.len()) {
            self.active_index = None;
        }
    }

    fn warn(&mut self, warning: EngineWarning) {
        warn!(%warning, "Combobox warning");
        self.events.push(EngineEvent::Warning(warning));
    }
}

//! Mapping key presses to engine actions.
//!
//! The controller is pure: it inspects a snapshot of the engine state and
//! decides on at most one [`KeyAction`]. Applying the action is up to the
//! engine.

use crossterm::event::{KeyCode, KeyEvent};

use super::parser::BulkCreateParser;
use super::value::{Mode, Selection, SelectionValue};

/// Whether a handled event should stop default processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// The event was consumed (no caret movement, no bubbling).
    Stop,
    /// The event continues to the text input.
    Continue,
}

/// An action decided from a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Open the popup with this option highlighted.
    Open {
        /// The option to highlight.
        active_index: Option<usize>,
    },
    /// Move the highlight within an open popup.
    Highlight(usize),
    /// Create options from these names.
    Create(Vec<String>),
    /// Commit this option.
    Commit(SelectionValue),
    /// Close the popup and drop focus.
    Dismiss,
    /// Clear the highlight so the caret can move.
    ReleaseHighlight,
    /// Remove the last selected value.
    RemoveLast,
    /// Remove the first selected value.
    RemoveFirst,
}

impl KeyAction {
    /// How the key event should propagate once this action is applied.
    pub fn propagation(&self) -> Propagation {
        match self {
            KeyAction::ReleaseHighlight => Propagation::Continue,
            _ => Propagation::Stop,
        }
    }
}

/// Snapshot of the engine state needed to resolve a key.
#[derive(Debug, Clone, Copy)]
pub struct KeyContext<'a> {
    /// Selection mode.
    pub mode: Mode,
    /// Whether the popup is open.
    pub open: bool,
    /// Highlighted index into `options`.
    pub active_index: Option<usize>,
    /// The options as displayed (possibly filtered).
    pub options: &'a [SelectionValue],
    /// Every known option, used for name matching.
    pub all_options: &'a [SelectionValue],
    /// Current selection.
    pub selection: &'a Selection,
    /// Current search text.
    pub search_text: &'a str,
    /// Whether creation is enabled and usable.
    pub creatable: bool,
    /// Parser for creation text.
    pub parser: &'a BulkCreateParser,
}

impl KeyContext<'_> {
    fn last_index(&self) -> Option<usize> {
        self.options.len().checked_sub(1)
    }

    fn has_option_named(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.all_options.iter().any(|option| option.name.to_lowercase() == name)
    }
}

/// Resolves key presses against the engine state.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardController;

impl KeyboardController {
    /// Create a keyboard controller.
    pub fn new() -> Self {
        Self
    }

    /// Decide what a key press does.
    ///
    /// Returns `None` for keys that should fall through to the text input.
    pub fn resolve(&self, key: KeyEvent, ctx: &KeyContext<'_>) -> Option<KeyAction> {
        match key.code {
            KeyCode::Down if !ctx.open => Some(KeyAction::Open {
                active_index: (!ctx.options.is_empty()).then_some(0),
            }),
            KeyCode::Up if !ctx.open => Some(KeyAction::Open {
                active_index: ctx.last_index(),
            }),
            KeyCode::Down => {
                let last = ctx.last_index()?;
                let next = match ctx.active_index {
                    Some(i) if i < last => i + 1,
                    _ => 0,
                };
                Some(KeyAction::Highlight(next))
            }
            KeyCode::Up => {
                let last = ctx.last_index()?;
                let previous = match ctx.active_index {
                    Some(i) if i > 0 && i <= last => i - 1,
                    _ => last,
                };
                Some(KeyAction::Highlight(previous))
            }
            KeyCode::Enter if ctx.open => self.resolve_enter(ctx),
            KeyCode::Esc => Some(KeyAction::Dismiss),
            KeyCode::Home | KeyCode::End | KeyCode::Left | KeyCode::Right => {
                Some(KeyAction::ReleaseHighlight)
            }
            KeyCode::Backspace if Self::can_remove_tag(ctx) => Some(KeyAction::RemoveLast),
            KeyCode::Delete if Self::can_remove_tag(ctx) => Some(KeyAction::RemoveFirst),
            _ => None,
        }
    }

    fn resolve_enter(&self, ctx: &KeyContext<'_>) -> Option<KeyAction> {
        if ctx.creatable && !ctx.search_text.is_empty() {
            if ctx.mode == Mode::Multiple && ctx.parser.has_separator(ctx.search_text) {
                return Some(KeyAction::Create(
                    ctx.parser.parse_for_selection(ctx.search_text, ctx.selection),
                ));
            }
            if !ctx.has_option_named(ctx.search_text) {
                return Some(KeyAction::Create(single_fragment(ctx)));
            }
        }

        match ctx.active_index {
            None => ctx.options.first().cloned().map(KeyAction::Commit),
            Some(index) => ctx.options.get(index).cloned().map(KeyAction::Commit),
        }
    }

    fn can_remove_tag(ctx: &KeyContext<'_>) -> bool {
        ctx.search_text.is_empty() && ctx.mode == Mode::Multiple && !ctx.selection.is_empty()
    }
}

/// The whole search text as one name, unless it is already selected.
fn single_fragment(ctx: &KeyContext<'_>) -> Vec<String> {
    let name = if ctx.parser.trims() {
        ctx.search_text.trim()
    } else {
        ctx.search_text
    };
    let lower = name.to_lowercase();
    if name.is_empty() || ctx.selection.iter().any(|value| value.name.to_lowercase() == lower) {
        Vec::new()
    } else {
        vec![name.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn fruits() -> Vec<SelectionValue> {
        vec![
            SelectionValue::new("a", "Apple"),
            SelectionValue::new("b", "Banana"),
            SelectionValue::new("c", "Cherry"),
        ]
    }

    struct Fixture {
        options: Vec<SelectionValue>,
        selection: Selection,
        parser: BulkCreateParser,
    }

    impl Fixture {
        fn new(mode: Mode) -> Self {
            Self {
                options: fruits(),
                selection: Selection::empty(mode),
                parser: BulkCreateParser::default(),
            }
        }

        fn ctx<'a>(&'a self, open: bool, active_index: Option<usize>, text: &'a str) -> KeyContext<'a> {
            KeyContext {
                mode: self.selection.mode(),
                open,
                active_index,
                options: &self.options,
                all_options: &self.options,
                selection: &self.selection,
                search_text: text,
                creatable: false,
                parser: &self.parser,
            }
        }
    }

    #[test]
    fn test_arrows_open_closed_popup() {
        let fixture = Fixture::new(Mode::Single);
        let controller = KeyboardController::new();
        let ctx = fixture.ctx(false, None, "");
        assert_eq!(
            controller.resolve(key(KeyCode::Down), &ctx),
            Some(KeyAction::Open { active_index: Some(0) })
        );
        assert_eq!(
            controller.resolve(key(KeyCode::Up), &ctx),
            Some(KeyAction::Open { active_index: Some(2) })
        );
    }

    #[test]
    fn test_arrow_opens_empty_list_without_highlight() {
        let mut fixture = Fixture::new(Mode::Single);
        fixture.options.clear();
        let ctx = fixture.ctx(false, None, "");
        assert_eq!(
            KeyboardController::new().resolve(key(KeyCode::Up), &ctx),
            Some(KeyAction::Open { active_index: None })
        );
    }

    #[test]
    fn test_arrow_wraparound() {
        let fixture = Fixture::new(Mode::Single);
        let controller = KeyboardController::new();
        assert_eq!(
            controller.resolve(key(KeyCode::Down), &fixture.ctx(true, Some(2), "")),
            Some(KeyAction::Highlight(0))
        );
        assert_eq!(
            controller.resolve(key(KeyCode::Up), &fixture.ctx(true, Some(0), "")),
            Some(KeyAction::Highlight(2))
        );
        assert_eq!(
            controller.resolve(key(KeyCode::Down), &fixture.ctx(true, Some(0), "")),
            Some(KeyAction::Highlight(1))
        );
    }

    #[test]
    fn test_arrow_from_no_highlight() {
        let fixture = Fixture::new(Mode::Single);
        let controller = KeyboardController::new();
        assert_eq!(
            controller.resolve(key(KeyCode::Down), &fixture.ctx(true, None, "")),
            Some(KeyAction::Highlight(0))
        );
        assert_eq!(
            controller.resolve(key(KeyCode::Up), &fixture.ctx(true, None, "")),
            Some(KeyAction::Highlight(2))
        );
    }

    #[test]
    fn test_arrow_on_open_empty_list_falls_through() {
        let mut fixture = Fixture::new(Mode::Single);
        fixture.options.clear();
        let ctx = fixture.ctx(true, None, "");
        assert_eq!(KeyboardController::new().resolve(key(KeyCode::Down), &ctx), None);
    }

    #[test]
    fn test_enter_without_highlight_commits_first() {
        let fixture = Fixture::new(Mode::Single);
        let action = KeyboardController::new().resolve(key(KeyCode::Enter), &fixture.ctx(true, None, ""));
        assert_eq!(action, Some(KeyAction::Commit(SelectionValue::new("a", "Apple"))));
    }

    #[test]
    fn test_enter_commits_highlighted() {
        let fixture = Fixture::new(Mode::Single);
        let action =
            KeyboardController::new().resolve(key(KeyCode::Enter), &fixture.ctx(true, Some(1), ""));
        assert_eq!(action, Some(KeyAction::Commit(SelectionValue::new("b", "Banana"))));
    }

    #[test]
    fn test_enter_while_closed_falls_through() {
        let fixture = Fixture::new(Mode::Single);
        assert_eq!(
            KeyboardController::new().resolve(key(KeyCode::Enter), &fixture.ctx(false, None, "")),
            None
        );
    }

    #[test]
    fn test_enter_creates_single_fragment() {
        let fixture = Fixture::new(Mode::Single);
        let mut ctx = fixture.ctx(true, None, "  Kiwi, Lime ");
        ctx.creatable = true;
        assert_eq!(
            KeyboardController::new().resolve(key(KeyCode::Enter), &ctx),
            Some(KeyAction::Create(vec!["Kiwi, Lime".to_string()]))
        );
    }

    #[test]
    fn test_enter_bulk_creates_in_multiple_mode() {
        let mut fixture = Fixture::new(Mode::Multiple);
        fixture.selection = Selection::Multiple(vec![SelectionValue::new("b", "Banana")]);
        let mut ctx = fixture.ctx(true, None, "kiwi, banana+lime");
        ctx.creatable = true;
        assert_eq!(
            KeyboardController::new().resolve(key(KeyCode::Enter), &ctx),
            Some(KeyAction::Create(vec!["kiwi".to_string(), "lime".to_string()]))
        );
    }

    #[test]
    fn test_enter_with_existing_name_commits_instead_of_creating() {
        let fixture = Fixture::new(Mode::Single);
        let mut ctx = fixture.ctx(true, Some(2), "cherry");
        ctx.creatable = true;
        assert_eq!(
            KeyboardController::new().resolve(key(KeyCode::Enter), &ctx),
            Some(KeyAction::Commit(SelectionValue::new("c", "Cherry")))
        );
    }

    #[test]
    fn test_escape_dismisses() {
        let fixture = Fixture::new(Mode::Single);
        let action = KeyboardController::new().resolve(key(KeyCode::Esc), &fixture.ctx(true, Some(1), ""));
        assert_eq!(action, Some(KeyAction::Dismiss));
        assert_eq!(KeyAction::Dismiss.propagation(), Propagation::Stop);
    }

    #[test]
    fn test_caret_keys_release_highlight_and_continue() {
        let fixture = Fixture::new(Mode::Single);
        let controller = KeyboardController::new();
        for code in [KeyCode::Home, KeyCode::End, KeyCode::Left, KeyCode::Right] {
            let action = controller.resolve(key(code), &fixture.ctx(true, Some(1), "ab"));
            assert_eq!(action, Some(KeyAction::ReleaseHighlight));
        }
        assert_eq!(KeyAction::ReleaseHighlight.propagation(), Propagation::Continue);
    }

    #[test]
    fn test_backspace_and_delete_remove_tags() {
        let mut fixture = Fixture::new(Mode::Multiple);
        fixture.selection = Selection::Multiple(fruits());
        let controller = KeyboardController::new();
        assert_eq!(
            controller.resolve(key(KeyCode::Backspace), &fixture.ctx(false, None, "")),
            Some(KeyAction::RemoveLast)
        );
        assert_eq!(
            controller.resolve(key(KeyCode::Delete), &fixture.ctx(false, None, "")),
            Some(KeyAction::RemoveFirst)
        );
        // With text in the box the key edits the text instead.
        assert_eq!(controller.resolve(key(KeyCode::Backspace), &fixture.ctx(false, None, "x")), None);
    }

    #[test]
    fn test_backspace_ignored_in_single_mode() {
        let mut fixture = Fixture::new(Mode::Single);
        fixture.selection = Selection::Single(Some(SelectionValue::new("a", "Apple")));
        assert_eq!(
            KeyboardController::new().resolve(key(KeyCode::Backspace), &fixture.ctx(false, None, "")),
            None
        );
    }

    #[test]
    fn test_typing_falls_through() {
        let fixture = Fixture::new(Mode::Single);
        assert_eq!(
            KeyboardController::new().resolve(key(KeyCode::Char('x')), &fixture.ctx(true, None, "")),
            None
        );
    }
}

//! Key binding helpers for the demo application.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Shortcut hints shown in the help bar, as (keys, description) pairs.
pub const KEY_HINTS: &[(&str, &str)] = &[
    ("↑/↓", "navigate"),
    ("Enter", "select/create"),
    ("Esc", "close"),
    ("Bksp/Del", "remove tag"),
    ("Ctrl+L", "clear"),
    ("Tab", "focus"),
    ("Ctrl+C", "quit"),
];

/// Check whether a key quits the demo.
pub fn is_quit(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_c_quits() {
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
    }

    #[test]
    fn test_hints_are_unique() {
        let mut keys: Vec<_> = KEY_HINTS.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), KEY_HINTS.len());
    }
}

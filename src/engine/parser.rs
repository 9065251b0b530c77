//! Splitting free text into names to create.

use std::collections::HashSet;

use super::value::Selection;

/// Default separators used for bulk creation.
pub const DEFAULT_SEPARATORS: [&str; 3] = [",", "+", "\n"];

/// Turns delimiter-separated text into candidate option names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCreateParser {
    separators: Vec<String>,
    trim: bool,
}

impl Default for BulkCreateParser {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(), true)
    }
}

impl BulkCreateParser {
    /// Create a parser. Empty separator strings are ignored.
    pub fn new(separators: Vec<String>, trim: bool) -> Self {
        Self {
            separators: separators.into_iter().filter(|s| !s.is_empty()).collect(),
            trim,
        }
    }

    /// The configured separators.
    pub fn separators(&self) -> &[String] {
        &self.separators
    }

    /// Whether fragments are trimmed.
    pub fn trims(&self) -> bool {
        self.trim
    }

    /// Check whether the text contains any configured separator.
    pub fn has_separator(&self, text: &str) -> bool {
        self.separators.iter().any(|sep| text.contains(sep.as_str()))
    }

    /// Split text on every separator, trim, and drop empty fragments.
    ///
    /// A fragment repeating an earlier one (ignoring case) is dropped, so each
    /// name appears once in the result.
    pub fn parse(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut parts = vec![text.to_string()];
        for separator in &self.separators {
            parts = parts
                .iter()
                .flat_map(|part| part.split(separator.as_str()))
                .map(str::to_string)
                .collect();
        }

        let mut seen = HashSet::new();
        parts
            .into_iter()
            .map(|part| if self.trim { part.trim().to_string() } else { part })
            .filter(|part| !part.is_empty())
            .filter(|part| seen.insert(part.to_lowercase()))
            .collect()
    }

    /// Parse text and drop names already present in the selection.
    ///
    /// Names are compared case-insensitively.
    pub fn parse_for_selection(&self, text: &str, selection: &Selection) -> Vec<String> {
        let selected: HashSet<String> = selection.iter().map(|v| v.name.to_lowercase()).collect();
        self.parse(text)
            .into_iter()
            .filter(|fragment| !selected.contains(&fragment.to_lowercase()))
            .collect()
    }
}

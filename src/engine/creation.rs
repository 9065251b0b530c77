//! Bookkeeping for options created through the engine.

use std::collections::HashSet;

use super::value::SelectionValue;

/// Tracks which options were created by this engine instance.
///
/// Invariant: `unselected` and `newly_created` are always subsets of
/// `all_created`. Options created elsewhere are never tracked.
#[derive(Debug, Clone, Default)]
pub struct CreationTracker {
    all_created: HashSet<String>,
    unselected: HashSet<String>,
    newly_created: HashSet<String>,
}

impl CreationTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly created option.
    pub fn mark_created(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.newly_created.insert(id.clone());
        self.all_created.insert(id);
    }

    /// Record that these options left the selection.
    ///
    /// Ids not created through this engine are ignored.
    pub fn mark_unselected<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            let id = id.as_ref();
            if self.all_created.contains(id) {
                self.unselected.insert(id.to_string());
            }
        }
    }

    /// Record that these options entered the selection.
    pub fn mark_selected<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.unselected.remove(id.as_ref());
        }
    }

    /// Forget every created-but-unselected option.
    pub fn clear_unselected(&mut self) {
        self.unselected.clear();
    }

    /// Remove the given ids from the newly created set, or empty it.
    pub fn clear_newly_created(&mut self, ids: Option<&[String]>) {
        match ids {
            Some(ids) => {
                for id in ids {
                    self.newly_created.remove(id);
                }
            }
            None => self.newly_created.clear(),
        }
    }

    /// Drop options that were created here and later abandoned.
    pub fn filter_unselected(&self, options: &[SelectionValue]) -> Vec<SelectionValue> {
        options
            .iter()
            .filter(|option| !self.unselected.contains(&option.id))
            .cloned()
            .collect()
    }

    /// Check whether the option was created through this engine.
    pub fn is_created(&self, id: &str) -> bool {
        self.all_created.contains(id)
    }

    /// Check whether the option belongs to the latest creation batch.
    pub fn is_newly_created(&self, id: &str) -> bool {
        self.newly_created.contains(id)
    }

    /// Check whether the option was created here and is not selected.
    pub fn is_unselected(&self, id: &str) -> bool {
        self.unselected.contains(id)
    }

    /// Number of options ever created.
    pub fn created_count(&self) -> usize {
        self.all_created.len()
    }
}

//! Selection values and the controller that owns what is currently selected.
//!
//! A [`Selection`] is either a single optional value or an ordered list of
//! values, depending on the engine [`Mode`]. The [`ValueController`] applies
//! choices to it and keeps the internal mirror in sync with a caller-owned
//! value when the selection is controlled.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A selectable option.
///
/// Two values with the same `id` are the same option regardless of `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionValue {
    /// Unique identifier for the option.
    pub id: String,
    /// Display name for the option.
    pub name: String,
}

impl SelectionValue {
    /// Create a new selection value.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Check whether this value refers to the same option as `other`.
    pub fn same_option(&self, other: &SelectionValue) -> bool {
        self.id == other.id
    }
}

/// Selection mode of the combobox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// At most one value is selected.
    #[default]
    Single,
    /// Any number of distinct values are selected, in selection order.
    Multiple,
}

/// The current selection, shaped by the mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Single mode value.
    Single(Option<SelectionValue>),
    /// Multiple mode values, no two sharing an id.
    Multiple(Vec<SelectionValue>),
}

impl Selection {
    /// The empty selection for a mode.
    pub fn empty(mode: Mode) -> Self {
        match mode {
            Mode::Single => Selection::Single(None),
            Mode::Multiple => Selection::Multiple(Vec::new()),
        }
    }

    /// The mode this selection belongs to.
    pub fn mode(&self) -> Mode {
        match self {
            Selection::Single(_) => Mode::Single,
            Selection::Multiple(_) => Mode::Multiple,
        }
    }

    /// Check whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        match self {
            Selection::Single(value) => value.is_none(),
            Selection::Multiple(values) => values.is_empty(),
        }
    }

    /// Number of selected values.
    pub fn len(&self) -> usize {
        match self {
            Selection::Single(value) => usize::from(value.is_some()),
            Selection::Multiple(values) => values.len(),
        }
    }

    /// Check whether an option with this id is selected.
    pub fn contains_id(&self, id: &str) -> bool {
        self.iter().any(|value| value.id == id)
    }

    /// Iterate over the selected values in order.
    pub fn iter(&self) -> impl Iterator<Item = &SelectionValue> {
        let slice: &[SelectionValue] = match self {
            Selection::Single(Some(value)) => std::slice::from_ref(value),
            Selection::Single(None) => &[],
            Selection::Multiple(values) => values.as_slice(),
        };
        slice.iter()
    }

    /// Ids of the selected values.
    pub fn ids(&self) -> Vec<String> {
        self.iter().map(|value| value.id.clone()).collect()
    }

    /// The single value, if this is a single selection holding one.
    pub fn as_single(&self) -> Option<&SelectionValue> {
        match self {
            Selection::Single(value) => value.as_ref(),
            Selection::Multiple(_) => None,
        }
    }

    /// The selected list, if this is a multiple selection.
    pub fn as_multiple(&self) -> Option<&[SelectionValue]> {
        match self {
            Selection::Single(_) => None,
            Selection::Multiple(values) => Some(values),
        }
    }
}

/// Result of applying a choice to the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOutcome {
    /// The selection after the choice.
    pub value: Selection,
    /// Ids that entered the selection.
    pub added: Vec<String>,
    /// Ids that left the selection.
    pub removed: Vec<String>,
    /// Whether the popup should close (single mode commits).
    pub close_requested: bool,
}

impl ChoiceOutcome {
    /// Check whether the selection changed.
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Owns the canonical selection.
#[derive(Debug, Clone)]
pub struct ValueController {
    /// Selection mode.
    mode: Mode,
    /// The internal mirror of the selection.
    value: Selection,
    /// Whether the caller owns the value.
    controlled: bool,
}

impl ValueController {
    /// Create an uncontrolled controller starting from `initial`.
    ///
    /// A value whose shape does not match `mode` is replaced by the empty
    /// selection for that mode.
    pub fn new(mode: Mode, initial: Option<Selection>) -> Self {
        let value = initial
            .filter(|value| value.mode() == mode)
            .map(dedup_by_id)
            .unwrap_or_else(|| Selection::empty(mode));
        Self {
            mode,
            value,
            controlled: false,
        }
    }

    /// Create a controller whose value is owned by the caller.
    pub fn controlled(mode: Mode, value: Selection) -> Self {
        let mut controller = Self::new(mode, Some(value));
        controller.controlled = true;
        controller
    }

    /// The selection mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The current selection.
    pub fn value(&self) -> &Selection {
        &self.value
    }

    /// Check whether the caller owns the value.
    pub fn is_controlled(&self) -> bool {
        self.controlled
    }

    /// Apply a choice.
    ///
    /// Single mode replaces the value (or clears it on `None`) and asks for
    /// the popup to close. Multiple mode toggles membership by id; `None` is
    /// a no-op.
    pub fn apply_choice(&mut self, option: Option<SelectionValue>) -> ChoiceOutcome {
        let outcome = match (&self.value, option) {
            (Selection::Single(previous), option) => {
                let previous_id = previous.as_ref().map(|value| value.id.clone());
                let next_id = option.as_ref().map(|value| value.id.clone());
                let (added, removed) = if previous_id == next_id {
                    (Vec::new(), Vec::new())
                } else {
                    (next_id.into_iter().collect(), previous_id.into_iter().collect())
                };
                ChoiceOutcome {
                    value: Selection::Single(option),
                    added,
                    removed,
                    close_requested: true,
                }
            }
            (Selection::Multiple(values), None) => ChoiceOutcome {
                value: Selection::Multiple(values.clone()),
                added: Vec::new(),
                removed: Vec::new(),
                close_requested: false,
            },
            (Selection::Multiple(values), Some(option)) => {
                let mut next = values.clone();
                if let Some(pos) = next.iter().position(|value| value.same_option(&option)) {
                    next.remove(pos);
                    ChoiceOutcome {
                        value: Selection::Multiple(next),
                        added: Vec::new(),
                        removed: vec![option.id],
                        close_requested: false,
                    }
                } else {
                    let id = option.id.clone();
                    next.push(option);
                    ChoiceOutcome {
                        value: Selection::Multiple(next),
                        added: vec![id],
                        removed: Vec::new(),
                        close_requested: false,
                    }
                }
            }
        };

        trace!(added = ?outcome.added, removed = ?outcome.removed, "Applied choice");
        self.value = outcome.value.clone();
        outcome
    }

    /// Add values to a multiple selection without toggling existing ones off.
    ///
    /// In single mode the last value replaces the selection. An empty list
    /// leaves the selection untouched in either mode.
    pub fn extend(&mut self, options: Vec<SelectionValue>) -> ChoiceOutcome {
        match &self.value {
            Selection::Single(_) => match options.into_iter().last() {
                Some(last) => self.apply_choice(Some(last)),
                None => ChoiceOutcome {
                    value: self.value.clone(),
                    added: Vec::new(),
                    removed: Vec::new(),
                    close_requested: false,
                },
            },
            Selection::Multiple(values) => {
                let mut next = values.clone();
                let mut added = Vec::new();
                for option in options {
                    if !next.iter().any(|value| value.same_option(&option)) {
                        added.push(option.id.clone());
                        next.push(option);
                    }
                }
                self.value = Selection::Multiple(next);
                ChoiceOutcome {
                    value: self.value.clone(),
                    added,
                    removed: Vec::new(),
                    close_requested: false,
                }
            }
        }
    }

    /// Remove the last selected value of a multiple selection.
    pub fn remove_last(&mut self) -> Option<ChoiceOutcome> {
        let last = self.value.as_multiple()?.last()?.clone();
        Some(self.apply_choice(Some(last)))
    }

    /// Remove the first selected value of a multiple selection.
    pub fn remove_first(&mut self) -> Option<ChoiceOutcome> {
        let first = self.value.as_multiple()?.first()?.clone();
        Some(self.apply_choice(Some(first)))
    }

    /// Reset to the empty selection.
    pub fn clear(&mut self) -> ChoiceOutcome {
        let removed = self.value.ids();
        self.value = Selection::empty(self.mode);
        ChoiceOutcome {
            value: self.value.clone(),
            added: Vec::new(),
            removed,
            close_requested: false,
        }
    }

    /// Resynchronise with a caller-owned value.
    ///
    /// Returns true if the mirror changed. Comparison is by value (id and
    /// name), so an equal value supplied again is ignored.
    pub fn sync_external(&mut self, external: Selection) -> bool {
        if external.mode() != self.mode {
            debug!(expected = ?self.mode, "Ignoring external value with mismatched mode");
            return false;
        }
        let external = dedup_by_id(external);
        if external == self.value {
            return false;
        }
        debug!("Resynchronising to external value");
        self.value = external;
        true
    }
}

/// Drop later duplicates (by id) from a multiple selection.
fn dedup_by_id(selection: Selection) -> Selection {
    match selection {
        Selection::Single(value) => Selection::Single(value),
        Selection::Multiple(values) => {
            let mut seen = std::collections::HashSet::new();
            Selection::Multiple(
                values
                    .into_iter()
                    .filter(|value| seen.insert(value.id.clone()))
                    .collect(),
            )
        }
    }
}

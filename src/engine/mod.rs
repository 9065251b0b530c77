//! Headless combobox interaction engine.
//!
//! The engine keeps the selection, search text, popup and highlight state of
//! a searchable, creatable combobox consistent. Rendering is left to the
//! caller, which feeds input events in and reads [`EngineView`] and
//! [`EngineEvent`]s out.

pub mod autocomplete;
pub mod creation;
pub mod error;
pub mod keyboard;
pub mod parser;
pub mod search;
pub mod value;

pub use autocomplete::{
    AutoCompleteEngine, EngineBuilder, EngineEvent, EngineView, OptionInserter, PopupStatus,
};
pub use creation::CreationTracker;
pub use error::{EngineWarning, SearchError};
pub use keyboard::{KeyAction, KeyContext, KeyboardController, Propagation};
pub use parser::BulkCreateParser;
pub use search::{SearchController, SearchHandler, SearchOutcome, SearchTicket};
pub use value::{ChoiceOutcome, Mode, Selection, SelectionValue, ValueController};

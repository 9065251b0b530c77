//! Combokit - a headless, searchable and creatable combobox engine.
//!
//! [`engine::AutoCompleteEngine`] holds all combobox interaction state and is
//! independent of any renderer. The remaining modules make up a terminal demo
//! built on ratatui.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod tasks;
pub mod ui;

pub use config::{EngineConfig, Settings};
pub use engine::{
    AutoCompleteEngine, EngineBuilder, EngineEvent, Mode, Selection, SelectionValue,
};
pub use error::{AppError, Result};

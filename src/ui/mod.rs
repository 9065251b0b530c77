//! Terminal rendering for the demo application.

mod combobox;
mod help_bar;
pub mod theme;

pub use combobox::Combobox;
pub use help_bar::render_help_bar;
pub use theme::Theme;

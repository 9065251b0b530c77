//! Combokit demo - a searchable, creatable combobox in the terminal.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, info};

use combokit::app::{default_catalog, load_options, App};
use combokit::config::Settings;
use combokit::engine::Mode;
use combokit::error::AppError;
use combokit::events::EventHandler;
use combokit::logging::{self, LogOptions};

#[derive(Parser, Debug)]
#[command(
    name = "combokit",
    about = "Try the combokit combobox engine in the terminal",
    version,
    long_about = None
)]
struct Cli {
    /// Allow selecting several values.
    #[arg(long)]
    multiple: bool,

    /// Allow creating options that do not exist yet.
    #[arg(long)]
    creatable: bool,

    /// Search on a background task with simulated latency.
    #[arg(long)]
    async_search: bool,

    /// Delay before a typed query is searched.
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Simulated latency of the background search.
    #[arg(long, value_name = "MS")]
    latency_ms: Option<u64>,

    /// Settings file to use instead of the default location.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// File with one option per line, or a JSON array of options.
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Directory for log files.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Log every engine decision.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply command line overrides on top of loaded settings.
    fn apply(&self, settings: &mut Settings) {
        if self.multiple {
            settings.engine.mode = Mode::Multiple;
        }
        if self.creatable {
            settings.engine.creatable = true;
        }
        if self.async_search {
            settings.engine.async_search = true;
        }
        if let Some(ms) = self.debounce_ms {
            settings.engine.search_debounce_ms = ms;
        }
        if let Some(ms) = self.latency_ms {
            settings.demo.latency_ms = ms;
        }
    }

    fn load_settings(&self) -> combokit::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };
        self.apply(&mut settings);
        settings.engine.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = logging::init(&LogOptions {
        dir: cli.log_dir.clone(),
        verbose: cli.verbose,
    })?;

    let settings = cli
        .load_settings()
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    let catalog = match &cli.options {
        Some(path) => load_options(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => default_catalog(),
    };
    info!(
        options = catalog.len(),
        mode = ?settings.engine.mode,
        creatable = settings.engine.creatable,
        "Starting demo"
    );

    let mut app = App::new(&settings, catalog);
    let result = run(&mut app, settings.demo.tick_rate_ms);
    if let Err(err) = &result {
        error!(error = %err, "Demo exited with an error");
    }

    logging::shutdown(&log_dir);
    result
}

/// Run the terminal UI until the user quits.
fn run(app: &mut App, tick_rate_ms: u64) -> Result<()> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    enable_raw_mode().map_err(|e| AppError::terminal(format!("could not enable raw mode: {}", e)))?;
    let mut stdout = io::stdout();
    stdout
        .execute(EnterAlternateScreen)
        .and_then(|out| out.execute(EnableBracketedPaste))
        .and_then(|out| out.execute(EnableFocusChange))
        .map_err(|e| AppError::terminal(format!("could not set up the screen: {}", e)))?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))
        .map_err(|e| AppError::terminal(format!("could not create the terminal: {}", e)))?;
    terminal.clear()?;

    let events = EventHandler::with_tick_rate(tick_rate_ms);
    let result = (|| -> Result<()> {
        while !app.should_quit() {
            terminal.draw(|frame| app.view(frame))?;
            let event = events.next()?;
            app.update(event);
        }
        Ok(())
    })();

    restore_terminal()?;
    terminal.show_cursor()?;
    result
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(DisableFocusChange)?;
    stdout.execute(DisableBracketedPaste)?;
    stdout.execute(LeaveAlternateScreen)?;
    Ok(())
}

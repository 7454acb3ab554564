use std::io;
use std::time::Duration;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use miette::IntoDiagnostic;
use ratatui::{backend::CrosstermBackend, Terminal};

use combat_pad::config::AppConfig;
use combat_pad::core::commands;
use combat_pad::core::logging;
use combat_pad::core::tracker::CombatTracker;
use combat_pad::tui::app::AppState;

const USAGE: &str = "usage: combat-pad [saves]";

#[tokio::main]
async fn main() -> miette::Result<()> {
    let config = AppConfig::load();

    match std::env::args().nth(1).as_deref() {
        None => run_tui(config).await,
        Some("saves") => list_saves(config).await,
        Some(_) => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

/// Print the save directory listing as JSON.
async fn list_saves(config: AppConfig) -> miette::Result<()> {
    let _log_guard = logging::init(&config.log_dir());
    let tracker = CombatTracker::from_config(&config);

    let result = commands::list_save_files(&tracker).await;
    let json = serde_json::to_string_pretty(&result).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

async fn run_tui(config: AppConfig) -> miette::Result<()> {
    let _log_guard = logging::init_tui(&config.log_dir());
    tracing::info!("{} v{} starting", combat_pad::NAME, combat_pad::VERSION);

    let tracker = CombatTracker::from_config(&config);
    match tracker.bootstrap().await {
        Ok(Some(filename)) => tracing::info!(filename = %filename, "restored last save"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "could not restore last save"),
    }

    // Setup terminal
    enable_raw_mode().into_diagnostic()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).into_diagnostic()?;
    if config.tui.mouse_enabled {
        execute!(stdout, EnableMouseCapture).into_diagnostic()?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).into_diagnostic()?;

    let mut app = AppState::new(tracker);
    let result = app
        .run(&mut terminal, Duration::from_millis(config.tui.tick_rate_ms))
        .await;

    // Restore terminal
    disable_raw_mode().into_diagnostic()?;
    if config.tui.mouse_enabled {
        execute!(terminal.backend_mut(), DisableMouseCapture).into_diagnostic()?;
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen).into_diagnostic()?;
    terminal.show_cursor().into_diagnostic()?;

    result.into_diagnostic()
}

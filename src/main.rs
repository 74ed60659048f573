use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use momentum::config::Config;
use momentum::gateway::RestGateway;
use momentum::kanban_board::KanbanBoard;
use momentum::ui::{run_app, App};

#[tokio::main]
async fn main() -> Result<()> {
    // Missing store settings abort before the terminal is touched
    let config = Config::from_env()?;

    // The terminal owns stdout, so logs go to a file
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("cannot open log file '{}'", config.log_file))?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    info!("Starting Momentum v{}", env!("CARGO_PKG_VERSION"));

    let gateway = RestGateway::from_config(&config).context("failed to build HTTP client")?;
    info!("Store endpoint: {}", gateway.endpoint());

    let board = KanbanBoard::new(config.owner_id.clone());
    let (mut app, mut completions) = App::new(board, Arc::new(gateway));

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut completions).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!("event loop failed: {err}");
        return Err(err.into());
    }
    info!("Momentum exited");
    Ok(())
}

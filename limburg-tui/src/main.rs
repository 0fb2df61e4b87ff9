//! Terminal dashboard and one-shot CLI for upcoming Limburg.net waste pickups.

mod app;
mod cli;
mod input;
mod ui;

use std::{
    fs::OpenOptions,
    io,
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use anyhow::{Result, anyhow};
use clap::Parser;
use crossterm::{
    event::{self, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use limburg_core::refresh::{RefreshCoordinator, RefreshState};
use limburg_provider_http as http;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::cli::Cli;
use crate::input::Action;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    // HTTP + coordinator setup
    let settings = cli.settings()?;
    let port = http::port(http::client()?, settings.fetch_timeout);
    let coordinator = Arc::new(RefreshCoordinator::from_settings(settings, port));

    // Eager first load; later cycles follow the schedule
    let state = coordinator.refresh().await;

    if cli.once {
        return print_once(&state);
    }

    info!(interval = ?coordinator.interval(), "starting scheduled refreshes");
    let schedule = coordinator.spawn();

    // App state
    let app = App::new(Arc::clone(&coordinator));

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    schedule.abort();
    res
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new("info"));

    // The dashboard owns the terminal, so it only logs when given a file.
    if let Some(path) = &cli.log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if cli.once {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

#[expect(clippy::print_stdout, reason = "one-shot mode reports its result on stdout")]
fn print_once(state: &RefreshState) -> Result<()> {
    let status = state.status();
    let snapshot = state.snapshot();

    let report = serde_json::json!({
        "source": snapshot.map(|current| current.source()),
        "status": status.label(),
        "error": status.error(),
        "result": snapshot.map(|current| current.published()),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    match state.error() {
        Some(err) if snapshot.is_none() => Err(anyhow!("no pickup data available: {err}")),
        _ => Ok(()),
    }
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    let mut redraw = true;
    loop {
        // Pick up results of scheduled or manual refreshes
        redraw |= app.sync();

        // Draw current UI
        if redraw {
            terminal.draw(|frame| ui::draw(frame, &app))?;
            redraw = false;
        }

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if !event::poll(StdDuration::from_millis(100))? {
            continue;
        }
        // Any event, including a resize, invalidates the frame
        redraw = true;
        if let CEvent::Key(key) = event::read()? {
            match input::handle_key_event(key, &mut app) {
                Action::Quit => break,
                Action::None => {}
                Action::Refresh => {
                    // Runs in the background; the coordinator coalesces overlapping requests
                    let coordinator = Arc::clone(&app.coordinator);
                    tokio::spawn(async move {
                        let _state = coordinator.refresh().await;
                    });
                }
            }
        }
    }

    Ok(())
}

//! PledgeBoard TUI — two-page terminal dashboard.
//!
//! Pages:
//! 1. Bundle selection: catalog with estimated cost and pledge progress
//! 2. Bundle detail: trailing returns, risk, dividends, return chart, pledge box
//!
//! Usage: `pledgeboard-tui [config.toml]`. Logs go to a file so they do not
//! corrupt the alternate screen.

mod app;
mod input;
mod theme;
mod ui;
mod worker;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use pledgeboard_core::AppConfig;

use crate::app::AppState;
use crate::worker::WorkerResponse;

fn init_logging() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pledgeboard");
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join("pledgeboard-tui.log");
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(path)
}

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let log_path = init_logging()?;
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig::discover(config_path.as_deref())?;
    tracing::info!(log = %log_path.display(), provider = ?config.provider.kind, "starting");

    eprintln!("Pricing {} bundles...", config.bundles.len());
    let dashboard = pledgeboard_runner::build_dashboard(&config)?;

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_handle = worker::spawn_worker(cmd_rx, resp_tx, cancel.clone())
        .context("spawning worker thread")?;

    let mut app = AppState::new(dashboard, cmd_tx.clone(), resp_rx, cancel);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Shutdown worker
    let busy = app.loading.is_some();
    worker::shutdown_worker(&cmd_tx, worker_handle, &app.cancel, busy);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    for line in app.dashboard.pledge_summary() {
        println!("{line}");
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    match resp {
        WorkerResponse::BundleLoaded { ticket, result } => app.apply_loaded(ticket, *result),
        WorkerResponse::Cancelled { ticket } => {
            tracing::debug!(bundle = %ticket.bundle.name, "load cancelled");
            if app.loading.as_ref() == Some(&ticket) {
                app.loading = None;
            }
        }
    }
}

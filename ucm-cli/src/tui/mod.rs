//! Interactive terminal front end
//!
//! Builds the [`Session`] once, then loops: paint a frame, wait for a key or
//! the tick interval, hand the decoded event to the session.

mod draw;
mod executor;
mod keys;
mod terminal;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as TermEvent};
use tracing::{debug, info};
use ucm_core::{ConfigManager, ConnectionListController, Event, Launcher, Outcome, Session};

use crate::CliError;
use draw::TerminalRenderer;
use executor::TerminalExecutor;
use terminal::TerminalGuard;

/// How long to wait for input before sending a tick
const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Runs the interactive UI until the user quits
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded or the terminal cannot
/// be driven.
pub fn run(config: ConfigManager) -> Result<(), CliError> {
    let settings = config
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?;
    if config
        .ensure_sample_connections()
        .map_err(|e| CliError::Config(format!("Failed to create sample connections: {e}")))?
    {
        info!(path = %config.connections_path().display(), "First run");
    }

    let (list, report) = ConnectionListController::open(config, settings.history.max_entries);
    let launcher = Launcher::new(settings.terminal.clone());
    let resumed = Arc::new(AtomicBool::new(false));
    let executor = TerminalExecutor::new(Arc::clone(&resumed));
    let mut session = Session::new(settings, list, executor, launcher);
    if let Some(message) = report.blocking_message() {
        session.show_message("Configuration error", message);
    }

    let _guard = TerminalGuard::new().map_err(|e| CliError::Terminal(e.to_string()))?;
    let mut renderer =
        TerminalRenderer::stdout().map_err(|e| CliError::Terminal(e.to_string()))?;
    info!("Interactive session started");

    let mut last_tick = Instant::now();
    loop {
        if resumed.swap(false, Ordering::Acquire) {
            renderer
                .clear()
                .map_err(|e| CliError::Terminal(e.to_string()))?;
        }
        session.render(&mut renderer);

        let timeout = TICK_INTERVAL.saturating_sub(last_tick.elapsed());
        if event::poll(timeout).map_err(|e| CliError::Terminal(e.to_string()))? {
            match event::read().map_err(|e| CliError::Terminal(e.to_string()))? {
                TermEvent::Key(key) => {
                    if let Some(key) = keys::decode(&key) {
                        if session.handle(Event::Key(key)) == Outcome::Quit {
                            break;
                        }
                    }
                }
                // ratatui resizes its buffers on the next draw
                TermEvent::Resize(..) => {}
                other => debug!(event = ?other, "Ignored terminal event"),
            }
        }

        if last_tick.elapsed() >= TICK_INTERVAL {
            last_tick = Instant::now();
            session.handle(Event::Tick(last_tick));
        }
    }

    info!("Interactive session ended");
    Ok(())
}

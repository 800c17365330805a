mod app;
mod cli;
mod document;
mod dump;
mod env;
mod error;
mod event;
mod http;
mod input;
mod scripting;
mod state;
mod terminal;
mod theme;
mod ui;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::cli::Cli;
use crate::document::loader::load_documents;
use crate::env::store::ProcessEnv;
use crate::error::StartupError;
use crate::event::Event;
use crate::http::client::build_client;
use crate::state::app_state::AppState;
use crate::state::session::Session;
use crate::terminal::TerminalGuard;
use crate::theme::Theme;
use crate::ui::{layout, renderer::Renderer};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.log_file());

    let runtime = Runtime::new()?;
    let result = runtime.block_on(run(cli));
    shutdown(runtime);
    result
}

/// Sends and postscripts still running on the blocking pool are abandoned
/// on quit.
fn shutdown(runtime: Runtime) {
    runtime.shutdown_timeout(Duration::from_millis(100));
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.dump {
        let report = load_documents(&cli.path)?;
        for failure in &report.failures {
            eprintln!("skipped {}", failure.describe());
        }
        print!("{}", dump::render(&report));
        return Ok(());
    }

    let mut theme = Theme::load(cli.theme.as_deref())?;
    cli.apply_overrides(&mut theme);
    let report = load_documents(&cli.path)?;
    let client = build_client(cli.timeout()).map_err(StartupError::Client)?;

    let session = Session::from_report(report);
    if session.is_empty() {
        tracing::warn!(path = %cli.path.display(), "No requests found");
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let state = AppState::new(session, theme.wrap_focus);
    let mut app = App::new(state, theme, client, Arc::new(ProcessEnv::new()), tx.clone());

    let mut guard = TerminalGuard::enter().map_err(StartupError::Terminal)?;
    spawn_input_thread(tx);
    let result = run_loop(&mut guard, &mut app, &mut rx).await;
    drop(guard);

    tracing::info!("Exiting");
    result
}

/// Log to a file, never to the terminal the UI draws on. Logging is
/// skipped if the log directory cannot be created.
fn init_logging(path: &Path) -> Option<WorkerGuard> {
    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path.file_name()?;
    std::fs::create_dir_all(dir).ok()?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_env("HTTUI_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    Some(guard)
}

/// Blocking key reads on a dedicated thread, so the main loop only ever
/// waits on its channel.
fn spawn_input_thread(tx: UnboundedSender<Event>) {
    std::thread::spawn(move || {
        loop {
            let event = match crossterm::event::read() {
                Ok(crossterm::event::Event::Key(key)) => Event::Key(key),
                Ok(crossterm::event::Event::Resize(width, height)) => Event::Resize(width, height),
                Ok(_) => continue,
                Err(err) => {
                    tracing::error!(error = %err, "Terminal input failed");
                    break;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
}

async fn run_loop(
    guard: &mut TerminalGuard,
    app: &mut App,
    rx: &mut UnboundedReceiver<Event>,
) -> anyhow::Result<()> {
    let mut renderer = Renderer::new(guard.writer(), app.theme.color_mode);
    loop {
        let (width, height) = crossterm::terminal::size()?;
        renderer.draw(layout::compose(&app.state, &app.theme, width, height))?;

        let Some(event) = rx.recv().await else {
            break;
        };
        if let Event::Resize(width, height) = event {
            tracing::debug!(width, height, "Terminal resized");
            renderer.invalidate();
        }
        app.handle_event(event);

        if app.state.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn test_shutdown_does_not_wait_for_blocking_work() {
        let runtime = Runtime::new().unwrap();
        runtime.spawn_blocking(|| std::thread::sleep(Duration::from_secs(30)));

        let started = Instant::now();
        shutdown(runtime);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}

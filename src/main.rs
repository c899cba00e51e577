//! psx-newsfeed — a terminal reader for the market-intelligence news feed.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐   Job    ┌───────────┐  HTTP   ┌──────────┐
//! │  app.rs   │ ───────► │ worker.rs │ ──────► │ backend  │
//! │ (feed.rs) │ ◄─────── │ (thread)  │         │  (REST)  │
//! └───────────┘ Outcome  └───────────┘         └──────────┘
//!    ▲      │
//!    │      └── draw() ──► ui.rs
//!    │ handle_key_event()
//! ┌──────────┐
//! │ input.rs │
//! └──────────┘
//! ```
//!
//! * **`source/`** — the `NewsBackend` trait, decoded article / stats types,
//!   and the HTTP implementation.
//! * **`feed`** — the pagination controller: modes, paging, filtering.
//! * **`worker`** — a background thread that executes the controller's jobs.
//! * **`app`** — owns the controller plus selection and status state.
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` actions.
//! * **`config`** / **`logging`** — TOML settings and the tracing subscriber.
//! * **`main`** — wires everything together: parse args, set up the terminal,
//!   and run the event loop.

mod app;
mod config;
mod feed;
mod input;
mod logging;
mod source;
mod ui;
mod worker;

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info};

use app::App;
use config::Config;
use feed::{FeedController, Job};
use source::HttpBackend;

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// `psx-newsfeed [CONFIG_PATH] [--api-base URL]`
#[derive(Debug, PartialEq)]
struct Args {
    config_path: PathBuf,
    api_base: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut config_path = None;
    let mut api_base = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--api-base" => {
                api_base = Some(args.next().context("--api-base needs a URL")?);
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            _ if config_path.is_none() => config_path = Some(PathBuf::from(&arg)),
            _ => bail!("unexpected argument {arg}"),
        }
    }

    Ok(Args {
        config_path: config_path.unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH)),
        api_base,
    })
}

/// Hand a job to the worker, if there is one.
fn dispatch(jobs: &Sender<Job>, job: Option<Job>) -> Result<()> {
    if let Some(job) = job {
        debug!(seq = job.seq(), "dispatching job");
        jobs.send(job).context("news worker stopped")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // -- configuration and logging -------------------------------------------
    let args = parse_args(std::env::args().skip(1))?;
    let config = Config::load(&args.config_path, args.api_base)?;

    logging::init(&config.log)?;
    info!(base_url = %config.api.base_url, "starting psx-newsfeed");

    // -- background worker ---------------------------------------------------
    let backend = HttpBackend::new(&config.api)?;
    let (jobs, outcomes) = worker::spawn(Box::new(backend))?;

    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(FeedController::new(config.feed.clone()));

    let job = app.initial_load();
    dispatch(&jobs, job)?;

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain any outcomes from the worker.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(outcome) = outcomes.try_recv() {
            app.handle_outcome(outcome);
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                let job = input::handle_key_event(&mut app, key);
                dispatch(&jobs, job)?;
            }
        }

        if app.quit {
            break;
        }
    }

    info!("exiting");
    // `guard` is dropped here, restoring the terminal.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_args_uses_default_config() {
        let parsed = args(&[]).unwrap();
        assert_eq!(parsed.config_path, PathBuf::from("newsfeed.toml"));
        assert!(parsed.api_base.is_none());
    }

    #[test]
    fn config_path_and_api_base() {
        let parsed = args(&["conf/dev.toml", "--api-base", "http://10.0.0.2:8000"]).unwrap();
        assert_eq!(parsed.config_path, PathBuf::from("conf/dev.toml"));
        assert_eq!(parsed.api_base.as_deref(), Some("http://10.0.0.2:8000"));
    }

    #[test]
    fn api_base_without_value_is_an_error() {
        assert!(args(&["--api-base"]).is_err());
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(args(&["--verbose"]).is_err());
    }

    #[test]
    fn second_positional_is_an_error() {
        assert!(args(&["a.toml", "b.toml"]).is_err());
    }

    #[test]
    fn dispatch_without_job_is_ok() {
        let (tx, _rx) = std::sync::mpsc::channel();
        assert!(dispatch(&tx, None).is_ok());
    }

    #[test]
    fn dispatch_to_stopped_worker_fails() {
        let (tx, rx) = std::sync::mpsc::channel();
        drop(rx);
        let mut feed = FeedController::new(config::FeedConfig::default());
        assert!(dispatch(&tx, feed.initial_load()).is_err());
    }
}

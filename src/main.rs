//! cepbook - Terminal Address Book
//!
//! Lists, filters, edits and deletes saved addresses, and fills the street,
//! district, city and state of a new address in from its CEP using the
//! ViaCEP service.

use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use cepbook::application::{App, Route};
use cepbook::config::{Args, Settings};
use cepbook::infrastructure::{RecordStore, SlotBackend, ViaCepClient};
use cepbook::presentation::{render_ui, InputHandler};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

/// How long to wait for a key before checking on background lookups.
const TICK: Duration = Duration::from_millis(100);

/// Entry point for the cepbook terminal address book.
///
/// Resolves the configuration, starts logging, sets up the terminal and runs
/// the event loop until the user quits.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened, the lookup client
/// cannot be built, or terminal setup fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_args(Args::parse());
    init_logging(&settings)?;
    info!("starting with data in {}", settings.data_dir.display());

    let store = RecordStore::new(settings.slot());
    let lookup = ViaCepClient::new(settings.lookup_url.clone(), settings.lookup_timeout)?;
    let initial = Route::parse_or_listing(&settings.initial_route);
    let mut app = App::new(store, Arc::new(lookup), initial);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    info!("exiting");
    Ok(())
}

/// Sends log output to the configured file; the terminal belongs to the UI.
fn init_logging(settings: &Settings) -> io::Result<()> {
    if let Some(parent) = settings.log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Main application event loop.
///
/// Polls for keys with a short timeout so finished postal lookups show up
/// without waiting for the next key press.
///
/// # Errors
///
/// Returns an IO error if terminal operations fail.
fn run_app<B: Backend, S: SlotBackend>(terminal: &mut Terminal<B>, app: &mut App<S>) -> io::Result<()> {
    loop {
        app.poll_lookups();
        terminal.draw(|f| render_ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    InputHandler::handle_key_event(app, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

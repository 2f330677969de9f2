use std::time::Duration;

use crossterm::event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::warn;

use crate::app::App;
use crate::audio::AudioOutput;
use crate::cli::{Cli, Command};
use crate::logging;
use crate::playback::{NowPlaying, PlaybackSession};
use crate::source::{ApiClient, Fetcher};

mod event_loop;
mod settings;
mod startup;

pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (settings, problem) = settings::load_settings();

    if cli.command == Some(Command::Config) {
        if let Some(problem) = problem {
            eprintln!("fermata: {problem}");
        }
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    if let Err(e) = logging::init(&settings.logging) {
        eprintln!("fermata: logging disabled: {e}");
    }
    if let Some(problem) = problem {
        warn!("{problem}");
    }

    let client = ApiClient::new(&settings.api)?;
    let fetcher = Fetcher::spawn(client);

    let output = AudioOutput::spawn(settings.audio.clone())?;
    let mut session = PlaybackSession::new(output, NowPlaying::default());

    let mut app = App::new(
        Duration::from_millis(settings.controls.search_debounce_ms),
        Duration::from_millis(settings.ui.notice_ms),
    );
    let signed_in = settings
        .api
        .access_token
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    for request in startup::initial_requests(&mut app, cli.command.as_ref(), signed_in) {
        fetcher.request(request);
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &mut session,
        &fetcher,
        &mut state,
    );

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    run_result
}

use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::layout::Rect;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info};

use crate::app::{Activation, App, InputMode};
use crate::audio::AudioOutput;
use crate::config;
use crate::playback::{NowPlaying, PlaybackSession, PointerEvent, PositionControl};
use crate::source::{FetchRequest, FetchResult, Fetcher, QueueContext};
use crate::ui::{self, BarState};

pub type Session = PlaybackSession<AudioOutput, NowPlaying>;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Screen area of the progress bar in the last drawn frame.
    pub bar: Rect,
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Down,
    Up,
    Activate,
    Back,
    TogglePlay,
    Prev,
    Next,
    ScrubBack,
    ScrubForward,
    ToggleSection,
    CycleSort,
    StartSearch,
    ToggleFollow,
    NewPlaylist,
    RenamePlaylist,
    DeletePlaylist,
    InputChar(char),
    InputBackspace,
    InputSubmit,
    InputCancel,
}

/// Main terminal event loop: relays transport events and fetch results,
/// draws the UI and dispatches input. Returns `Ok(())` when shutdown is
/// requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    session: &mut Session,
    fetcher: &Fetcher,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let now = Instant::now();

        // Transport events are applied strictly in the order they were produced.
        for event in session.transport_mut().poll_events() {
            session.handle_event(event);
        }

        for result in fetcher.poll() {
            if let Some(request) = apply_fetch_result(result, app, now) {
                fetcher.request(request);
            }
        }

        if let Some(query) = app.due_search(now) {
            debug!(%query, "search debounce elapsed");
            fetcher.request(FetchRequest::Queue(QueueContext::Search(query)));
        }

        let bar = BarState {
            value: session.control().value(),
            dragging: session.control().is_dragging(),
        };
        let playback = session.state();
        let queue_pos = playback
            .current_index
            .map(|i| (i, playback.tracks.len()));
        let mut bar_area = state.bar;
        terminal.draw(|f| {
            bar_area = ui::draw(f, app, session.presenter(), queue_pos, bar, settings, now);
        })?;
        state.bar = bar_area;
        session
            .control_mut()
            .set_bounds(f64::from(bar_area.x), f64::from(bar_area.width));

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let Some(action) = key_action(key, app.input_mode()) else {
                        continue;
                    };
                    if action == Action::Quit {
                        break;
                    }
                    apply_action(action, settings, app, session, fetcher);
                }
                Event::Mouse(mouse) => {
                    if let Some(pointer) = pointer_event(mouse, state.bar.y, session.control()) {
                        session.handle_pointer(pointer);
                    }
                }
                Event::FocusLost => {
                    // The button may come up outside the terminal, where no release is reported.
                    if let Some(pointer) = abandon_drag(session.control()) {
                        debug!("focus lost mid-drag");
                        session.handle_pointer(pointer);
                    }
                }
                _ => {}
            }
        }
    }

    info!("quit requested");
    session
        .transport_mut()
        .quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
    session.stop();
    Ok(())
}

fn key_action(key: KeyEvent, mode: InputMode) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c')).then_some(Action::Quit);
    }

    if mode != InputMode::Normal {
        return match key.code {
            KeyCode::Esc => Some(Action::InputCancel),
            KeyCode::Enter => Some(Action::InputSubmit),
            KeyCode::Backspace => Some(Action::InputBackspace),
            KeyCode::Char(c) if !c.is_control() => Some(Action::InputChar(c)),
            _ => None,
        };
    }

    Some(match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => Action::Down,
        KeyCode::Char('k') | KeyCode::Up => Action::Up,
        KeyCode::Enter => Action::Activate,
        KeyCode::Backspace | KeyCode::Esc => Action::Back,
        KeyCode::Char(' ') | KeyCode::Char('p') => Action::TogglePlay,
        KeyCode::Char('h') => Action::Prev,
        KeyCode::Char('l') => Action::Next,
        KeyCode::Char('H') => Action::ScrubBack,
        KeyCode::Char('L') => Action::ScrubForward,
        KeyCode::Tab => Action::ToggleSection,
        KeyCode::Char('s') => Action::CycleSort,
        KeyCode::Char('/') => Action::StartSearch,
        KeyCode::Char('f') => Action::ToggleFollow,
        KeyCode::Char('n') => Action::NewPlaylist,
        KeyCode::Char('r') => Action::RenamePlaylist,
        KeyCode::Char('D') => Action::DeletePlaylist,
        _ => return None,
    })
}

/// Map terminal mouse input onto the position control.
///
/// Presses only count on the bar itself; once a drag is under way, moves and
/// releases are honoured anywhere on screen. Motion with no button held
/// during a drag means the release happened where the terminal could not
/// see it, so it ends the drag.
fn pointer_event(mouse: MouseEvent, bar_row: u16, control: &PositionControl) -> Option<PointerEvent> {
    // Aim at the middle of the cell so both edges of the bar are reachable.
    let x = f64::from(mouse.column) + 0.5;
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            (mouse.row == bar_row && control.contains(x)).then(|| PointerEvent::press(x))
        }
        MouseEventKind::Drag(MouseButton::Left) => Some(PointerEvent::moved(x)),
        MouseEventKind::Up(MouseButton::Left) => Some(PointerEvent::release(x)),
        MouseEventKind::Moved if control.is_dragging() => Some(PointerEvent::release(x)),
        _ => None,
    }
}

/// Release that closes a drag the terminal lost track of, committing the
/// value shown when it was lost.
fn abandon_drag(control: &PositionControl) -> Option<PointerEvent> {
    control
        .is_dragging()
        .then(|| PointerEvent::release(f64::NAN))
}

fn apply_action(
    action: Action,
    settings: &config::Settings,
    app: &mut App,
    session: &mut Session,
    fetcher: &Fetcher,
) {
    let now = Instant::now();
    let scrub = settings.controls.scrub_seconds as f64;

    match action {
        Action::Down => app.next(),
        Action::Up => app.prev(),
        Action::Back => app.back(),
        Action::Activate => match app.activate() {
            Some(Activation::Open(context)) => {
                app.loading = true;
                fetcher.request(FetchRequest::Queue(context));
            }
            Some(Activation::Play(selection)) => {
                if let Some(track) = selection.tracks.get(selection.index) {
                    if track.audio_url.is_none() {
                        app.notify_error(format!("No audio for {}", track.display()), now);
                    }
                }
                session.on_track_selected(selection);
            }
            None => {}
        },
        Action::TogglePlay => session.toggle_play_pause(),
        Action::Prev => session.advance(-1),
        Action::Next => session.advance(1),
        Action::ScrubBack => session.seek_by(-scrub),
        Action::ScrubForward => session.seek_by(scrub),
        Action::ToggleSection => {
            let section = app.toggle_section();
            fetcher.request(FetchRequest::Browse(section));
        }
        Action::CycleSort => app.cycle_sort(now),
        Action::StartSearch => app.enter_search_mode(),
        Action::ToggleFollow => {
            if let Some(edit) = app.follow_edit(now) {
                fetcher.request(FetchRequest::Edit(edit));
            }
        }
        Action::NewPlaylist => {
            if let Some(edit) = app.create_edit(now) {
                fetcher.request(FetchRequest::Edit(edit));
            }
        }
        Action::RenamePlaylist => app.start_rename(now),
        Action::DeletePlaylist => {
            if let Some(edit) = app.delete_edit(now) {
                fetcher.request(FetchRequest::Edit(edit));
            }
        }
        Action::InputChar(c) => match app.input_mode() {
            InputMode::Rename => app.push_rename_char(c),
            _ => app.push_search_char(c, now),
        },
        Action::InputBackspace => match app.input_mode() {
            InputMode::Rename => app.pop_rename_char(),
            _ => app.pop_search_char(now),
        },
        Action::InputCancel => match app.input_mode() {
            InputMode::Rename => app.cancel_rename(),
            _ => app.cancel_search(),
        },
        Action::InputSubmit => match app.input_mode() {
            InputMode::Rename => {
                if let Some(edit) = app.finish_rename() {
                    fetcher.request(FetchRequest::Edit(edit));
                }
            }
            _ => {
                app.exit_search_mode();
                let query = app.search_query.trim().to_string();
                if !query.is_empty() {
                    app.expect_search(&query);
                    fetcher.request(FetchRequest::Queue(QueueContext::Search(query)));
                }
            }
        },
        Action::Quit => {}
    }
}

/// Fold a finished fetch into the model. Returns a follow-up request when
/// the result makes a list on screen stale.
fn apply_fetch_result(result: FetchResult, app: &mut App, now: Instant) -> Option<FetchRequest> {
    match result {
        FetchResult::Queue {
            result: Ok(queue), ..
        } => {
            let empty = queue.tracks.is_empty();
            let title = queue.title.clone();
            if !app.set_queue(queue) {
                debug!(%title, "dropping superseded search results");
                return None;
            }
            if empty {
                app.notify(format!("{title}: no tracks"), now);
            }
        }
        FetchResult::Queue {
            context,
            result: Err(e),
        } => {
            app.loading = false;
            app.notify_error(format!("Could not load {context}: {e}"), now);
        }
        FetchResult::Browse {
            section,
            result: Ok(entries),
        } => app.set_entries(section, entries),
        FetchResult::Browse {
            section,
            result: Err(e),
        } => {
            app.set_entries(section, Vec::new());
            app.notify_error(e.to_string(), now);
        }
        FetchResult::Account(Ok(account)) => {
            info!(id = %account.id, "signed in");
            app.account = Some(account);
        }
        FetchResult::Account(Err(_)) => app.account = None,
        FetchResult::Edit {
            edit,
            result: Ok(message),
        } => {
            app.notify(message, now);
            if let Some(section) = app.apply_edit(&edit) {
                app.loading = true;
                return Some(FetchRequest::Browse(section));
            }
        }
        FetchResult::Edit { result: Err(e), .. } => app.notify_error(e.to_string(), now),
    }
    None
}

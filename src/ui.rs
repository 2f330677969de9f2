//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Instant};

use crate::app::{App, InputMode, View};
use crate::source::Relation;
use crate::config::{Settings, TimeField, UiSettings};
use crate::playback::NowPlaying;
use crate::track::{TrackId, format_duration, resolve_image};

const FILLED: &str = "━";
const UNFILLED: &str = "─";

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("enter", "open/play");
    map.insert("bksp", "back");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next song");
    // H/L is filled dynamically from config.
    map.insert("tab", "home/library");
    map.insert("s", "sort library");
    map.insert("/", "search");
    map.insert("f", "follow");
    map.insert("n/r/D", "new/rename/delete playlist");
    map.insert("mouse", "drag bar to seek");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "enter", "bksp", "space/p", "h/l", "H/L", "tab", "s", "/", "f", "n/r/D", "mouse",
        "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Progress bar state as seen by the renderer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BarState {
    /// Position control value, 0-100.
    pub value: f64,
    pub dragging: bool,
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(elapsed: f64, total: f64, ui: &UiSettings) -> Option<String> {
    let known = total.is_finite() && total > 0.0;
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_duration(elapsed)),
            TimeField::Total if known => Some(format_duration(total)),
            TimeField::Remaining if known => {
                Some(format!("-{}", format_duration((total - elapsed).max(0.0))))
            }
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// A bar of `width` cells with the leading `ratio` share filled.
fn progress_line(ratio: f64, width: u16) -> Line<'static> {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    let filled = ((ratio * width as f64).round() as usize).min(width as usize);
    let rest = width as usize - filled;
    Line::from(vec![
        Span::styled(FILLED.repeat(filled), Style::default().fg(Color::Green)),
        Span::styled(UNFILLED.repeat(rest), Style::default().fg(Color::DarkGray)),
    ])
}

/// Visible window `[start, end)` of `total` rows that keeps `selected` centred.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize) {
    if total <= height || height == 0 {
        return (0, total);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn list_items(app: &App, current: Option<&TrackId>, start: usize, end: usize) -> Vec<ListItem<'static>> {
    match app.view {
        View::Browse => app.entries[start..end]
            .iter()
            .map(|e| {
                let mut spans = vec![Span::raw(e.name.clone())];
                if let Some(sub) = &e.subtitle {
                    spans.push(Span::styled(format!("  · {sub}"), Style::default().dim()));
                }
                if e.relation == Relation::Followed {
                    spans.push(Span::styled("  ✓", Style::default().fg(Color::Green)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect(),
        View::Tracks => app.tracks()[start..end]
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let active = current == Some(&t.id);
                let marker = if active { "♪ " } else { "  " };
                let mut spans = vec![
                    Span::raw(format!("{marker}{:>2}. ", start + i + 1)),
                    Span::raw(t.display()),
                ];
                if t.duration > 0.0 {
                    spans.push(Span::styled(
                        format!("  {}", format_duration(t.duration)),
                        Style::default().dim(),
                    ));
                }
                if t.audio_url.is_none() {
                    spans.push(Span::styled("  (unavailable)", Style::default().dim()));
                }
                let line = Line::from(spans);
                ListItem::new(if active { line.bold() } else { line })
            })
            .collect(),
    }
}

/// Render the entire UI into `frame`. Returns the area of the progress bar
/// so pointer input can be mapped onto it.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    now_playing: &NowPlaying,
    queue_pos: Option<(usize, usize)>,
    bar: BarState,
    settings: &Settings,
    now: Instant,
) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(5),
            Constraint::Length(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let mut header_block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(" fermata ").centered());
    if let Some(account) = &app.account {
        header_block =
            header_block.title(Line::from(format!(" {} ", account.display_name)).right_aligned());
    }
    let header = Paragraph::new(settings.ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(header_block);
    frame.render_widget(header, chunks[0]);

    // Main list
    {
        let total = app.row_count();
        let height = chunks[1].height.saturating_sub(2) as usize;
        let (start, end) = visible_window(total, height, app.selected);
        let current = now_playing.track.as_ref().map(|t| &t.id);

        let mut title = format!(" {} ", app.title());
        if app.loading {
            title.push_str("(loading…) ");
        }
        let list = List::new(list_items(app, current, start, end))
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if total > 0 {
            state.select(Some(app.selected.saturating_sub(start)));
        }
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    // Now playing
    let block = Block::bordered()
        .padding(Padding {
            left: 1,
            right: 1,
            top: 0,
            bottom: 0,
        })
        .title(match queue_pos {
            Some((index, len)) => format!(" now playing · {}/{} ", index + 1, len),
            None => " now playing ".to_string(),
        });
    let inner = block.inner(chunks[2]);
    frame.render_widget(block, chunks[2]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let (song, art) = match &now_playing.track {
        Some(track) => {
            let state = if now_playing.is_playing { "▶" } else { "⏸" };
            let api = &settings.api;
            let art = resolve_image(
                track.image_url.as_deref(),
                &api.base_url,
                &api.placeholder_image,
                &api.blocked_image_hosts,
            );
            (format!("{state} {}", track.display()), art)
        }
        None => ("Nothing playing".to_string(), String::new()),
    };
    frame.render_widget(Paragraph::new(song).bold(), rows[0]);
    frame.render_widget(Paragraph::new(art).dim(), rows[1]);

    let duration = now_playing.duration;
    let (ratio, elapsed) = if bar.dragging {
        let r = bar.value / 100.0;
        (r, if duration > 0.0 { r * duration } else { 0.0 })
    } else {
        (now_playing.ratio(), now_playing.elapsed)
    };

    let time = now_playing
        .track
        .as_ref()
        .and_then(|_| now_playing_time_text(elapsed, duration, &settings.ui))
        .unwrap_or_default();
    let time_width = (time.chars().count() as u16 + 1).min(rows[2].width);
    let bar_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(time_width)])
        .split(rows[2]);
    let bar_area = bar_row[0];
    frame.render_widget(Paragraph::new(progress_line(ratio, bar_area.width)), bar_area);
    frame.render_widget(
        Paragraph::new(time).alignment(Alignment::Right),
        bar_row[1],
    );

    // Input / notice line
    let status = if let Some(prompt) = &app.rename {
        Line::from(vec![
            Span::raw("rename: ").dim(),
            Span::raw(prompt.text.clone()),
            Span::raw("█"),
        ])
    } else if app.input_mode() == InputMode::Search {
        Line::from(vec![Span::raw("/"), Span::raw(app.search_query.clone()), Span::raw("█")])
    } else if let Some(n) = app.notice(now) {
        let style = if n.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };
        Line::styled(format!(" {}", n.text), style)
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(status), chunks[3]);

    let footer = Paragraph::new(controls_text(settings.controls.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);

    bar_area
}

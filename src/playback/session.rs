//! Queue, index and transport state machine.

use std::sync::mpsc::{self, Receiver};

use tracing::debug;

use crate::track::{Track, TrackId};

use super::control::{PointerEvent, PositionControl};
use super::presentation::Presentation;
use super::transport::{Transport, TransportEvent};

/// State owned by the playback session.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    /// The active queue; replaced wholesale on every new selection.
    pub tracks: Vec<Track>,
    /// Index into `tracks`, `None` when nothing has been loaded.
    pub current_index: Option<usize>,
    /// True while the user holds a drag on the position control.
    pub is_seeking: bool,
    /// Mirror of the transport, updated only from `Play`/`Pause` events.
    pub is_playing: bool,
    /// Track whose media is currently assigned to the transport.
    pub loaded: Option<TrackId>,
}

/// A user request to start playing `tracks[index]` with `tracks` as the queue.
#[derive(Debug, Clone)]
pub struct Selection {
    pub tracks: Vec<Track>,
    pub index: usize,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum SeekSignal {
    Start,
    End(f64),
}

pub struct PlaybackSession<T, P> {
    state: PlaybackState,
    control: PositionControl,
    signals: Receiver<SeekSignal>,
    pub(super) transport: T,
    presenter: P,
    pub(super) elapsed: f64,
}

impl<T: Transport, P: Presentation> PlaybackSession<T, P> {
    pub fn new(transport: T, presenter: P) -> Self {
        let (tx, signals) = mpsc::channel();
        let mut control = PositionControl::new();

        let start_tx = tx.clone();
        control.on_start(move |_| {
            let _ = start_tx.send(SeekSignal::Start);
        });
        control.on_end(move |v| {
            let _ = tx.send(SeekSignal::End(v));
        });

        Self {
            state: PlaybackState::default(),
            control,
            signals,
            transport,
            presenter,
            elapsed: 0.0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn control(&self) -> &PositionControl {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut PositionControl {
        &mut self.control
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state
            .current_index
            .and_then(|i| self.state.tracks.get(i))
    }

    /// Replace the queue and start `tracks[start_index]`.
    ///
    /// Selecting the track that is already loaded toggles play/pause instead
    /// of restarting it.
    pub fn load_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        if tracks.is_empty() {
            return;
        }
        let index = start_index % tracks.len();
        let same = self.state.loaded.as_ref() == Some(&tracks[index].id);

        self.state.tracks = tracks;
        self.state.current_index = Some(index);

        if same {
            debug!(index, "reselected loaded track, toggling");
            self.toggle_play_pause();
            self.refresh();
        } else {
            self.load_current();
        }
    }

    pub fn on_track_selected(&mut self, selection: Selection) {
        self.load_queue(selection.tracks, selection.index);
    }

    /// Move `step` entries through the queue, wrapping in both directions.
    pub fn advance(&mut self, step: i32) {
        let len = self.state.tracks.len();
        if len == 0 {
            return;
        }
        let current = self.state.current_index.map_or(-1, |i| i as i64);
        let next = (current + i64::from(step) + len as i64).rem_euclid(len as i64) as usize;

        self.state.current_index = Some(next);
        self.load_current();
    }

    pub fn toggle_play_pause(&mut self) {
        if self.transport.is_paused() {
            self.transport.play();
        } else {
            self.transport.pause();
        }
    }

    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Play => {
                self.state.is_playing = true;
                self.refresh();
            }
            TransportEvent::Pause => {
                self.state.is_playing = false;
                self.refresh();
            }
            TransportEvent::TimeUpdate {
                current_time,
                duration,
            } => self.on_time_update(current_time, duration),
            TransportEvent::Ended => self.on_ended(),
        }
    }

    pub fn on_time_update(&mut self, current_time: f64, duration: f64) {
        if self.state.is_seeking {
            return;
        }
        let duration = effective_duration(duration, self.current_track());
        self.elapsed = current_time.max(0.0);
        if duration > 0.0 {
            self.control.set_value(self.elapsed / duration * 100.0);
        }
        self.refresh();
    }

    pub fn on_ended(&mut self) {
        self.advance(1);
    }

    /// Forward pointer input to the position control and apply the
    /// resulting drag notifications.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.control.handle(event);
        while let Ok(signal) = self.signals.try_recv() {
            match signal {
                SeekSignal::Start => self.state.is_seeking = true,
                SeekSignal::End(value) => {
                    self.state.is_seeking = false;
                    self.seek_commit(value);
                }
            }
        }
    }

    /// Apply a committed slider value to the playback position.
    pub fn seek_commit(&mut self, percent: f64) {
        if self.transport.source().is_none() {
            debug!("seek without a loaded source ignored");
            return;
        }
        let duration = effective_duration(self.transport.duration(), self.current_track());
        if duration <= 0.0 {
            return;
        }
        let target = percent.clamp(0.0, 100.0) / 100.0 * duration;
        self.transport.set_current_time(target);
        self.elapsed = target;
        self.refresh();
    }

    /// Scrub relative to the current position.
    pub fn seek_by(&mut self, delta_secs: f64) {
        if self.transport.source().is_none() {
            return;
        }
        let duration = effective_duration(self.transport.duration(), self.current_track());
        let mut target = (self.transport.current_time() + delta_secs).max(0.0);
        if duration > 0.0 {
            target = target.min(duration);
        }
        self.transport.set_current_time(target);
    }

    /// Drop the transport source. The queue is kept.
    pub fn stop(&mut self) {
        self.transport.set_source(None);
        self.state.loaded = None;
    }

    fn load_current(&mut self) {
        let Some(track) = self.current_track().cloned() else {
            return;
        };
        debug!(id = %track.id, title = %track.title, "loading track");

        self.state.loaded = track.audio_url.as_ref().map(|_| track.id.clone());
        self.transport.set_source(track.audio_url.clone());
        self.elapsed = 0.0;
        if !self.state.is_seeking {
            self.control.set_value(0.0);
        }
        self.transport.play();
        self.refresh();
    }

    fn refresh(&mut self) {
        let Some(track) = self
            .state
            .current_index
            .and_then(|i| self.state.tracks.get(i))
        else {
            return;
        };
        let duration = effective_duration(self.transport.duration(), Some(track));
        self.presenter
            .render_current_track(track, self.state.is_playing, self.elapsed, duration);
    }
}

/// The transport's duration when it knows one, the track's otherwise.
fn effective_duration(reported: f64, track: Option<&Track>) -> f64 {
    if reported.is_finite() && reported > 0.0 {
        reported
    } else {
        track.map_or(0.0, |t| t.duration)
    }
}

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, info, warn};

use crate::config::AudioSettings;
use crate::playback::TransportEvent;

use super::media::{Fetched, MediaError, create_sink_at, spawn_fetch};
use super::types::{AudioCmd, Generation, OutputHandle, TaggedEvent};

/// Upper bound on how long a finished download waits to be picked up.
const FETCH_POLL: Duration = Duration::from_millis(20);

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    events: Sender<TaggedEvent>,
    info: OutputHandle,
    http: Client,
    settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "no audio output device; playback disabled");
                drain_until_quit(rx);
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);

        let (fetched_tx, fetched_rx) = mpsc::channel::<Fetched>();
        let mut player = Player {
            stream,
            http,
            events,
            info,
            fetched: fetched_tx,
            generation: 0,
            pending: None,
            media: None,
            sink: None,
            duration: None,
            offset: Duration::ZERO,
            ended: false,
        };

        let tick = Duration::from_millis(settings.tick_ms.max(1));
        let wait = tick.min(FETCH_POLL);
        let mut last_tick = Instant::now();

        loop {
            match rx.recv_timeout(wait) {
                Ok(AudioCmd::Load { src, generation }) => player.load(src, generation),
                Ok(AudioCmd::Unload { generation }) => player.unload(generation),
                Ok(AudioCmd::Play) => player.play(),
                Ok(AudioCmd::Pause) => player.pause(),
                Ok(AudioCmd::Seek(pos)) => player.seek(pos),
                Ok(AudioCmd::Quit { fade_out_ms }) => {
                    player.quit(fade_out_ms);
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            while let Ok((generation, result)) = fetched_rx.try_recv() {
                player.fetched(generation, result);
            }

            if last_tick.elapsed() >= tick {
                last_tick = Instant::now();
                player.tick();
            }
        }
    })
}

fn drain_until_quit(rx: Receiver<AudioCmd>) {
    for cmd in rx {
        if matches!(cmd, AudioCmd::Quit { .. }) {
            break;
        }
    }
}

/// A load whose bytes are still downloading, plus the transport requests
/// made in the meantime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PendingLoad {
    pub generation: Generation,
    pub play: bool,
    pub start_at: Duration,
}

impl PendingLoad {
    pub(super) fn new(generation: Generation) -> Self {
        Self {
            generation,
            play: false,
            start_at: Duration::ZERO,
        }
    }

    /// Whether a finished download belongs to this load.
    pub(super) fn accepts(&self, generation: Generation) -> bool {
        self.generation == generation
    }
}

struct Player {
    stream: OutputStream,
    http: Client,
    events: Sender<TaggedEvent>,
    info: OutputHandle,
    fetched: Sender<Fetched>,
    generation: Generation,
    pending: Option<PendingLoad>,
    /// Encoded bytes of the loaded media, kept so the sink can be rebuilt.
    media: Option<Vec<u8>>,
    sink: Option<Sink>,
    duration: Option<Duration>,
    /// Position the current sink started at when it was built with a skip.
    offset: Duration,
    ended: bool,
}

impl Player {
    fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(TaggedEvent {
            generation: self.generation,
            event,
        });
    }

    fn is_running(&self) -> bool {
        match &self.pending {
            Some(p) => p.play,
            None => !self.ended && self.sink.as_ref().is_some_and(|s| !s.is_paused()),
        }
    }

    fn position(&self) -> Duration {
        if let Some(p) = &self.pending {
            return p.start_at;
        }
        self.sink
            .as_ref()
            .map_or(Duration::ZERO, |s| self.offset + s.get_pos())
    }

    fn publish(&self) {
        let paused = !self.is_running();
        let position = self.position();
        if let Ok(mut info) = self.info.lock() {
            info.paused = paused;
            info.position = position;
            info.duration = self.duration;
        }
    }

    fn time_update(&self) {
        self.emit(TransportEvent::TimeUpdate {
            current_time: self.position().as_secs_f64(),
            duration: self.duration.map_or(f64::NAN, |d| d.as_secs_f64()),
        });
    }

    /// Forget the current media and start a new generation.
    fn reset(&mut self, generation: Generation) {
        self.generation = generation;
        let was_running = self.is_running();
        self.pending = None;
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        if was_running {
            self.emit(TransportEvent::Pause);
        }
        self.media = None;
        self.duration = None;
        self.offset = Duration::ZERO;
        self.ended = false;
    }

    fn load(&mut self, src: String, generation: Generation) {
        self.reset(generation);
        info!(%src, generation, "loading media");
        self.pending = Some(PendingLoad::new(generation));
        spawn_fetch(self.http.clone(), src, generation, self.fetched.clone());
        self.publish();
    }

    /// Install a finished download if it is still the one wanted.
    fn fetched(&mut self, generation: Generation, result: Result<Vec<u8>, MediaError>) {
        let Some(pending) = self.pending.filter(|p| p.accepts(generation)) else {
            debug!(generation, current = self.generation, "dropping stale download");
            return;
        };
        self.pending = None;

        let built = result.and_then(|bytes| {
            let (sink, total) = create_sink_at(&self.stream, &bytes, pending.start_at)?;
            Ok((bytes, sink, total))
        });

        match built {
            Ok((bytes, sink, total)) => {
                debug!(bytes = bytes.len(), ?total, "media ready");
                if pending.play {
                    sink.play();
                }
                self.media = Some(bytes);
                self.sink = Some(sink);
                self.duration = total;
                self.offset = pending.start_at;
                self.publish();
                self.time_update();
            }
            Err(e) => {
                warn!(generation, error = %e, "media failed to load");
                if pending.play {
                    self.emit(TransportEvent::Pause);
                }
                self.publish();
            }
        }
    }

    fn unload(&mut self, generation: Generation) {
        self.reset(generation);
        self.publish();
    }

    /// Replace the sink with a fresh one starting at `start_at`.
    fn rebuild_at(&mut self, start_at: Duration, resume: bool) -> bool {
        let Some(bytes) = self.media.as_deref() else {
            return false;
        };
        match create_sink_at(&self.stream, bytes, start_at) {
            Ok((sink, _)) => {
                if let Some(old) = self.sink.take() {
                    old.stop();
                }
                if resume {
                    sink.play();
                }
                self.sink = Some(sink);
                self.offset = start_at;
                self.ended = false;
                true
            }
            Err(e) => {
                warn!(error = %e, "could not rebuild sink");
                false
            }
        }
    }

    fn play(&mut self) {
        if let Some(p) = &mut self.pending {
            // Starts as soon as the download lands.
            if !p.play {
                p.play = true;
                self.emit(TransportEvent::Play);
            }
        } else if self.ended {
            // Replay from the top, like a media element that reached its end.
            if self.rebuild_at(Duration::ZERO, true) {
                self.emit(TransportEvent::Play);
            }
        } else if let Some(s) = &self.sink {
            if s.is_paused() {
                s.play();
                self.emit(TransportEvent::Play);
            }
        }
        self.publish();
    }

    fn pause(&mut self) {
        if self.is_running() {
            if let Some(p) = &mut self.pending {
                p.play = false;
            } else if let Some(s) = &self.sink {
                s.pause();
            }
            self.emit(TransportEvent::Pause);
        }
        self.publish();
    }

    fn seek(&mut self, pos: Duration) {
        if let Some(p) = &mut self.pending {
            p.start_at = pos;
            self.publish();
            return;
        }
        if self.media.is_none() {
            return;
        }
        let pos = self.duration.map_or(pos, |d| pos.min(d));

        let seeked = !self.ended
            && match &self.sink {
                Some(s) => match s.try_seek(pos) {
                    Ok(()) => true,
                    Err(e) => {
                        debug!(error = %e, "seek unsupported; rebuilding sink");
                        false
                    }
                },
                None => false,
            };

        if seeked {
            self.offset = Duration::ZERO;
        } else {
            let resume = self.is_running();
            self.rebuild_at(pos, resume);
        }

        self.publish();
        self.time_update();
    }

    fn tick(&mut self) {
        if self.pending.is_some() || !self.is_running() {
            return;
        }
        if self.sink.as_ref().is_some_and(Sink::empty) {
            self.ended = true;
            self.publish();
            self.emit(TransportEvent::Pause);
            self.emit(TransportEvent::Ended);
            return;
        }
        self.publish();
        self.time_update();
    }

    fn quit(&mut self, fade_out_ms: u64) {
        self.pending = None;
        if let Some(s) = &self.sink {
            if self.is_running() {
                fade_out_sink(s, fade_out_ms);
            }
            s.stop();
        }
        self.sink = None;
        self.publish();
    }
}

fn fade_out_sink(sink: &Sink, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps = fade_steps(fade_out_ms);
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        sink.set_volume(1.0 - step as f32 / steps as f32);
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

/// Volume steps used for a fade of `fade_out_ms`; at least one, at most 20.
pub(super) fn fade_steps(fade_out_ms: u64) -> u64 {
    fade_out_ms.clamp(1, 20)
}

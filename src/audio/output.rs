use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::AudioSettings;
use crate::playback::{Transport, TransportEvent};

use super::media::MediaError;
use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, Generation, OutputHandle, OutputInfo, TaggedEvent};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// `Transport` backed by a `rodio` output on its own thread.
///
/// Commands are fire-and-forget; state changes come back as
/// `TransportEvent`s through `poll_events`.
pub struct AudioOutput {
    tx: Sender<AudioCmd>,
    events: Receiver<TaggedEvent>,
    info: OutputHandle,
    source: Option<String>,
    generation: Generation,
    join: Option<JoinHandle<()>>,
}

impl AudioOutput {
    pub fn spawn(settings: AudioSettings) -> Result<Self, MediaError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(settings.download_timeout_secs.max(1)))
            .user_agent(concat!("fermata/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let (event_tx, event_rx) = mpsc::channel::<TaggedEvent>();
        let info: OutputHandle = Arc::new(Mutex::new(OutputInfo::default()));

        let join = spawn_audio_thread(rx, event_tx, info.clone(), http, settings);

        let mut output = Self::detached(tx, event_rx, info);
        output.join = Some(join);
        Ok(output)
    }

    /// An output with no thread attached; commands go straight to `tx` and
    /// events are read from `events`.
    pub(super) fn detached(
        tx: Sender<AudioCmd>,
        events: Receiver<TaggedEvent>,
        info: OutputHandle,
    ) -> Self {
        Self {
            tx,
            events,
            info,
            source: None,
            generation: 0,
            join: None,
        }
    }

    /// Drain the events produced so far, in order.
    ///
    /// Events still in flight from a source that has since been replaced
    /// are discarded.
    pub fn poll_events(&self) -> Vec<TransportEvent> {
        std::iter::from_fn(|| self.events.try_recv().ok())
            .filter(|tagged| tagged.generation == self.generation)
            .map(|tagged| tagged.event)
            .collect()
    }

    fn send(&self, cmd: AudioCmd) {
        let _ = self.tx.send(cmd);
    }

    fn snapshot(&self) -> OutputInfo {
        self.info
            .lock()
            .map(|info| info.clone())
            .unwrap_or_default()
    }

    pub fn quit_softly(&mut self, fade_out: Duration) {
        self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

impl Transport for AudioOutput {
    fn play(&mut self) {
        self.send(AudioCmd::Play);
    }

    fn pause(&mut self) {
        self.send(AudioCmd::Pause);
    }

    fn is_paused(&self) -> bool {
        self.snapshot().paused
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn set_source(&mut self, src: Option<String>) {
        // Forget the old media's clock right away; the thread catches up.
        if let Ok(mut info) = self.info.lock() {
            *info = OutputInfo::default();
        }
        self.generation += 1;
        let generation = self.generation;
        match &src {
            Some(url) => self.send(AudioCmd::Load {
                src: url.clone(),
                generation,
            }),
            None => self.send(AudioCmd::Unload { generation }),
        }
        self.source = src;
    }

    fn current_time(&self) -> f64 {
        self.snapshot().position.as_secs_f64()
    }

    fn set_current_time(&mut self, secs: f64) {
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        let pos = Duration::from_secs_f64(secs);
        if let Ok(mut info) = self.info.lock() {
            info.position = pos;
        }
        self.send(AudioCmd::Seek(pos));
    }

    fn duration(&self) -> f64 {
        self.snapshot()
            .duration
            .map_or(f64::NAN, |d| d.as_secs_f64())
    }
}

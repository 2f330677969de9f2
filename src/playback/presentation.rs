use crate::track::Track;

/// Receiver of "now playing" updates.
pub trait Presentation {
    fn render_current_track(&mut self, track: &Track, is_playing: bool, elapsed: f64, duration: f64);
}

/// Now-playing view model painted by the terminal UI.
#[derive(Debug, Clone, Default)]
pub struct NowPlaying {
    pub track: Option<Track>,
    pub is_playing: bool,
    pub elapsed: f64,
    pub duration: f64,
}

impl NowPlaying {
    /// Playback progress in `[0, 1]`, or 0 when the length is unknown.
    pub fn ratio(&self) -> f64 {
        if self.duration > 0.0 && self.duration.is_finite() {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Presentation for NowPlaying {
    fn render_current_track(&mut self, track: &Track, is_playing: bool, elapsed: f64, duration: f64) {
        if self.track.as_ref() != Some(track) {
            self.track = Some(track.clone());
        }
        self.is_playing = is_playing;
        self.elapsed = elapsed;
        self.duration = duration;
    }
}

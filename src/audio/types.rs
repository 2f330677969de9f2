//! Commands and shared state for the audio thread.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::playback::TransportEvent;

/// Counter bumped on every source change. Events and finished downloads
/// carry the generation they belong to so older ones can be dropped.
pub type Generation = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCmd {
    /// Fetch and decode the media at this URL (or local path), paused at 0.
    Load { src: String, generation: Generation },
    /// Drop the current media.
    Unload { generation: Generation },
    /// Resume playback of the loaded media.
    Play,
    /// Pause playback.
    Pause,
    /// Jump to an absolute position.
    Seek(Duration),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// A `TransportEvent` stamped with the source generation that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaggedEvent {
    pub generation: Generation,
    pub event: TransportEvent,
}

/// Output state readable without a round trip to the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputInfo {
    pub paused: bool,
    pub position: Duration,
    /// `None` until the decoder reports a length.
    pub duration: Option<Duration>,
}

impl Default for OutputInfo {
    fn default() -> Self {
        Self {
            paused: true,
            position: Duration::ZERO,
            duration: None,
        }
    }
}

pub type OutputHandle = Arc<Mutex<OutputInfo>>;

//! Playback core: the seek slider and the queue/transport state machine.
//!
//! Everything in here runs on the UI thread. The audio output and the
//! renderer are reached only through the `Transport` and `Presentation`
//! traits so the state machine can be driven by fakes in tests.

mod control;
mod presentation;
mod session;
mod transport;

pub use control::{PointerEvent, PositionControl};
pub use presentation::{NowPlaying, Presentation};
pub use session::{PlaybackSession, PlaybackState, Selection};
pub use transport::{Transport, TransportEvent};

#[cfg(test)]
mod tests;

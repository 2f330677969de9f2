//! Audio output.
//!
//! A dedicated thread owns the `rodio` stream and the current sink. The UI
//! side talks to it through `AudioOutput`, which implements the playback
//! `Transport` trait.

mod media;
mod output;
mod thread;
mod types;

pub use media::MediaError;
pub use output::AudioOutput;

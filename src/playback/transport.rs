/// Events emitted by an audio output, delivered in production order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportEvent {
    /// Output started or resumed.
    Play,
    /// Output paused.
    Pause,
    /// Periodic position report while playing. `duration` may be NaN when
    /// the decoder cannot tell the total length.
    TimeUpdate { current_time: f64, duration: f64 },
    /// The loaded media played to the end.
    Ended,
}

/// Primitives of the underlying audio output.
///
/// Commands are fire-and-forget: state changes are reported back through
/// `TransportEvent`s rather than being assumed by the caller.
pub trait Transport {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;

    /// Media reference currently assigned, if any.
    fn source(&self) -> Option<&str>;
    /// Assign (or clear) the media reference. Any previous playback is abandoned.
    fn set_source(&mut self, source: Option<String>);

    /// Playback position in seconds.
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, secs: f64);
    /// Total length in seconds; NaN when unknown.
    fn duration(&self) -> f64;
}

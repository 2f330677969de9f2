use super::*;
use crate::track::Track;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Play,
    Pause,
    SetSource(Option<String>),
    SetTime(f64),
}

#[derive(Default)]
struct FakeTransport {
    calls: Vec<Call>,
    paused: bool,
    source: Option<String>,
    time: f64,
    duration: f64,
}

impl FakeTransport {
    fn new() -> Self {
        Self {
            paused: true,
            duration: f64::NAN,
            ..Self::default()
        }
    }
}

impl Transport for FakeTransport {
    fn play(&mut self) {
        self.calls.push(Call::Play);
        if self.source.is_some() {
            self.paused = false;
        }
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn set_source(&mut self, source: Option<String>) {
        self.calls.push(Call::SetSource(source.clone()));
        self.source = source;
        self.time = 0.0;
        self.paused = true;
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, secs: f64) {
        self.calls.push(Call::SetTime(secs));
        self.time = secs;
    }

    fn duration(&self) -> f64 {
        self.duration
    }
}

fn track(id: &str) -> Track {
    Track::new(id, format!("Track {id}"))
        .with_audio(format!("https://cdn.test/{id}.mp3"))
        .with_duration(200.0)
}

fn queue3() -> Vec<Track> {
    vec![track("1"), track("2"), track("3")]
}

fn session() -> PlaybackSession<FakeTransport, NowPlaying> {
    PlaybackSession::new(FakeTransport::new(), NowPlaying::default())
}

fn calls(s: &PlaybackSession<FakeTransport, NowPlaying>) -> &[Call] {
    &s.transport.calls
}

#[test]
fn load_queue_assigns_source_and_plays() {
    let mut s = session();
    s.load_queue(queue3(), 1);

    assert_eq!(s.state().current_index, Some(1));
    assert_eq!(s.state().loaded.as_ref().map(|id| id.as_str()), Some("2"));
    assert_eq!(
        calls(&s),
        &[
            Call::SetSource(Some("https://cdn.test/2.mp3".into())),
            Call::Play
        ]
    );
    assert_eq!(
        s.presenter().track.as_ref().map(|t| t.id.as_str()),
        Some("2")
    );
}

#[test]
fn load_queue_on_empty_list_is_a_noop() {
    let mut s = session();
    s.load_queue(Vec::new(), 0);
    assert_eq!(s.state().current_index, None);
    assert!(calls(&s).is_empty());
}

#[test]
fn load_queue_wraps_out_of_range_start() {
    let mut s = session();
    s.load_queue(queue3(), 4);
    assert_eq!(s.state().current_index, Some(1));
}

#[test]
fn advance_wraps_both_directions() {
    let mut s = session();
    s.load_queue(queue3(), 0);

    s.advance(-1);
    assert_eq!(s.state().current_index, Some(2));

    s.advance(1);
    s.advance(1);
    assert_eq!(s.state().current_index, Some(1));
}

#[test]
fn advance_n_times_returns_to_start() {
    for n in 1..=5usize {
        let tracks: Vec<Track> = (0..n).map(|i| track(&i.to_string())).collect();
        for step in [1, -1] {
            for start in 0..n {
                let mut s = session();
                s.load_queue(tracks.clone(), start);
                for _ in 0..n {
                    s.advance(step);
                }
                assert_eq!(s.state().current_index, Some(start), "n={n} step={step}");
            }
        }
    }
}

#[test]
fn advance_on_empty_queue_touches_nothing() {
    let mut s = session();
    s.advance(1);
    s.advance(-1);
    assert_eq!(s.state().current_index, None);
    assert!(calls(&s).is_empty());
}

#[test]
fn advance_reloads_single_track_queue() {
    let mut s = session();
    s.load_queue(vec![track("1")], 0);
    s.transport.calls.clear();

    s.advance(1);
    assert_eq!(s.state().current_index, Some(0));
    assert_eq!(
        calls(&s),
        &[
            Call::SetSource(Some("https://cdn.test/1.mp3".into())),
            Call::Play
        ]
    );
}

#[test]
fn reselecting_playing_track_pauses_without_reload() {
    let mut s = session();
    s.load_queue(queue3(), 0);
    s.handle_event(TransportEvent::Play);
    s.transport.time = 42.0;
    s.transport.calls.clear();

    s.on_track_selected(Selection {
        tracks: queue3(),
        index: 0,
    });

    assert_eq!(calls(&s), &[Call::Pause]);
    assert_eq!(s.state().current_index, Some(0));
    assert_eq!(s.transport.current_time(), 42.0);

    // Transport confirms the pause asynchronously.
    assert!(s.state().is_playing);
    s.handle_event(TransportEvent::Pause);
    assert!(!s.state().is_playing);
    assert!(!s.presenter().is_playing);
}

#[test]
fn reselecting_paused_track_resumes_it() {
    let mut s = session();
    s.load_queue(queue3(), 1);
    s.handle_event(TransportEvent::Play);
    s.toggle_play_pause();
    s.handle_event(TransportEvent::Pause);
    s.transport.time = 30.0;
    s.transport.calls.clear();

    s.on_track_selected(Selection {
        tracks: queue3(),
        index: 1,
    });

    assert_eq!(calls(&s), &[Call::Play]);
    assert_eq!(s.transport.current_time(), 30.0);
    s.handle_event(TransportEvent::Play);
    assert!(s.state().is_playing);
    assert!(s.presenter().is_playing);
}

#[test]
fn reselecting_from_another_list_adopts_that_list() {
    let mut s = session();
    s.load_queue(queue3(), 0);
    s.handle_event(TransportEvent::Play);

    s.on_track_selected(Selection {
        tracks: vec![track("1"), track("9")],
        index: 0,
    });
    assert_eq!(s.state().tracks.len(), 2);
    assert_eq!(s.state().current_index, Some(0));

    s.advance(1);
    assert_eq!(s.transport.source(), Some("https://cdn.test/9.mp3"));
    s.advance(1);
    assert_eq!(s.transport.source(), Some("https://cdn.test/1.mp3"));
}

#[test]
fn track_change_mid_drag_keeps_the_drag_and_commits_to_new_track() {
    let mut s = session();
    s.load_queue(queue3(), 0);
    s.control_mut().set_bounds(0.0, 100.0);

    s.handle_pointer(PointerEvent::press(80.0));
    s.advance(1);
    assert!(s.state().is_seeking);
    assert_eq!(s.control().value(), 80.0);
    assert_eq!(s.transport.source(), Some("https://cdn.test/2.mp3"));

    s.transport.calls.clear();
    s.handle_pointer(PointerEvent::release(80.0));
    assert_eq!(calls(&s), &[Call::SetTime(160.0)]);
    assert!(!s.state().is_seeking);
}

#[test]
fn same_track_is_matched_by_id_not_url() {
    let mut s = session();
    let a = track("a").with_audio("https://cdn.test/shared.mp3");
    let b = track("b").with_audio("https://cdn.test/shared.mp3");
    s.load_queue(vec![a, b.clone()], 0);
    s.transport.calls.clear();

    s.load_queue(vec![b], 0);
    assert_eq!(
        calls(&s),
        &[
            Call::SetSource(Some("https://cdn.test/shared.mp3".into())),
            Call::Play
        ]
    );
}

#[test]
fn missing_audio_url_leaves_source_unset() {
    let mut s = session();
    s.load_queue(vec![Track::new("x", "No media")], 0);

    assert_eq!(s.transport.source(), None);
    assert_eq!(s.state().loaded, None);
    assert!(s.transport.is_paused());
}

#[test]
fn is_playing_follows_events_only() {
    let mut s = session();
    s.load_queue(queue3(), 0);
    assert!(!s.state().is_playing);

    s.handle_event(TransportEvent::Play);
    assert!(s.state().is_playing);

    s.toggle_play_pause();
    assert!(s.state().is_playing);
    s.handle_event(TransportEvent::Pause);
    assert!(!s.state().is_playing);
}

#[test]
fn time_update_moves_control_and_elapsed() {
    let mut s = session();
    s.load_queue(queue3(), 0);

    s.handle_event(TransportEvent::TimeUpdate {
        current_time: 50.0,
        duration: 100.0,
    });
    assert_eq!(s.control().value(), 50.0);
    assert_eq!(s.presenter().elapsed, 50.0);
    assert_eq!(s.presenter().duration, 200.0);
}

#[test]
fn time_update_falls_back_to_track_duration() {
    let mut s = session();
    s.load_queue(queue3(), 0);

    s.on_time_update(50.0, f64::NAN);
    assert_eq!(s.control().value(), 25.0);
}

#[test]
fn time_update_is_suppressed_while_seeking() {
    let mut s = session();
    s.load_queue(queue3(), 0);
    s.control_mut().set_bounds(0.0, 100.0);

    s.handle_pointer(PointerEvent::press(80.0));
    assert!(s.state().is_seeking);

    s.on_time_update(20.0, 200.0);
    assert_eq!(s.control().value(), 80.0);
    assert_eq!(s.elapsed, 0.0);

    s.handle_pointer(PointerEvent::release(80.0));
    assert!(!s.state().is_seeking);

    s.on_time_update(20.0, 200.0);
    assert_eq!(s.control().value(), 10.0);
}

#[test]
fn drag_release_commits_seek() {
    let mut s = session();
    s.load_queue(queue3(), 0);
    s.control_mut().set_bounds(10.0, 100.0);
    s.transport.calls.clear();

    s.handle_pointer(PointerEvent::press(20.0));
    s.handle_pointer(PointerEvent::moved(60.0));
    assert!(calls(&s).is_empty());

    s.handle_pointer(PointerEvent::release(60.0));
    assert_eq!(calls(&s), &[Call::SetTime(100.0)]);
}

#[test]
fn seek_commit_without_source_is_ignored() {
    let mut s = session();
    s.seek_commit(50.0);
    assert!(calls(&s).is_empty());

    s.load_queue(vec![Track::new("x", "No media").with_duration(10.0)], 0);
    s.transport.calls.clear();
    s.seek_commit(50.0);
    assert!(calls(&s).is_empty());
}

#[test]
fn seek_commit_prefers_transport_duration() {
    let mut s = session();
    s.load_queue(queue3(), 0);
    s.transport.duration = 120.0;
    s.transport.calls.clear();

    s.seek_commit(25.0);
    assert_eq!(calls(&s), &[Call::SetTime(30.0)]);
}

#[test]
fn ended_advances_to_next_track() {
    let mut s = session();
    s.load_queue(queue3(), 2);
    s.handle_event(TransportEvent::Ended);
    assert_eq!(s.state().current_index, Some(0));
    assert_eq!(s.transport.source(), Some("https://cdn.test/1.mp3"));
}

#[test]
fn seek_by_clamps_to_track_bounds() {
    let mut s = session();
    s.load_queue(queue3(), 0);
    s.transport.time = 3.0;

    s.seek_by(-10.0);
    assert_eq!(s.transport.current_time(), 0.0);

    s.seek_by(500.0);
    assert_eq!(s.transport.current_time(), 200.0);
}

#[test]
fn stop_clears_source_but_keeps_queue() {
    let mut s = session();
    s.load_queue(queue3(), 1);
    s.stop();
    assert_eq!(s.transport.source(), None);
    assert_eq!(s.state().loaded, None);
    assert_eq!(s.state().tracks.len(), 3);
    assert_eq!(s.state().current_index, Some(1));
}

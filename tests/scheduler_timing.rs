// Integration test: real-time playback scheduler
//
// Runs the threaded scheduler against wall-clock time and checks that note
// onsets fire close to where the tempo puts them.

use lyric_roll::audio::TonePlayer;
use lyric_roll::messaging::channels::drain_events;
use lyric_roll::synth::{SynthError, ToneRequest};
use lyric_roll::{
    EditorConfig, EventSink, NoteTimeline, PlaybackEvent, PlaybackScheduler, SharedTempo, Tempo,
    create_event_channel,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Records when each tone request arrives
struct RecordingPlayer {
    origin: Instant,
    calls: Mutex<Vec<(Duration, ToneRequest)>>,
}

impl RecordingPlayer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            calls: Mutex::new(Vec::new()),
        })
    }
}

impl TonePlayer for RecordingPlayer {
    fn play(&self, request: ToneRequest) -> Result<(), SynthError> {
        self.calls
            .lock()
            .unwrap()
            .push((self.origin.elapsed(), request));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Player that always fails, like a missing audio backend
struct BrokenPlayer;

impl TonePlayer for BrokenPlayer {
    fn play(&self, _request: ToneRequest) -> Result<(), SynthError> {
        Err(SynthError::BackendUnavailable("test".to_string()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

/// Three notes at beats 0, 4, 8 and 120 BPM fire at roughly 0s, 2s and 4s
#[test]
fn test_onsets_follow_wall_clock() {
    let timeline = Arc::new(NoteTimeline::new());
    for beat in [0, 4, 8] {
        timeline.add(11, beat, 1).unwrap();
    }

    let player = RecordingPlayer::new();
    let (tx, mut rx) = create_event_channel(4096);
    let scheduler = PlaybackScheduler::new(
        Arc::clone(&timeline),
        SharedTempo::new(Tempo::new(120.0).unwrap()),
        player.clone(),
        EventSink::new(tx),
        EditorConfig::default(),
    );

    let started = Instant::now();
    scheduler.start();
    thread::sleep(Duration::from_millis(4300));
    scheduler.stop(false);

    // Tone threads may still be starting
    thread::sleep(Duration::from_millis(100));

    let triggered = drain_events(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, PlaybackEvent::Triggered { .. }))
        .count();
    assert_eq!(triggered, 3);

    let mut calls = player.calls.lock().unwrap().clone();
    calls.sort_by_key(|(at, _)| *at);
    assert_eq!(calls.len(), 3);

    let offset = started.duration_since(player.origin).as_secs_f64();
    for ((at, request), expected) in calls.iter().zip([0.0, 2.0, 4.0]) {
        let seconds = at.as_secs_f64() - offset;
        assert!(
            (seconds - expected).abs() < 0.15,
            "onset at {seconds:.3}s, expected {expected}s"
        );
        // One beat at 120 BPM
        assert!((request.duration_ms - 500.0).abs() < 1e-9);
    }
}

/// stop() returns within about one tick and the position stops moving
#[test]
fn test_stop_halts_tick_loop() {
    let scheduler = PlaybackScheduler::new(
        Arc::new(NoteTimeline::new()),
        SharedTempo::new(Tempo::new(120.0).unwrap()),
        RecordingPlayer::new(),
        EventSink::disconnected(),
        EditorConfig::default(),
    );

    scheduler.start();
    thread::sleep(Duration::from_millis(200));

    let before_stop = Instant::now();
    scheduler.stop(false);
    assert!(before_stop.elapsed() < Duration::from_millis(100));
    assert!(!scheduler.is_running());

    let position = scheduler.position();
    assert!(position > 0.0);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(scheduler.position(), position);
}

/// Playback reaches the end of the scene and stops by itself
#[test]
fn test_auto_stop_at_scene_end() {
    let config = EditorConfig {
        scene_length_beats: 2.0,
        ..EditorConfig::default()
    };
    let (tx, mut rx) = create_event_channel(4096);
    let scheduler = PlaybackScheduler::new(
        Arc::new(NoteTimeline::new()),
        SharedTempo::new(Tempo::new(600.0).unwrap()),
        RecordingPlayer::new(),
        EventSink::new(tx),
        config,
    );

    scheduler.start();
    thread::sleep(Duration::from_millis(500));

    assert!(!scheduler.is_running());
    assert!(scheduler.position() > 2.0);
    let events = drain_events(&mut rx);
    assert!(events.iter().any(|e| matches!(e, PlaybackEvent::Finished { .. })));

    // Restarting after an auto-stop works and stops again
    scheduler.seek(0.0);
    scheduler.start();
    thread::sleep(Duration::from_millis(500));
    assert!(!scheduler.is_running());
}

/// A failing audio backend never stops the scheduler
#[test]
fn test_backend_failure_is_not_fatal() {
    let timeline = Arc::new(NoteTimeline::new());
    timeline.add(0, 0, 1).unwrap();
    timeline.add(0, 1, 1).unwrap();

    let (tx, mut rx) = create_event_channel(4096);
    let scheduler = PlaybackScheduler::new(
        Arc::clone(&timeline),
        SharedTempo::new(Tempo::new(600.0).unwrap()),
        Arc::new(BrokenPlayer),
        EventSink::new(tx),
        EditorConfig::default(),
    );

    scheduler.start();
    thread::sleep(Duration::from_millis(300));
    assert!(scheduler.is_running());
    scheduler.stop(true);

    let fired = drain_events(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, PlaybackEvent::Triggered { .. }))
        .count();
    assert_eq!(fired, 2);
    assert_eq!(scheduler.position(), 0.0);
}

/// stop() and start() racing from two threads never leave stop() waiting for
/// the rest of the scene, and never leave a second tick thread behind
#[test]
fn test_concurrent_stop_and_start() {
    let config = EditorConfig {
        scene_length_beats: 4.0,
        ..EditorConfig::default()
    };
    let scheduler = Arc::new(PlaybackScheduler::new(
        Arc::new(NoteTimeline::new()),
        SharedTempo::new(Tempo::new(60.0).unwrap()),
        RecordingPlayer::new(),
        EventSink::disconnected(),
        config,
    ));

    for _ in 0..5 {
        scheduler.seek(0.0);
        scheduler.start();
        thread::sleep(Duration::from_millis(50));

        let stopper = {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || {
                let began = Instant::now();
                scheduler.stop(false);
                began.elapsed()
            })
        };
        let starter = {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(2));
                scheduler.start();
            })
        };

        let stop_took = stopper.join().unwrap();
        starter.join().unwrap();
        assert!(
            stop_took < Duration::from_millis(500),
            "stop() took {stop_took:?}"
        );

        // Whatever the interleaving, one more stop halts everything
        let began = Instant::now();
        scheduler.stop(false);
        assert!(began.elapsed() < Duration::from_millis(500));
        assert!(!scheduler.is_running());

        let position = scheduler.position();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(scheduler.position(), position);
    }
}

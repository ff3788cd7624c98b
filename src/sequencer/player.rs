// Sequencer Player - Sweeps the timeline and fires tones for crossed onsets
//
// A background thread ticks the transport every `tick_interval`. Each tick
// moves the playhead by elapsed time times tempo and sounds every note whose
// start beat falls inside the swept window. Tones play on their own threads
// and outlive the run that fired them.

use crate::audio::output::TonePlayer;
use crate::config::{ConfigError, EditorConfig};
use crate::messaging::channels::EventSink;
use crate::messaging::event::PlaybackEvent;
use crate::sequencer::note::{NoteId, PitchTable};
use crate::sequencer::tempo::{SharedTempo, Tempo};
use crate::sequencer::timeline::NoteTimeline;
use crate::sequencer::transport::PlaybackState;
use crate::synth::tone::ToneRequest;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// How the clock is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// A background thread calls `tick_at` every tick interval
    Threaded,
    /// The host calls `tick_at` itself
    Manual,
}

/// A note fired by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggeredNote {
    pub id: NoteId,
    pub pitch_index: usize,
    pub request: ToneRequest,
}

struct SchedulerShared {
    state: Mutex<PlaybackState>,
    timeline: Arc<NoteTimeline>,
    tempo: SharedTempo,
    player: Arc<dyn TonePlayer>,
    events: EventSink,
    config: EditorConfig,
}

impl SchedulerShared {
    fn lock_state(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn tick(&self, now: Instant) -> (Vec<TriggeredNote>, bool) {
        let tempo = self.tempo.get();
        let scene_length = self.config.scene_length_beats;

        let (triggered, position, finished, running) = {
            let mut state = self.lock_state();
            let Some((window, new_position)) = state.advance(now, tempo) else {
                return (Vec::new(), false);
            };

            let mut triggered = Vec::new();
            for note in self.timeline.snapshot() {
                if !window.contains(note.start_beat as f64) || state.was_triggered(note.id) {
                    continue;
                }
                let Some(frequency) = PitchTable::frequency(note.pitch_index) else {
                    continue;
                };
                state.mark_triggered(note.id);
                triggered.push(TriggeredNote {
                    id: note.id,
                    pitch_index: note.pitch_index,
                    request: ToneRequest::new(
                        frequency,
                        tempo.beats_to_millis(note.duration_beats as f64),
                    ),
                });
            }

            let finished = state.commit(new_position, scene_length);
            (triggered, state.position(), finished, state.is_running())
        };

        for note in &triggered {
            self.fire(note.request);
            self.events.publish(PlaybackEvent::Triggered {
                id: note.id,
                pitch_index: note.pitch_index,
            });
        }

        if finished {
            log::info!("Playback reached end of scene at beat {position:.2}");
            self.events.publish(PlaybackEvent::Finished { beat: position });
        }
        self.events.publish(PlaybackEvent::Position {
            beat: position,
            pixel: self.config.grid.beat_to_pixel(position),
        });

        (triggered, running)
    }

    fn fire(&self, request: ToneRequest) {
        let player = Arc::clone(&self.player);
        let spawned = thread::Builder::new()
            .name("tone".to_string())
            .spawn(move || {
                if let Err(e) = player.play(request) {
                    log::warn!("Tone playback failed on {}: {e}", player.name());
                }
            });
        if let Err(e) = spawned {
            log::warn!("Could not spawn tone thread: {e}");
        }
    }
}

/// Tempo-synchronized playback scheduler
///
/// All methods take `&self`, so the scheduler can be shared behind an `Arc`
/// between the editing layer and anything else that needs transport control.
pub struct PlaybackScheduler {
    shared: Arc<SchedulerShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    mode: ClockMode,
}

impl PlaybackScheduler {
    /// Create a scheduler driven by its own background thread
    pub fn new(
        timeline: Arc<NoteTimeline>,
        tempo: SharedTempo,
        player: Arc<dyn TonePlayer>,
        events: EventSink,
        config: EditorConfig,
    ) -> Self {
        Self::with_mode(timeline, tempo, player, events, config, ClockMode::Threaded)
    }

    pub fn with_mode(
        timeline: Arc<NoteTimeline>,
        tempo: SharedTempo,
        player: Arc<dyn TonePlayer>,
        events: EventSink,
        config: EditorConfig,
        mode: ClockMode,
    ) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                state: Mutex::new(PlaybackState::new(Instant::now())),
                timeline,
                tempo,
                player,
                events,
                config,
            }),
            worker: Mutex::new(None),
            mode,
        }
    }

    /// Lock the worker slot
    ///
    /// Held across every run-state transition (start, stop, seek, drop) so a
    /// transition never overlaps another one or a worker that is still exiting.
    fn lock_worker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.worker.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn join(handle: Option<JoinHandle<()>>) {
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("Scheduler thread panicked");
            }
        }
    }

    /// Stop the clock and wait for the tick thread; returns the position
    fn halt(&self, worker: &mut Option<JoinHandle<()>>, reset: bool) -> f64 {
        let position = {
            let mut state = self.shared.lock_state();
            state.stop(reset);
            state.position()
        };
        Self::join(worker.take());
        position
    }

    /// Start playback from the current position
    pub fn start(&self) {
        self.start_at(Instant::now());
    }

    /// Start playback with an explicit clock origin
    pub fn start_at(&self, now: Instant) {
        let mut worker = self.lock_worker();
        if self.shared.lock_state().is_running() {
            return;
        }

        // A run that auto-stopped may still be between its last tick and exit
        Self::join(worker.take());

        let position = {
            let mut state = self.shared.lock_state();
            if !state.start(now) {
                return;
            }
            state.position()
        };

        log::info!("Playback started at beat {position:.2}");
        self.shared
            .events
            .publish(PlaybackEvent::Started { beat: position });

        if self.mode == ClockMode::Threaded {
            *worker = self.spawn_worker();
        }
    }

    fn spawn_worker(&self) -> Option<JoinHandle<()>> {
        let shared = Arc::clone(&self.shared);
        let interval = shared.config.tick_interval();
        let spawned = thread::Builder::new()
            .name("scheduler".to_string())
            .spawn(move || {
                loop {
                    thread::sleep(interval);
                    let (_, running) = shared.tick(Instant::now());
                    if !running {
                        break;
                    }
                }
                log::debug!("Scheduler thread exiting");
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Could not spawn scheduler thread: {e}");
                self.shared.lock_state().stop(false);
                None
            }
        }
    }

    /// Stop playback; `reset` also rewinds to beat 0
    ///
    /// Returns once the tick thread has exited (at most one tick interval).
    pub fn stop(&self, reset: bool) {
        let mut worker = self.lock_worker();
        let position = self.halt(&mut worker, reset);

        log::info!("Playback stopped at beat {position:.2} (reset: {reset})");
        self.shared.events.publish(PlaybackEvent::Stopped {
            beat: position,
            reset,
        });
    }

    /// Stop and move the playhead
    pub fn seek(&self, new_position: f64) {
        let mut worker = self.lock_worker();
        let stopped_at = self.halt(&mut worker, false);
        self.shared.events.publish(PlaybackEvent::Stopped {
            beat: stopped_at,
            reset: false,
        });

        let position = {
            let mut state = self.shared.lock_state();
            state.seek(new_position, self.shared.config.scene_length_beats);
            state.position()
        };
        log::debug!("Seek to beat {position:.2}");
        self.shared.events.publish(PlaybackEvent::Position {
            beat: position,
            pixel: self.shared.config.grid.beat_to_pixel(position),
        });
    }

    /// Run one tick as of `now` and return the notes it fired
    pub fn tick_at(&self, now: Instant) -> Vec<TriggeredNote> {
        self.shared.tick(now).0
    }

    /// Current playhead in beats
    pub fn position(&self) -> f64 {
        self.shared.lock_state().position()
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock_state().is_running()
    }

    /// Current tempo
    pub fn tempo(&self) -> Tempo {
        self.shared.tempo.get()
    }

    /// Change the tempo; applies from the next tick
    pub fn set_tempo(&self, bpm: f64) -> Result<Tempo, ConfigError> {
        self.shared.tempo.set_bpm(bpm)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.shared.config
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        let mut worker = self.lock_worker();
        self.halt(&mut worker, false);
    }
}

impl std::fmt::Debug for PlaybackScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackScheduler")
            .field("mode", &self.mode)
            .field("position", &self.position())
            .field("running", &self.is_running())
            .finish()
    }
}

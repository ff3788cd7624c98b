// Transport - Playback clock state
// Tracks the playhead, the running flag and which notes already sounded

use crate::sequencer::note::NoteId;
use crate::sequencer::tempo::Tempo;
use std::collections::HashSet;
use std::time::Instant;

/// Transport state (running/stopped)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Running,
}

impl TransportState {
    pub fn is_running(&self) -> bool {
        matches!(self, TransportState::Running)
    }
}

/// Beat range swept by one tick, lower bound inclusive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepWindow {
    pub lower: f64,
    pub upper: f64,
}

impl SweepWindow {
    pub fn contains(&self, beat: f64) -> bool {
        beat >= self.lower && beat < self.upper
    }
}

/// Playback clock
///
/// `position` is in beats and only moves forward while running; `seek` and
/// `stop(true)` are the only ways to move it back.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    position: f64,
    state: TransportState,
    triggered: HashSet<NoteId>,
    last_tick: Instant,
}

impl PlaybackState {
    pub fn new(now: Instant) -> Self {
        Self {
            position: 0.0,
            state: TransportState::Stopped,
            triggered: HashSet::new(),
            last_tick: now,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Start a run from the current position
    ///
    /// Returns false if already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = TransportState::Running;
        self.last_tick = now;
        self.triggered.clear();
        true
    }

    /// Stop, optionally rewinding to the start
    pub fn stop(&mut self, reset: bool) {
        self.state = TransportState::Stopped;
        if reset {
            self.position = 0.0;
            self.triggered.clear();
        }
    }

    /// Stop and move the playhead, clamped to [0, scene_length]
    pub fn seek(&mut self, new_position: f64, scene_length: f64) {
        self.stop(false);
        let target = if new_position.is_finite() {
            new_position.clamp(0.0, scene_length)
        } else {
            0.0
        };
        if target < self.position {
            self.triggered.clear();
        }
        self.position = target;
    }

    /// Advance the clock to `now` and return the swept window
    ///
    /// Returns None when stopped. The position is left unchanged until
    /// `commit` so the caller can sweep the window first.
    pub fn advance(&mut self, now: Instant, tempo: Tempo) -> Option<(SweepWindow, f64)> {
        if !self.is_running() {
            return None;
        }
        let dt = now.saturating_duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;

        let new_position = self.position + dt * tempo.beats_per_second();
        let window = SweepWindow {
            lower: self.position.min(new_position),
            upper: self.position.max(new_position),
        };
        Some((window, new_position))
    }

    /// Record that a note sounded during this run
    ///
    /// Returns false if it already had.
    pub fn mark_triggered(&mut self, id: NoteId) -> bool {
        self.triggered.insert(id)
    }

    pub fn was_triggered(&self, id: NoteId) -> bool {
        self.triggered.contains(&id)
    }

    /// Move the playhead after a sweep; stops when past the scene end
    ///
    /// Returns true if this call caused the auto-stop.
    pub fn commit(&mut self, new_position: f64, scene_length: f64) -> bool {
        self.position = new_position;
        if self.position > scene_length {
            self.stop(false);
            return true;
        }
        false
    }
}

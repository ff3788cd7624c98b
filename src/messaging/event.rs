// Playback events - Scheduler → editing layer

use crate::sequencer::note::NoteId;

/// Event published by the playback scheduler
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// Playback started from the given beat
    Started { beat: f64 },
    /// Playhead moved
    Position { beat: f64, pixel: f64 },
    /// A note onset was crossed and its tone fired
    Triggered { id: NoteId, pitch_index: usize },
    /// Playback stopped by request
    Stopped { beat: f64, reset: bool },
    /// Playhead passed the end of the scene
    Finished { beat: f64 },
}

impl PlaybackEvent {
    /// Check if this event ends a playback run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlaybackEvent::Stopped { .. } | PlaybackEvent::Finished { .. }
        )
    }
}

// Timeline - Authoritative store of the piano roll notes
// Notes are addressed by stable id; consumers only ever see sorted copies

use crate::sequencer::note::{Note, NoteId, PITCH_COUNT};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Validation failures for timeline edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    #[error("Pitch index {index} out of range (0..{max})")]
    InvalidPitch { index: usize, max: usize },

    #[error("Note duration must be at least one beat, got {0}")]
    InvalidDuration(i64),

    #[error("Unknown note id {0}")]
    UnknownNote(NoteId),
}

/// Collection of notes shared between the editor, the scheduler and the exporters
///
/// Every read and write takes the lock for the whole operation, so a reader
/// never observes a half-updated note.
#[derive(Debug, Default)]
pub struct NoteTimeline {
    notes: RwLock<HashMap<NoteId, Note>>,
    next_id: AtomicU64,
}

impl NoteTimeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<NoteId, Note>> {
        // Poisoned data is still consistent: mutations are single assignments
        self.notes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<NoteId, Note>> {
        self.notes.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_pitch(pitch_index: usize) -> Result<(), TimelineError> {
        if pitch_index < PITCH_COUNT {
            Ok(())
        } else {
            Err(TimelineError::InvalidPitch {
                index: pitch_index,
                max: PITCH_COUNT,
            })
        }
    }

    /// Add a note and return its id
    pub fn add(
        &self,
        pitch_index: usize,
        start_beat: u32,
        duration_beats: u32,
    ) -> Result<NoteId, TimelineError> {
        Self::check_pitch(pitch_index)?;
        if duration_beats == 0 {
            return Err(TimelineError::InvalidDuration(0));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let note = Note {
            id,
            pitch_index,
            start_beat,
            duration_beats,
            lyric: String::new(),
        };
        self.write().insert(id, note);
        log::debug!("Added note {id} at beat {start_beat} (row {pitch_index})");
        Ok(id)
    }

    /// Move a note to a new start beat and pitch row
    ///
    /// Negative start beats are clamped to zero.
    pub fn move_note(
        &self,
        id: NoteId,
        new_start: i64,
        new_pitch: usize,
    ) -> Result<(), TimelineError> {
        Self::check_pitch(new_pitch)?;
        let mut notes = self.write();
        let note = notes.get_mut(&id).ok_or(TimelineError::UnknownNote(id))?;
        note.start_beat = new_start.clamp(0, u32::MAX as i64) as u32;
        note.pitch_index = new_pitch;
        Ok(())
    }

    /// Change the length of a note
    ///
    /// Lengths below one beat are clamped to one beat.
    pub fn resize(&self, id: NoteId, new_duration: i64) -> Result<(), TimelineError> {
        let mut notes = self.write();
        let note = notes.get_mut(&id).ok_or(TimelineError::UnknownNote(id))?;
        note.duration_beats = new_duration.clamp(1, u32::MAX as i64) as u32;
        Ok(())
    }

    /// Attach a lyric token to a note
    pub fn set_lyric(&self, id: NoteId, text: &str) -> Result<(), TimelineError> {
        let mut notes = self.write();
        let note = notes.get_mut(&id).ok_or(TimelineError::UnknownNote(id))?;
        note.lyric = text.to_string();
        Ok(())
    }

    /// Remove a note (unknown ids are ignored)
    pub fn remove(&self, id: NoteId) -> Option<Note> {
        self.write().remove(&id)
    }

    /// Get a copy of a note by id
    pub fn get(&self, id: NoteId) -> Option<Note> {
        self.read().get(&id).cloned()
    }

    /// Copy of every note, sorted by (start beat, pitch row)
    pub fn snapshot(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.read().values().cloned().collect();
        // Ids break ties so the order of duplicates is stable between snapshots
        notes.sort_by_key(|n| (n.start_beat, n.pitch_index, n.id));
        notes
    }

    /// Attach lyric tokens to notes in snapshot order
    ///
    /// Extra tokens are dropped; notes without a token keep their lyric.
    /// Returns the number of notes that received a token.
    pub fn assign_lyrics<S: AsRef<str>>(&self, tokens: &[S]) -> usize {
        let order = self.snapshot();
        let mut notes = self.write();
        let mut assigned = 0;
        for (note, token) in order.iter().zip(tokens) {
            if let Some(stored) = notes.get_mut(&note.id) {
                stored.lyric = token.as_ref().to_string();
                assigned += 1;
            }
        }
        assigned
    }

    /// Last beat covered by any note (0 when empty)
    pub fn end_beat(&self) -> u32 {
        self.read().values().map(Note::end_beat).max().unwrap_or(0)
    }

    /// Get the number of notes
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if timeline is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove all notes
    pub fn clear(&self) {
        self.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let timeline = NoteTimeline::new();
        let id = timeline.add(11, 0, 4).unwrap();

        let note = timeline.get(id).unwrap();
        assert_eq!(note.pitch_index, 11);
        assert_eq!(note.start_beat, 0);
        assert_eq!(note.duration_beats, 4);
        assert_eq!(note.lyric, "");
        assert_eq!(note.pitch().unwrap().name(), "C6");
    }

    #[test]
    fn test_ids_are_unique() {
        let timeline = NoteTimeline::new();
        let a = timeline.add(0, 0, 1).unwrap();
        timeline.remove(a);
        let b = timeline.add(0, 0, 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_pitch_rejected() {
        let timeline = NoteTimeline::new();
        timeline.add(3, 2, 1).unwrap();

        let err = timeline.add(PITCH_COUNT, 0, 1).unwrap_err();
        assert_eq!(
            err,
            TimelineError::InvalidPitch {
                index: PITCH_COUNT,
                max: PITCH_COUNT
            }
        );
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let timeline = NoteTimeline::new();
        assert_eq!(
            timeline.add(0, 0, 0).unwrap_err(),
            TimelineError::InvalidDuration(0)
        );
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_move_clamps_start() {
        let timeline = NoteTimeline::new();
        let id = timeline.add(5, 4, 2).unwrap();

        timeline.move_note(id, -3, 7).unwrap();
        let note = timeline.get(id).unwrap();
        assert_eq!(note.start_beat, 0);
        assert_eq!(note.pitch_index, 7);
    }

    #[test]
    fn test_move_invalid_pitch_leaves_note_untouched() {
        let timeline = NoteTimeline::new();
        let id = timeline.add(5, 4, 2).unwrap();

        assert!(timeline.move_note(id, 10, PITCH_COUNT + 2).is_err());
        let note = timeline.get(id).unwrap();
        assert_eq!(note.start_beat, 4);
        assert_eq!(note.pitch_index, 5);
    }

    #[test]
    fn test_resize_clamps_duration() {
        let timeline = NoteTimeline::new();
        let id = timeline.add(0, 0, 4).unwrap();

        timeline.resize(id, 8).unwrap();
        assert_eq!(timeline.get(id).unwrap().duration_beats, 8);

        timeline.resize(id, -2).unwrap();
        assert_eq!(timeline.get(id).unwrap().duration_beats, 1);
    }

    #[test]
    fn test_unknown_ids() {
        let timeline = NoteTimeline::new();
        assert!(timeline.remove(42).is_none());
        assert_eq!(
            timeline.resize(42, 2).unwrap_err(),
            TimelineError::UnknownNote(42)
        );
        assert_eq!(
            timeline.set_lyric(42, "la").unwrap_err(),
            TimelineError::UnknownNote(42)
        );
    }

    #[test]
    fn test_snapshot_is_sorted_copy() {
        let timeline = NoteTimeline::new();
        timeline.add(10, 8, 1).unwrap();
        timeline.add(3, 0, 1).unwrap();
        timeline.add(1, 8, 1).unwrap();
        let dup_a = timeline.add(3, 0, 2).unwrap();

        let snapshot = timeline.snapshot();
        let keys: Vec<_> = snapshot.iter().map(Note::sort_key).collect();
        assert_eq!(keys, vec![(0, 3), (0, 3), (8, 1), (8, 10)]);

        // Mutating after the snapshot does not touch the copy
        timeline.resize(dup_a, 6).unwrap();
        assert!(snapshot.iter().all(|n| n.duration_beats <= 2));
    }

    #[test]
    fn test_assign_lyrics_in_order() {
        let timeline = NoteTimeline::new();
        let late = timeline.add(0, 4, 1).unwrap();
        let early = timeline.add(0, 0, 1).unwrap();
        let last = timeline.add(0, 9, 1).unwrap();

        let assigned = timeline.assign_lyrics(&["do", "re"]);
        assert_eq!(assigned, 2);
        assert_eq!(timeline.get(early).unwrap().lyric, "do");
        assert_eq!(timeline.get(late).unwrap().lyric, "re");
        assert_eq!(timeline.get(last).unwrap().lyric, "");
    }

    #[test]
    fn test_end_beat() {
        let timeline = NoteTimeline::new();
        assert_eq!(timeline.end_beat(), 0);
        timeline.add(0, 2, 3).unwrap();
        timeline.add(0, 1, 1).unwrap();
        assert_eq!(timeline.end_beat(), 5);
    }
}

// Lab export - Plain text lyric timing, one "start duration lyric" line per note

use crate::sequencer::note::Note;
use crate::sequencer::tempo::Tempo;
use std::fmt::Write as _;

/// Timing of one note in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct LabEntry {
    pub start_seconds: f64,
    pub duration_seconds: f64,
    pub lyric: String,
}

impl LabEntry {
    pub fn from_note(note: &Note, tempo: Tempo) -> Self {
        Self {
            start_seconds: tempo.beats_to_seconds(note.start_beat as f64),
            duration_seconds: tempo.beats_to_seconds(note.duration_beats as f64),
            lyric: single_line(&note.lyric),
        }
    }
}

/// Control characters (line breaks, tabs) become spaces so every note stays on one line
fn single_line(lyric: &str) -> String {
    lyric
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Serializes snapshots as lab files
#[derive(Debug, Clone, Copy, Default)]
pub struct LyricExporter;

impl LyricExporter {
    /// Entries ordered by (start beat, pitch row)
    pub fn entries(&self, notes: &[Note], tempo: Tempo) -> Vec<LabEntry> {
        let mut ordered: Vec<&Note> = notes.iter().collect();
        ordered.sort_by_key(|n| n.sort_key());
        ordered
            .into_iter()
            .map(|n| LabEntry::from_note(n, tempo))
            .collect()
    }

    /// Render the lab file text
    pub fn render(&self, notes: &[Note], tempo: Tempo) -> String {
        let mut out = String::new();
        for entry in self.entries(notes, tempo) {
            // Writing to a String cannot fail
            let _ = writeln!(
                out,
                "{:.4} {:.4} {}",
                entry.start_seconds, entry.duration_seconds, entry.lyric
            );
        }
        out
    }
}

// Note representation for the piano roll
// A note is a pitch row, a grid-quantized start beat, a length in beats and a lyric

use std::fmt;

/// Unique identifier for notes
pub type NoteId = u64;

/// Number of rows in the piano roll (B6 down to C4)
pub const PITCH_COUNT: usize = 36;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Highest octave shown on the roll
const TOP_OCTAVE: i32 = 6;

/// A note in the piano roll
///
/// Timing is stored in whole beats: one grid step is one beat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Unique identifier for this note
    pub id: NoteId,

    /// Row in the descending pitch table (0 = B6)
    pub pitch_index: usize,

    /// Start position in beats
    pub start_beat: u32,

    /// Length in beats (always >= 1)
    pub duration_beats: u32,

    /// Attached lyric token, empty when unset
    pub lyric: String,
}

impl Note {
    /// Beat at which this note stops sounding
    pub fn end_beat(&self) -> u32 {
        self.start_beat.saturating_add(self.duration_beats)
    }

    /// Pitch of this note, or None if the index is outside the table
    pub fn pitch(&self) -> Option<Pitch> {
        PitchTable::get(self.pitch_index)
    }

    /// Ordering key used by every consumer of a snapshot
    pub fn sort_key(&self) -> (u32, usize) {
        (self.start_beat, self.pitch_index)
    }
}

/// A pitch on the 12-tone equal tempered scale, spelled with sharps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    /// Semitone within the octave (C = 0 ... B = 11)
    pub semitone: u8,
    /// Scientific pitch notation octave (C4 = middle C)
    pub octave: i32,
}

impl Pitch {
    /// Parse a pitch name such as "C6", "F#4" or "Bb5"
    ///
    /// Flats are normalized to the equivalent sharp before lookup.
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let natural: i32 = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let rest = chars.as_str();
        let (offset, octave_str) = if let Some(stripped) = rest.strip_prefix('#') {
            (1, stripped)
        } else if let Some(stripped) = rest.strip_prefix('b') {
            (-1, stripped)
        } else {
            (0, rest)
        };

        let octave: i32 = octave_str.parse().ok()?;

        // Cb, B#, E# and Fb cross the octave boundary
        let mut semitone = natural + offset;
        let mut octave = octave;
        if semitone < 0 {
            semitone += 12;
            octave -= 1;
        } else if semitone > 11 {
            semitone -= 12;
            octave += 1;
        }

        Some(Self {
            semitone: semitone as u8,
            octave,
        })
    }

    /// MIDI note number: (octave + 1) * 12 + semitone
    ///
    /// Returns None when the pitch falls outside 0-127.
    pub fn midi_number(&self) -> Option<u8> {
        let midi = (self.octave + 1) * 12 + self.semitone as i32;
        u8::try_from(midi).ok().filter(|m| *m <= 127)
    }

    /// Equal tempered frequency in Hz (A4 = 440 Hz)
    pub fn frequency(&self) -> f64 {
        let midi = (self.octave + 1) * 12 + self.semitone as i32;
        440.0 * 2f64.powf((midi - 69) as f64 / 12.0)
    }

    /// Note name spelled with sharps (e.g., "C#5")
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SHARP_NAMES[self.semitone as usize], self.octave)
    }
}

/// The fixed descending pitch table indexed by `Note::pitch_index`
pub struct PitchTable;

impl PitchTable {
    /// Pitch at a row, or None if out of range
    pub fn get(index: usize) -> Option<Pitch> {
        if index >= PITCH_COUNT {
            return None;
        }
        let octave = TOP_OCTAVE - (index / 12) as i32;
        let semitone = 11 - (index % 12) as u8;
        Some(Pitch { semitone, octave })
    }

    /// Row of a pitch name, or None if the name is not on the roll
    pub fn index_of(name: &str) -> Option<usize> {
        let pitch = Pitch::parse(name)?;
        let row = (TOP_OCTAVE - pitch.octave) * 12 + (11 - pitch.semitone as i32);
        usize::try_from(row).ok().filter(|r| *r < PITCH_COUNT)
    }

    /// Frequency of a row in Hz
    pub fn frequency(index: usize) -> Option<f64> {
        Self::get(index).map(|p| p.frequency())
    }

    /// Iterate over all rows from the top of the roll
    pub fn iter() -> impl Iterator<Item = Pitch> {
        (0..PITCH_COUNT).filter_map(Self::get)
    }
}

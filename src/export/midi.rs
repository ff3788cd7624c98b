// MIDI export - Standard MIDI File, format 0, single track
//
// Layout: MThd (format 0, 1 track, 480 PPQ), then one MTrk holding a tempo
// meta-event, the note events and an end-of-track meta-event.

use crate::config::MidiSettings;
use crate::export::ExportError;
use crate::sequencer::note::Note;
use crate::sequencer::tempo::Tempo;

/// Ticks per quarter note (beat)
pub const PPQ: u16 = 480;

/// Largest value a MIDI variable-length quantity can hold
pub const VLQ_MAX: u32 = 0x0FFF_FFFF;

/// Largest tempo meta-event value (24 bits)
pub const TEMPO_MAX: u32 = 0x00FF_FFFF;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;

/// A channel event placed on the tick grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    pub tick: u64,
    pub status: u8,
    pub key: u8,
    pub velocity: u8,
}

/// Write a MIDI variable-length quantity (VLQ)
///
/// Most significant group first, continuation bit on every byte but the last.
/// Values above `VLQ_MAX` are rejected and nothing is written.
pub fn write_vlq(buf: &mut Vec<u8>, value: u64) -> Result<(), ExportError> {
    if value > VLQ_MAX as u64 {
        return Err(ExportError::DeltaOutOfRange(value));
    }
    let mut value = value as u32;
    let mut bytes = [0u8; 4];
    let mut i = 3;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
    Ok(())
}

/// Read a VLQ from the start of `bytes`
///
/// Returns the value and the number of bytes consumed, or None if the
/// quantity is truncated or longer than four bytes.
pub fn read_vlq(bytes: &[u8]) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    for (i, byte) in bytes.iter().take(4).enumerate() {
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

/// Encodes timeline snapshots as Standard MIDI Files
#[derive(Debug, Clone, Copy, Default)]
pub struct MidiEncoder {
    settings: MidiSettings,
}

impl MidiEncoder {
    pub fn new(settings: MidiSettings) -> Self {
        Self { settings }
    }

    /// Note-On/Note-Off pairs sorted by tick
    ///
    /// The sort is stable, so events on the same tick keep insertion order
    /// (snapshot order, On before Off for each note).
    pub fn events(&self, notes: &[Note]) -> Vec<MidiEvent> {
        let channel = self.settings.channel & 0x0F;
        let mut events = Vec::with_capacity(notes.len() * 2);

        for note in notes {
            let Some(key) = note.pitch().and_then(|p| p.midi_number()) else {
                log::warn!("Skipping note {} with invalid pitch row", note.id);
                continue;
            };
            let start_tick = note.start_beat as u64 * PPQ as u64;
            let end_tick = start_tick + note.duration_beats as u64 * PPQ as u64;

            events.push(MidiEvent {
                tick: start_tick,
                status: NOTE_ON | channel,
                key,
                velocity: self.settings.velocity,
            });
            events.push(MidiEvent {
                tick: end_tick,
                status: NOTE_OFF | channel,
                key,
                velocity: 0,
            });
        }

        events.sort_by_key(|e| e.tick);
        events
    }

    /// Encode notes and tempo into SMF bytes
    ///
    /// Fails when the tempo does not fit the 24-bit tempo meta-event or when
    /// two consecutive events are further apart than a delta time can express.
    pub fn encode(&self, notes: &[Note], tempo: Tempo) -> Result<Vec<u8>, ExportError> {
        let track = self.build_track_chunk(notes, tempo)?;

        let mut out = Vec::with_capacity(22 + track.len());
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // format 0
        out.extend_from_slice(&1u16.to_be_bytes()); // 1 track
        out.extend_from_slice(&PPQ.to_be_bytes());

        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(&track);
        Ok(out)
    }

    fn build_track_chunk(&self, notes: &[Note], tempo: Tempo) -> Result<Vec<u8>, ExportError> {
        let mut t = Vec::new();

        // Tempo meta-event at tick 0
        let micros = tempo.microseconds_per_quarter();
        if micros == 0 || micros > TEMPO_MAX {
            return Err(ExportError::TempoOutOfRange(tempo.bpm()));
        }
        t.push(0x00);
        t.extend_from_slice(&[0xFF, 0x51, 0x03]);
        t.extend_from_slice(&micros.to_be_bytes()[1..]);

        let mut previous_tick = 0u64;
        for event in self.events(notes) {
            let delta = event.tick - previous_tick;
            write_vlq(&mut t, delta)?;
            t.extend_from_slice(&[event.status, event.key, event.velocity]);
            previous_tick = event.tick;
        }

        // End of track
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::note::PitchTable;

    fn note(id: u64, name: &str, start_beat: u32, duration_beats: u32) -> Note {
        Note {
            id,
            pitch_index: PitchTable::index_of(name).unwrap(),
            start_beat,
            duration_beats,
            lyric: String::new(),
        }
    }

    #[test]
    fn vlq_known_encodings() {
        let cases: [(u32, &[u8]); 8] = [
            (0x00, &[0x00]),
            (0x40, &[0x40]),
            (0x7F, &[0x7F]),
            (0x80, &[0x81, 0x00]),
            (0x2000, &[0xC0, 0x00]),
            (0x3FFF, &[0xFF, 0x7F]),
            (0x4000, &[0x81, 0x80, 0x00]),
            (0x0FFF_FFFF, &[0xFF, 0xFF, 0xFF, 0x7F]),
        ];
        for (value, expected) in cases {
            let mut buf = Vec::new();
            write_vlq(&mut buf, value as u64).unwrap();
            assert_eq!(buf, expected, "value {value:#x}");
        }
    }

    #[test]
    fn vlq_round_trip_boundaries() {
        let mut values = vec![0, 1, 0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000, VLQ_MAX];
        values.extend((0..VLQ_MAX).step_by(0x0001_2345).take(2000));
        for value in values {
            let mut buf = Vec::new();
            write_vlq(&mut buf, value as u64).unwrap();
            assert_eq!(read_vlq(&buf), Some((value, buf.len())), "value {value:#x}");
        }
    }

    #[test]
    fn vlq_read_rejects_truncated() {
        assert_eq!(read_vlq(&[]), None);
        assert_eq!(read_vlq(&[0x81]), None);
        assert_eq!(read_vlq(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F]), None);
    }

    #[test]
    fn c6_scenario() {
        let encoder = MidiEncoder::default();
        let notes = [note(1, "C6", 0, 4)];
        let tempo = Tempo::new(90.0).unwrap();

        let bytes = encoder.encode(&notes, tempo).unwrap();
        let expected: Vec<u8> = [
            &b"MThd"[..],
            &[0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0],
            &b"MTrk"[..],
            &[0, 0, 0, 20],
            // tempo 666667 = 0x0A2C2B
            &[0x00, 0xFF, 0x51, 0x03, 0x0A, 0x2C, 0x2B],
            // Note-On C6 (84) at tick 0
            &[0x00, 0x90, 84, 100],
            // Note-Off after 1920 ticks (0x8F 0x00)
            &[0x8F, 0x00, 0x80, 84, 0],
            &[0x00, 0xFF, 0x2F, 0x00],
        ]
        .concat();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn events_sorted_with_stable_ties() {
        let encoder = MidiEncoder::default();
        // First note ends on the tick the second starts
        let notes = [note(1, "C5", 0, 2), note(2, "E5", 2, 1), note(3, "G5", 1, 1)];
        let events = encoder.events(&notes);

        let ticks: Vec<u64> = events.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 480, 960, 960, 960, 1440]);

        // At tick 960: C5 off (inserted first), E5 on, G5 off
        assert_eq!((events[2].status, events[2].key), (0x80, 72));
        assert_eq!((events[3].status, events[3].key), (0x90, 76));
        assert_eq!((events[4].status, events[4].key), (0x80, 79));
    }

    #[test]
    fn channel_and_velocity_settings() {
        let encoder = MidiEncoder::new(MidiSettings {
            channel: 3,
            velocity: 64,
        });
        let events = encoder.events(&[note(1, "A4", 0, 1)]);
        assert_eq!(events[0].status, 0x93);
        assert_eq!(events[0].velocity, 64);
        assert_eq!(events[1].status, 0x83);
    }

    #[test]
    fn deterministic_output() {
        let encoder = MidiEncoder::default();
        let notes = [note(1, "D5", 3, 2), note(2, "F#4", 0, 8)];
        let tempo = Tempo::new(133.0).unwrap();
        assert_eq!(
            encoder.encode(&notes, tempo).unwrap(),
            encoder.encode(&notes, tempo).unwrap()
        );
    }

    #[test]
    fn track_length_matches_chunk() {
        let encoder = MidiEncoder::default();
        let notes = [note(1, "B6", 0, 1), note(2, "C4", 100, 3)];
        let bytes = encoder.encode(&notes, Tempo::default()).unwrap();

        let declared = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) as usize;
        assert_eq!(declared, bytes.len() - 22);
        assert_eq!(&bytes[bytes.len() - 3..], &[0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn vlq_rejects_values_past_max() {
        let mut buf = vec![0xAA];
        let err = write_vlq(&mut buf, VLQ_MAX as u64 + 1).unwrap_err();
        assert!(matches!(err, ExportError::DeltaOutOfRange(v) if v == VLQ_MAX as u64 + 1));
        assert_eq!(buf, vec![0xAA]);
    }

    #[test]
    fn far_note_rejected_instead_of_moved() {
        let encoder = MidiEncoder::default();
        // 600 000 beats = 288 000 000 ticks, past the largest delta time
        let notes = [note(1, "C5", 600_000, 1)];
        let err = encoder.encode(&notes, Tempo::new(120.0).unwrap()).unwrap_err();
        assert!(matches!(err, ExportError::DeltaOutOfRange(288_000_000)));

        // The same gap split by another note fits
        let notes = [note(1, "C5", 300_000, 1), note(2, "C5", 600_000, 1)];
        assert!(encoder.encode(&notes, Tempo::new(120.0).unwrap()).is_ok());
    }

    #[test]
    fn tempo_must_fit_meta_event() {
        let encoder = MidiEncoder::default();
        let notes = [note(1, "A4", 0, 1)];

        // 3 BPM needs 20 000 000 us per quarter
        let err = encoder.encode(&notes, Tempo::new(3.0).unwrap()).unwrap_err();
        assert!(matches!(err, ExportError::TempoOutOfRange(bpm) if bpm == 3.0));

        // 3.6 BPM needs 16 666 667 us (0xFE502B), just under the limit
        let bytes = encoder.encode(&notes, Tempo::new(3.6).unwrap()).unwrap();
        assert_eq!(&bytes[26..29], &[0xFE, 0x50, 0x2B]);

        assert!(encoder.encode(&notes, Tempo::new(1.0e9).unwrap()).is_err());
    }
}

// Export - MIDI and lab files written from one timeline snapshot
//
// Files are written to a temporary file in the destination directory and
// renamed into place, so a failed export never leaves a partial file under
// the destination name.

pub mod lab;
pub mod midi;

use crate::config::MidiSettings;
use crate::sequencer::note::Note;
use crate::sequencer::tempo::{SharedTempo, Tempo};
use crate::sequencer::timeline::NoteTimeline;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub use lab::{LabEntry, LyricExporter};
pub use midi::{MidiEncoder, PPQ, read_vlq, write_vlq};

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Nothing to export: the timeline is empty")]
    EmptyTimeline,

    #[error("Tempo {0} BPM does not fit a MIDI tempo event")]
    TempoOutOfRange(f64),

    #[error("Gap of {0} ticks between MIDI events exceeds the delta-time range")]
    DeltaOutOfRange(u64),

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write `bytes` to `path` through a temporary file and an atomic rename
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), ExportError> {
    let path = path.as_ref();
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// What one export call produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub notes: usize,
    pub tempo: Tempo,
    pub midi_bytes: Option<usize>,
    pub lab_lines: Option<usize>,
}

/// Writes MIDI and lab files for a timeline
#[derive(Debug, Clone)]
pub struct Exporter {
    encoder: MidiEncoder,
    lyrics: LyricExporter,
}

impl Exporter {
    pub fn new(settings: MidiSettings) -> Self {
        Self {
            encoder: MidiEncoder::new(settings),
            lyrics: LyricExporter,
        }
    }

    fn check_not_empty(notes: &[Note]) -> Result<(), ExportError> {
        if notes.is_empty() {
            log::warn!("Export skipped: timeline is empty");
            return Err(ExportError::EmptyTimeline);
        }
        Ok(())
    }

    /// Write a MIDI file from a snapshot
    pub fn write_midi(
        &self,
        notes: &[Note],
        tempo: Tempo,
        path: impl AsRef<Path>,
    ) -> Result<usize, ExportError> {
        Self::check_not_empty(notes)?;
        let bytes = self.encoder.encode(notes, tempo)?;
        write_atomic(path.as_ref(), &bytes)?;
        log::info!(
            "Exported {} notes to {} ({} bytes)",
            notes.len(),
            path.as_ref().display(),
            bytes.len()
        );
        Ok(bytes.len())
    }

    /// Write a lab file from a snapshot
    pub fn write_lab(
        &self,
        notes: &[Note],
        tempo: Tempo,
        path: impl AsRef<Path>,
    ) -> Result<usize, ExportError> {
        Self::check_not_empty(notes)?;
        let text = self.lyrics.render(notes, tempo);
        write_atomic(path.as_ref(), text.as_bytes())?;
        log::info!(
            "Exported lyric timing for {} notes to {}",
            notes.len(),
            path.as_ref().display()
        );
        Ok(notes.len())
    }

    /// Take one snapshot and write whichever files were requested
    pub fn export(
        &self,
        timeline: &NoteTimeline,
        tempo: &SharedTempo,
        midi_path: Option<&Path>,
        lab_path: Option<&Path>,
    ) -> Result<ExportSummary, ExportError> {
        let notes = timeline.snapshot();
        let tempo = tempo.get();
        Self::check_not_empty(&notes)?;

        let midi_bytes = midi_path
            .map(|path| self.write_midi(&notes, tempo, path))
            .transpose()?;
        let lab_lines = lab_path
            .map(|path| self.write_lab(&notes, tempo, path))
            .transpose()?;

        Ok(ExportSummary {
            notes: notes.len(),
            tempo,
            midi_bytes,
            lab_lines,
        })
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(MidiSettings::default())
    }
}

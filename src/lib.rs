// Lyric Roll - Piano roll core: note timeline, playback, tone synthesis and export

pub mod audio;
pub mod config;
pub mod error;
pub mod export;
pub mod lyrics;
pub mod messaging;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::{CpalTonePlayer, SilentTonePlayer, TonePlayer, default_tone_player};
pub use config::{ConfigError, EditorConfig, GridConfig, MidiSettings};
pub use error::{Error, Result};
pub use export::{ExportError, Exporter, LyricExporter, MidiEncoder};
pub use lyrics::{CharTokenizer, LyricTokenizer, WhitespaceTokenizer};
pub use messaging::channels::{EventConsumer, EventSink, create_event_channel};
pub use messaging::event::PlaybackEvent;
pub use sequencer::{
    Note, NoteId, NoteTimeline, PITCH_COUNT, PitchTable, PlaybackScheduler, SharedTempo, Tempo,
    TimelineError,
};
pub use synth::{ToneRequest, ToneSynthesizer};

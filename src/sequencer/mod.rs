// Sequencer module
// Notes, tempo, the note store and the playback clock

pub mod note;
pub mod player;
pub mod tempo;
pub mod timeline;
pub mod transport;

pub use note::{Note, NoteId, PITCH_COUNT, Pitch, PitchTable};
pub use player::{ClockMode, PlaybackScheduler, TriggeredNote};
pub use tempo::{SharedTempo, Tempo};
pub use timeline::{NoteTimeline, TimelineError};
pub use transport::{PlaybackState, SweepWindow, TransportState};

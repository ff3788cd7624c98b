// Crate-wide error type

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::lyrics::LyricsError;
use crate::sequencer::timeline::TimelineError;
use crate::synth::tone::SynthError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Lyrics(#[from] LyricsError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// Lyrics - Text to token splitting for attaching syllables to notes
//
// Real phoneme providers live outside this crate and plug in through
// `LyricTokenizer`; the character split always works.

use std::fs;
use std::path::{Path, PathBuf};

/// Errors while reading lyric text
#[derive(Debug, thiserror::Error)]
pub enum LyricsError {
    #[error("Failed to read lyrics from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lyrics file {0:?} is empty")]
    Empty(PathBuf),
}

/// Turns free text into one token per note
pub trait LyricTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// One token per visible character
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTokenizer;

impl LyricTokenizer for CharTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_string())
            .collect()
    }
}

/// One token per whitespace separated word
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl LyricTokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Read a UTF-8 lyrics file, trimmed
pub fn load_lyrics(path: impl AsRef<Path>) -> Result<String, LyricsError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LyricsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = text.trim();
    if text.is_empty() {
        return Err(LyricsError::Empty(path.to_path_buf()));
    }
    Ok(text.to_string())
}

// Tempo - BPM value and the process-wide shared tempo
// Handles conversion between beats and real time

use crate::config::ConfigError;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tempo in BPM (Beats Per Minute)
///
/// Always strictly positive and finite, so beat/time conversions never divide by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo
    pub fn new(bpm: f64) -> Result<Self, ConfigError> {
        if bpm.is_finite() && bpm > 0.0 {
            Ok(Self { bpm })
        } else {
            Err(ConfigError::InvalidTempo(bpm))
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Beats advanced per second of wall-clock time
    pub fn beats_per_second(&self) -> f64 {
        self.bpm / 60.0
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Convert a beat offset to seconds
    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * 60.0 / self.bpm
    }

    /// Convert a beat count to milliseconds
    pub fn beats_to_millis(&self, beats: f64) -> f64 {
        self.beats_to_seconds(beats) * 1000.0
    }

    /// Microseconds per quarter note, as written in a MIDI tempo meta-event
    pub fn microseconds_per_quarter(&self) -> u32 {
        (60_000_000.0 / self.bpm).round() as u32
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 90.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Thread-safe tempo shared by the scheduler and the exporters
///
/// Stores the f64 bits in an atomic. Writes take effect on the next
/// scheduler tick or export.
#[derive(Debug, Clone)]
pub struct SharedTempo {
    inner: Arc<AtomicU64>,
}

impl SharedTempo {
    pub fn new(tempo: Tempo) -> Self {
        Self {
            inner: Arc::new(AtomicU64::new(tempo.bpm().to_bits())),
        }
    }

    /// Current tempo
    pub fn get(&self) -> Tempo {
        Tempo {
            bpm: f64::from_bits(self.inner.load(Ordering::Relaxed)),
        }
    }

    /// Set a new tempo
    pub fn set(&self, tempo: Tempo) {
        self.inner.store(tempo.bpm().to_bits(), Ordering::Relaxed);
    }

    /// Set from a raw BPM value
    ///
    /// Invalid values are rejected and the last good tempo is kept.
    pub fn set_bpm(&self, bpm: f64) -> Result<Tempo, ConfigError> {
        match Tempo::new(bpm) {
            Ok(tempo) => {
                self.set(tempo);
                Ok(tempo)
            }
            Err(e) => {
                log::warn!("Rejected tempo {bpm}, keeping {}", self.get());
                Err(e)
            }
        }
    }
}

impl Default for SharedTempo {
    fn default() -> Self {
        Self::new(Tempo::default())
    }
}

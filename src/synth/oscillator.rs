// Oscillators - Harmonic waveform generators

use std::f64::consts::TAU;

/// Relative weights of the 1st to 4th harmonics
pub const HARMONIC_WEIGHTS: [f64; 4] = [1.0, 0.6, 0.3, 0.15];

/// Waveform evaluated directly from time, so each note render is stateless
pub trait Oscillator {
    /// Amplitude at `t` seconds after the note start
    fn value_at(&self, t: f64) -> f64;
}

/// Sum of integer harmonics of a fundamental
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicOscillator {
    frequency: f64,
    weights: Vec<f64>,
}

impl HarmonicOscillator {
    /// Oscillator using the standard four harmonic weights
    pub fn new(frequency: f64) -> Self {
        Self::with_weights(frequency, &HARMONIC_WEIGHTS)
    }

    /// Oscillator with custom weights (index 0 = fundamental)
    pub fn with_weights(frequency: f64, weights: &[f64]) -> Self {
        Self {
            frequency,
            weights: weights.to_vec(),
        }
    }

    /// Plain sine at the fundamental
    pub fn sine(frequency: f64) -> Self {
        Self::with_weights(frequency, &[1.0])
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Sum of the absolute weights, the peak the waveform can reach
    pub fn peak(&self) -> f64 {
        self.weights.iter().map(|w| w.abs()).sum()
    }
}

impl Oscillator for HarmonicOscillator {
    fn value_at(&self, t: f64) -> f64 {
        self.weights
            .iter()
            .enumerate()
            .map(|(i, weight)| weight * (TAU * self.frequency * (i + 1) as f64 * t).sin())
            .sum()
    }
}

// Synth module - Harmonic tone rendering

pub mod envelope;
pub mod oscillator;
pub mod tone;

pub use tone::{SAMPLE_RATE, SynthError, ToneRequest, ToneSynthesizer};

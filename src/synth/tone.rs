// Tone synthesis - Renders a single note into a 16-bit mono buffer
//
// Every call is independent: the frequency and duration are captured by
// value and the output buffer is owned by the caller.

use crate::synth::envelope::PluckEnvelope;
use crate::synth::oscillator::{HarmonicOscillator, Oscillator};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Output sample rate of rendered tones
pub const SAMPLE_RATE: u32 = 44_100;

/// Master gain applied before scaling to 16-bit
const OUTPUT_GAIN: f64 = 0.25;

/// Largest magnitude written to the buffer
const MAX_AMPLITUDE: f64 = 32767.0;

/// Longest rendered tone; the envelope is below -60 dB after about 3 s
pub const MAX_TONE_MS: f64 = 10_000.0;

/// Synthesis and audio output errors
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("Invalid tone: frequency {frequency} Hz, duration {duration_ms} ms")]
    InvalidTone { frequency: f64, duration_ms: f64 },

    #[error("Audio backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

/// Request to sound one note, captured at trigger time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneRequest {
    pub frequency: f64,
    pub duration_ms: f64,
}

impl ToneRequest {
    pub fn new(frequency: f64, duration_ms: f64) -> Self {
        Self {
            frequency,
            duration_ms,
        }
    }

    /// Check the request can be rendered
    pub fn validate(&self) -> Result<(), SynthError> {
        let valid = self.frequency.is_finite()
            && self.frequency > 0.0
            && self.duration_ms.is_finite()
            && self.duration_ms > 0.0;
        if valid {
            Ok(())
        } else {
            Err(SynthError::InvalidTone {
                frequency: self.frequency,
                duration_ms: self.duration_ms,
            })
        }
    }
}

/// Renders harmonic plucked tones
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToneSynthesizer {
    envelope: PluckEnvelope,
}

impl ToneSynthesizer {
    pub fn new(envelope: PluckEnvelope) -> Self {
        Self { envelope }
    }

    /// Number of samples for a duration, capped at `MAX_TONE_MS`
    pub fn sample_count(duration_ms: f64) -> usize {
        let duration_ms = duration_ms.clamp(0.0, MAX_TONE_MS);
        (duration_ms * SAMPLE_RATE as f64 / 1000.0).round() as usize
    }

    /// Render a four-harmonic tone
    pub fn render(&self, request: ToneRequest) -> Result<Vec<i16>, SynthError> {
        request.validate()?;
        let osc = HarmonicOscillator::new(request.frequency);
        Ok(self.render_with(&osc, request.duration_ms))
    }

    /// Render a single sine, used when the full tone cannot be played
    pub fn render_fallback(&self, request: ToneRequest) -> Result<Vec<i16>, SynthError> {
        request.validate()?;
        let osc = HarmonicOscillator::sine(request.frequency);
        Ok(self.render_with(&osc, request.duration_ms))
    }

    fn render_with(&self, osc: &impl Oscillator, duration_ms: f64) -> Vec<i16> {
        let count = Self::sample_count(duration_ms);
        let sample_rate = SAMPLE_RATE as f64;

        (0..count)
            .map(|i| {
                let t = i as f64 / sample_rate;
                let value = osc.value_at(t) * self.envelope.value_at(t) * OUTPUT_GAIN * MAX_AMPLITUDE;
                value.clamp(-MAX_AMPLITUDE, MAX_AMPLITUDE) as i16
            })
            .collect()
    }

    /// Render a tone and write it as a 16-bit mono WAV file
    pub fn render_to_wav(
        &self,
        request: ToneRequest,
        path: impl AsRef<Path>,
    ) -> Result<usize, SynthError> {
        let samples = self.render(request)?;

        let spec = WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path.as_ref(), spec)?;
        for sample in &samples {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;

        Ok(samples.len())
    }
}

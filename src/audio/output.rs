// Tone output - Plays rendered notes on the default CPAL device
//
// Each tone opens its own short-lived stream on the calling thread, so any
// number of notes can overlap. The scheduler calls `play` from a detached
// thread and only logs failures.

use crate::audio::device::AudioDeviceManager;
use crate::audio::format_conversion::{resample_to_f32, write_mono_to_interleaved_frame};
use crate::synth::tone::{SAMPLE_RATE, SynthError, ToneRequest, ToneSynthesizer};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Extra time a stream stays open after the last sample
const STREAM_TAIL: Duration = Duration::from_millis(50);

/// Something that can sound a tone request
///
/// `play` blocks until the tone is finished.
pub trait TonePlayer: Send + Sync {
    fn play(&self, request: ToneRequest) -> Result<(), SynthError>;

    /// Human readable backend name for logging
    fn name(&self) -> &'static str;
}

/// Plays tones on the default output device
#[derive(Debug, Default)]
pub struct CpalTonePlayer {
    synth: ToneSynthesizer,
}

impl CpalTonePlayer {
    pub fn new(synth: ToneSynthesizer) -> Self {
        Self { synth }
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        samples: Arc<Vec<f32>>,
    ) -> Result<Stream, SynthError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let channels = config.channels as usize;
        let cursor = AtomicUsize::new(0);

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let sample = samples.get(index).copied().unwrap_or(0.0);
                        write_mono_to_interleaved_frame(sample, frame);
                    }
                },
                move |err| {
                    log::error!("Audio stream error: {err}");
                },
                None,
            )
            .map_err(|e| SynthError::Stream(e.to_string()))
    }

    fn play_samples(&self, samples: &[i16]) -> Result<(), SynthError> {
        let device = AudioDeviceManager::new()
            .default_output_device()
            .ok_or_else(|| SynthError::BackendUnavailable("no output device".to_string()))?;

        let supported_config = device
            .default_output_config()
            .map_err(|e| SynthError::BackendUnavailable(e.to_string()))?;
        let sample_format = supported_config.sample_format();
        let device_rate = supported_config.sample_rate().0;
        let config: StreamConfig = supported_config.into();

        let buffer = Arc::new(resample_to_f32(samples, SAMPLE_RATE, device_rate));
        let length = Duration::from_secs_f64(buffer.len() as f64 / device_rate as f64);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, buffer),
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, buffer),
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, buffer),
            other => {
                return Err(SynthError::BackendUnavailable(format!(
                    "unsupported sample format {other:?}"
                )));
            }
        }?;

        stream
            .play()
            .map_err(|e| SynthError::Stream(e.to_string()))?;
        thread::sleep(length + STREAM_TAIL);
        Ok(())
    }
}

impl TonePlayer for CpalTonePlayer {
    fn play(&self, request: ToneRequest) -> Result<(), SynthError> {
        let samples = self.synth.render(request)?;
        self.play_samples(&samples)
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

/// Player used when no audio backend is available
///
/// Validates the request so invalid tones are still reported, then stays
/// silent without rendering anything.
#[derive(Debug, Default)]
pub struct SilentTonePlayer;

impl TonePlayer for SilentTonePlayer {
    fn play(&self, request: ToneRequest) -> Result<(), SynthError> {
        request.validate()?;
        log::trace!(
            "Silent tone {:.1} Hz ({} samples)",
            request.frequency,
            ToneSynthesizer::sample_count(request.duration_ms)
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

/// Pick the best available player
pub fn default_tone_player() -> Arc<dyn TonePlayer> {
    let devices = AudioDeviceManager::new();
    for device in devices.list_output_devices() {
        log::debug!(
            "Output device: {}{}",
            device.name,
            if device.is_default { " (default)" } else { "" }
        );
    }

    if devices.has_output() {
        Arc::new(CpalTonePlayer::default())
    } else {
        log::warn!("No audio output device found, notes will play silently");
        Arc::new(SilentTonePlayer)
    }
}

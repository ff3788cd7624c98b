// Format conversion for CPAL audio streams
//
// Rendered tones are 16-bit mono at a fixed rate; output devices may want
// f32, i16 or u16 at any rate and channel count.

use cpal::{FromSample, Sample};

/// Convert i16 sample to f32
///
/// Maps [i16::MIN, i16::MAX] to [-1.0, 1.0]
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    if sample >= 0 {
        sample as f32 / i16::MAX as f32
    } else {
        sample as f32 / -(i16::MIN as f32)
    }
}

/// Convert a 16-bit buffer to f32 at a new sample rate
///
/// Linear interpolation is enough for short preview tones.
pub fn resample_to_f32(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return Vec::new();
    }
    if from_rate == to_rate {
        return samples.iter().map(|s| i16_to_f32(*s)).collect();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).round() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let index = (pos.floor() as usize).min(last);
            let next = (index + 1).min(last);
            let frac = (pos - index as f64) as f32;
            let a = i16_to_f32(samples[index]);
            let b = i16_to_f32(samples[next]);
            a + (b - a) * frac
        })
        .collect()
}

/// Write one mono sample to every channel of an interleaved frame
#[inline]
pub fn write_mono_to_interleaved_frame<T>(internal_sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for channel_sample in output_frame.iter_mut() {
        *channel_sample = Sample::from_sample::<f32>(internal_sample);
    }
}

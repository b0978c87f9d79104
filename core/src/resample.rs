//! Capture conditioning ahead of the receive chain
//!
//! Downsampling low-passes at the source rate first; anything above the new
//! Nyquist would otherwise fold into the channel.

use crate::error::{ModemError, Result};
use crate::filter_design::{design, FilterSpec};
use crate::signal::SampleBuffer;

/// Anti-alias passband edge as a fraction of the target rate
const ANTI_ALIAS_PASSBAND: f64 = 0.3;

/// Anti-alias stopband edge as a fraction of the target rate (its Nyquist)
const ANTI_ALIAS_STOPBAND: f64 = 0.5;

const ANTI_ALIAS_RIPPLE_DB: f64 = 1.0;
const ANTI_ALIAS_ATTENUATION_DB: f64 = 40.0;

/// Average interleaved multi-channel audio down to mono
///
/// # Arguments
/// * `samples` - Interleaved samples [c0, c1, ..., c0, c1, ...]
/// * `channels` - Number of interleaved channels
pub fn downmix(samples: &[f32], channels: usize) -> Result<Vec<f32>> {
    if channels == 0 {
        return Err(ModemError::Configuration("zero audio channels".to_string()));
    }
    if samples.len() % channels != 0 {
        return Err(ModemError::Configuration(format!(
            "{} samples do not split into {} channels",
            samples.len(),
            channels
        )));
    }
    if channels == 1 {
        return Ok(samples.to_vec());
    }

    Ok(samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect())
}

/// Resample to `to_rate` using linear interpolation
///
/// # Example
/// ```ignore
/// let capture_44k = SampleBuffer::new(samples, 44100);
/// let capture_20k = resample(&capture_44k, 20000)?;
/// ```
pub fn resample(input: &SampleBuffer, to_rate: u32) -> Result<SampleBuffer> {
    if input.sample_rate == to_rate || input.is_empty() || input.sample_rate == 0 {
        return Ok(SampleBuffer::new(input.samples.clone(), to_rate));
    }
    if to_rate == 0 {
        return Err(ModemError::Configuration("target sample rate must be positive".to_string()));
    }

    let filtered;
    let samples = if to_rate < input.sample_rate {
        let to = to_rate as f64;
        let anti_alias = design(&FilterSpec::lowpass(
            ANTI_ALIAS_PASSBAND * to,
            ANTI_ALIAS_STOPBAND * to,
            ANTI_ALIAS_RIPPLE_DB,
            ANTI_ALIAS_ATTENUATION_DB,
            input.sample_rate,
        ))?;
        filtered = anti_alias.apply(&input.samples);
        &filtered
    } else {
        &input.samples
    };

    let ratio = to_rate as f64 / input.sample_rate as f64;
    let new_length = ((samples.len() as f64) * ratio).ceil() as usize;

    let resampled = (0..new_length)
        .map(|i| {
            let src = i as f64 / ratio;
            let floor = src.floor() as usize;
            let fraction = (src - floor as f64) as f32;
            match (samples.get(floor), samples.get(floor + 1)) {
                (Some(&a), Some(&b)) => a * (1.0 - fraction) + b * fraction,
                (Some(&a), None) => a,
                _ => samples[samples.len() - 1],
            }
        })
        .collect();

    Ok(SampleBuffer::new(resampled, to_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_stereo() {
        let stereo = vec![0.2, 0.8, 0.4, 0.6]; // [L, R, L, R]
        let mono = downmix(&stereo, 2).unwrap();
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.5).abs() < 0.001);
        assert!((mono[1] - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_downmix_rejects_ragged_input() {
        assert!(downmix(&[0.1, 0.2, 0.3], 2).is_err());
        assert!(downmix(&[0.1], 0).is_err());
    }

    #[test]
    fn test_resample_same_rate() {
        let input = SampleBuffer::new(vec![0.1, 0.2, 0.3, 0.4], 20000);
        assert_eq!(resample(&input, 20000).unwrap(), input);
    }

    #[test]
    fn test_resample_downsample() {
        let input = SampleBuffer::new(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8], 48000);
        let out = resample(&input, 16000).unwrap();
        assert_eq!(out.sample_rate, 16000);
        assert!(out.len() >= 2 && out.len() <= 3);
    }

    #[test]
    fn test_resample_upsample_interpolates() {
        let input = SampleBuffer::new(vec![0.0, 1.0, 0.0], 10000);
        let out = resample(&input, 20000).unwrap();
        assert_eq!(out.len(), 6);
        assert!((out.samples[1] - 0.5).abs() < 1e-6);
        assert!((out.samples[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resample_preserves_duration() {
        let input = SampleBuffer::new(vec![0.0; 44100], 44100);
        let out = resample(&input, 20000).unwrap();
        assert!((out.duration() - input.duration()).abs() < 1e-3);
    }

    fn tone(freq: f32, rate: u32, len: usize) -> SampleBuffer {
        let samples = (0..len)
            .map(|n| (2.0 * std::f64::consts::PI * freq as f64 * n as f64 / rate as f64).sin() as f32)
            .collect();
        SampleBuffer::new(samples, rate)
    }

    fn settled_rms(buffer: &SampleBuffer) -> f32 {
        let tail = &buffer.samples[buffer.len() / 2..];
        (tail.iter().map(|s| s * s).sum::<f32>() / tail.len() as f32).sqrt()
    }

    #[test]
    fn test_downsample_rejects_content_above_new_nyquist() {
        // 15 kHz would fold to 5 kHz at 20 kHz
        let out = resample(&tone(15000.0, 44100, 44100), 20000).unwrap();
        assert!(settled_rms(&out) < 0.05, "alias rms {}", settled_rms(&out));
    }

    #[test]
    fn test_downsample_keeps_passband_tone() {
        let out = resample(&tone(1000.0, 44100, 44100), 20000).unwrap();
        let rms = settled_rms(&out);
        assert!((rms - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.1, "rms {}", rms);
    }
}

use crate::filter::FilterRealization;
use crate::signal::{ComplexBasebandSignal, SampleBuffer};
use num_complex::Complex32;
use std::f64::consts::PI;

/// Coherent I/Q downconversion to complex baseband
///
/// Mixing with 2cos / 2sin leaves the baseband term at unit gain plus an
/// image at twice the carrier, which the lowpass removes.
pub struct QuadratureDemodulator<'a> {
    carrier_frequency: f32,
    lowpass: &'a FilterRealization,
}

impl<'a> QuadratureDemodulator<'a> {
    pub fn new(carrier_frequency: f32, lowpass: &'a FilterRealization) -> Self {
        Self {
            carrier_frequency,
            lowpass,
        }
    }

    /// Split `input` into unfiltered in-phase and quadrature products
    pub fn mix(&self, input: &SampleBuffer) -> (Vec<f32>, Vec<f32>) {
        let dt = 1.0 / input.sample_rate as f64;
        let w = 2.0 * PI * self.carrier_frequency as f64;

        input
            .samples
            .iter()
            .enumerate()
            .map(|(n, &y)| {
                // Phase in f64: n * dt reaches tens of seconds in long captures
                let (sin, cos) = (w * n as f64 * dt).sin_cos();
                let y = 2.0 * y as f64;
                ((y * cos) as f32, (y * sin) as f32)
            })
            .unzip()
    }

    pub fn demodulate(&self, input: &SampleBuffer) -> ComplexBasebandSignal {
        let (in_phase, quadrature) = self.mix(input);
        let in_phase = self.lowpass.apply(&in_phase);
        let quadrature = self.lowpass.apply(&quadrature);

        let samples = in_phase
            .into_iter()
            .zip(quadrature)
            .map(|(i, q)| Complex32::new(i, q))
            .collect();

        ComplexBasebandSignal::new(samples, input.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_design::{design, FilterSpec};

    fn tone(freq: f32, phase: f32, amplitude: f32, len: usize, fs: u32) -> SampleBuffer {
        let samples = (0..len)
            .map(|n| {
                let t = n as f32 / fs as f32;
                amplitude * (2.0 * std::f32::consts::PI * freq * t + phase).sin()
            })
            .collect();
        SampleBuffer::new(samples, fs)
    }

    #[test]
    fn test_mix_preserves_length() {
        let lowpass = design(&FilterSpec::lowpass(100.0, 500.0, 1.0, 40.0, 20000)).unwrap();
        let demod = QuadratureDemodulator::new(2500.0, &lowpass);
        let input = tone(2500.0, 0.0, 1.0, 2000, 20000);
        let (i, q) = demod.mix(&input);
        assert_eq!(i.len(), input.len());
        assert_eq!(q.len(), input.len());
    }

    #[test]
    fn test_sine_carrier_lands_on_quadrature_axis() {
        let lowpass = design(&FilterSpec::lowpass(100.0, 500.0, 1.0, 40.0, 20000)).unwrap();
        let demod = QuadratureDemodulator::new(2500.0, &lowpass);
        let z = demod.demodulate(&tone(2500.0, 0.0, 0.5, 20000, 20000));

        // Past the filter transient the baseband is A*i for A*sin(wt)
        let settled = &z.samples[10000..];
        let mean_i = settled.iter().map(|c| c.re).sum::<f32>() / settled.len() as f32;
        let mean_q = settled.iter().map(|c| c.im).sum::<f32>() / settled.len() as f32;
        assert!(mean_i.abs() < 0.02, "in-phase residue {}", mean_i);
        assert!((mean_q - 0.5).abs() < 0.02, "quadrature {}", mean_q);
    }

    #[test]
    fn test_phase_offset_rotates_baseband() {
        let lowpass = design(&FilterSpec::lowpass(100.0, 500.0, 1.0, 40.0, 20000)).unwrap();
        let demod = QuadratureDemodulator::new(2500.0, &lowpass);
        let offset = 0.7f32;
        let z = demod.demodulate(&tone(2500.0, offset, 1.0, 20000, 20000));

        let settled = &z.samples[10000..];
        let mean: Complex32 = settled.iter().sum::<Complex32>() / settled.len() as f32;
        // sin(wt + a) mixes down to i*e^{-ia}
        let expected = std::f32::consts::FRAC_PI_2 - offset;
        assert!((mean.arg() - expected).abs() < 0.05, "angle {}", mean.arg());
    }
}

use crate::signal::SampleBuffer;
use std::f64::consts::PI;

/// Amplitude modulation of a real baseband onto a sine carrier
#[derive(Debug, Clone, Copy)]
pub struct CarrierModulator {
    carrier_frequency: f32,
    amplitude: f32,
}

impl CarrierModulator {
    pub fn new(carrier_frequency: f32, amplitude: f32) -> Self {
        Self {
            carrier_frequency,
            amplitude,
        }
    }

    /// xm[n] = Ac * xb[n] * sin(2*pi*fc*n*dt)
    pub fn modulate(&self, baseband: &SampleBuffer) -> SampleBuffer {
        let dt = 1.0 / baseband.sample_rate as f64;
        let w = 2.0 * PI * self.carrier_frequency as f64;

        let samples = baseband
            .samples
            .iter()
            .enumerate()
            .map(|(n, &x)| self.amplitude * x * (w * n as f64 * dt).sin() as f32)
            .collect();

        SampleBuffer::new(samples, baseband.sample_rate)
    }
}

use crate::signal::ComplexBasebandSignal;
use num_complex::Complex32;

/// Carrier phase estimator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhaseEstimator {
    /// angle(mean(z)); biased toward zero information when the data is balanced
    FirstMoment,
    /// 0.5 * angle(mean(z^2)); insensitive to data balance, leaves a pi ambiguity
    #[default]
    SquaredMoment,
}

/// Removes the unknown carrier phase from a baseband signal
pub struct PhaseSynchronizer {
    estimator: PhaseEstimator,
}

impl PhaseSynchronizer {
    pub fn new(estimator: PhaseEstimator) -> Self {
        Self { estimator }
    }

    /// Phase offset in radians (0 for an empty signal)
    pub fn estimate(&self, signal: &ComplexBasebandSignal) -> f32 {
        if signal.is_empty() {
            return 0.0;
        }
        let n = signal.len() as f32;

        match self.estimator {
            PhaseEstimator::FirstMoment => {
                let mean = signal.samples.iter().sum::<Complex32>() / n;
                mean.arg()
            }
            PhaseEstimator::SquaredMoment => {
                let mean = signal.samples.iter().map(|z| z * z).sum::<Complex32>() / n;
                0.5 * mean.arg()
            }
        }
    }

    /// Decision waveform Re(z * e^{-i phi}) and the phase that was removed
    pub fn align(&self, signal: &ComplexBasebandSignal) -> (Vec<f32>, f32) {
        let phi = self.estimate(signal);
        let rotation = Complex32::from_polar(1.0, -phi);
        let aligned = signal.samples.iter().map(|z| (z * rotation).re).collect();

        log::debug!("{:?} phase estimate {:.4} rad", self.estimator, phi);
        (aligned, phi)
    }
}

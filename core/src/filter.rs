use num_complex::Complex64;
use std::f64::consts::PI;

/// Second-order section coefficients
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    pub fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    /// Numerator then denominator, a0 included (always 1)
    pub fn coefficients(&self) -> [f64; 6] {
        [self.b0, self.b1, self.b2, 1.0, self.a1, self.a2]
    }

    /// Roots of z^2 + a1*z + a2 (a first-order section reports a pole at the origin)
    pub fn poles(&self) -> [Complex64; 2] {
        let disc = Complex64::new(self.a1 * self.a1 - 4.0 * self.a2, 0.0).sqrt();
        let a1 = Complex64::new(self.a1, 0.0);
        [(-a1 + disc) * 0.5, (-a1 - disc) * 0.5]
    }

    pub fn is_stable(&self) -> bool {
        self.poles().iter().all(|p| p.norm() < 1.0)
    }

    /// Complex response at the normalised angular frequency `omega` (rad/sample)
    pub fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = 1.0 + z1 * self.a1 + z2 * self.a2;
        num / den
    }

    // Transposed direct form II
    #[inline]
    fn process(&self, x: f64, state: &mut [f64; 2]) -> f64 {
        let y = self.b0 * x + state[0];
        state[0] = self.b1 * x - self.a1 * y + state[1];
        state[1] = self.b2 * x - self.a2 * y;
        y
    }
}

/// Cascade of biquads designed for one sample rate
///
/// Immutable once built; the two-sample delay line of every section lives in
/// [`FilterState`] so one realization can be shared by any number of callers.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterRealization {
    sections: Vec<Biquad>,
    sample_rate: u32,
}

/// Per-section delay lines for one pass over a [`FilterRealization`]
#[derive(Clone, Debug, PartialEq)]
pub struct FilterState {
    delays: Vec<[f64; 2]>,
}

impl FilterState {
    pub fn new(realization: &FilterRealization) -> Self {
        Self {
            delays: vec![[0.0; 2]; realization.sections.len()],
        }
    }

    pub fn reset(&mut self) {
        for d in &mut self.delays {
            *d = [0.0; 2];
        }
    }
}

impl FilterRealization {
    pub fn new(sections: Vec<Biquad>, sample_rate: u32) -> Self {
        Self {
            sections,
            sample_rate,
        }
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Filter a whole buffer from rest; output has the input's length
    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        let mut state = FilterState::new(self);
        self.apply_with_state(input, &mut state)
    }

    /// Filter continuing from `state`, which is left ready for the next block
    pub fn apply_with_state(&self, input: &[f32], state: &mut FilterState) -> Vec<f32> {
        if state.delays.len() != self.sections.len() {
            *state = FilterState::new(self);
        }

        input
            .iter()
            .map(|&x| {
                let mut acc = x as f64;
                for (section, delay) in self.sections.iter().zip(state.delays.iter_mut()) {
                    acc = section.process(acc, delay);
                }
                acc as f32
            })
            .collect()
    }

    /// Complex frequency response of the cascade at `freq_hz`
    pub fn response(&self, freq_hz: f64) -> Complex64 {
        let omega = 2.0 * PI * freq_hz / self.sample_rate as f64;
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(omega))
    }

    /// Gain at `freq_hz` in dB (floored at -300 dB)
    pub fn magnitude_db(&self, freq_hz: f64) -> f64 {
        20.0 * self.response(freq_hz).norm().max(1e-15).log10()
    }

    pub fn poles(&self) -> Vec<Complex64> {
        self.sections.iter().flat_map(|s| s.poles()).collect()
    }

    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(Biquad::is_stable)
    }
}

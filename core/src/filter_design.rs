//! Filter design from band-edge templates
//!
//! A [`FilterSpec`] names passband/stopband edges plus the allowed passband
//! ripple and required stopband attenuation. [`design`] picks the minimum
//! order meeting both bounds, builds the analog prototype as zeros, poles and
//! gain, maps it through a lowpass or bandpass frequency transform and the
//! bilinear transform, and returns it as a cascade of biquads.
//!
//! # Families
//!
//! - Butterworth: maximally flat passband, monotonic response, exactly the
//!   requested ripple at the passband edge(s)
//! - Chebyshev type I: equiripple passband, lower order for the same template

use crate::error::{ModemError, Result};
use crate::filter::{Biquad, FilterRealization};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Highest analog prototype order accepted (bandpass doubles it)
const MAX_PROTOTYPE_ORDER: usize = 24;

/// Imaginary parts below this are treated as real roots when pairing
const REAL_ROOT_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FilterFamily {
    Butterworth,
    Chebyshev1,
}

/// Band edges in Hz
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum FilterBand {
    Lowpass {
        passband_edge: f64,
        stopband_edge: f64,
    },
    Bandpass {
        passband: [f64; 2],
        stopband: [f64; 2],
    },
}

/// Ripple/attenuation template for one filter
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterSpec {
    pub band: FilterBand,
    pub family: FilterFamily,
    /// Maximum passband loss in dB
    pub passband_ripple_db: f64,
    /// Minimum stopband loss in dB
    pub stopband_attenuation_db: f64,
    pub sample_rate: u32,
}

impl FilterSpec {
    pub fn lowpass(
        passband_edge: f64,
        stopband_edge: f64,
        passband_ripple_db: f64,
        stopband_attenuation_db: f64,
        sample_rate: u32,
    ) -> Self {
        Self {
            band: FilterBand::Lowpass {
                passband_edge,
                stopband_edge,
            },
            family: FilterFamily::Butterworth,
            passband_ripple_db,
            stopband_attenuation_db,
            sample_rate,
        }
    }

    pub fn bandpass(
        passband: [f64; 2],
        stopband: [f64; 2],
        passband_ripple_db: f64,
        stopband_attenuation_db: f64,
        sample_rate: u32,
    ) -> Self {
        Self {
            band: FilterBand::Bandpass { passband, stopband },
            family: FilterFamily::Butterworth,
            passband_ripple_db,
            stopband_attenuation_db,
            sample_rate,
        }
    }

    pub fn with_family(mut self, family: FilterFamily) -> Self {
        self.family = family;
        self
    }

    /// Edges in ascending order
    fn edges(&self) -> Vec<f64> {
        match self.band {
            FilterBand::Lowpass {
                passband_edge,
                stopband_edge,
            } => vec![passband_edge, stopband_edge],
            FilterBand::Bandpass { passband, stopband } => {
                vec![stopband[0], passband[0], passband[1], stopband[1]]
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(infeasible("sample rate must be positive"));
        }
        let nyquist = self.sample_rate as f64 / 2.0;

        if !(self.passband_ripple_db.is_finite() && self.passband_ripple_db > 0.0) {
            return Err(infeasible(format!(
                "passband ripple must be positive, got {} dB",
                self.passband_ripple_db
            )));
        }
        if !(self.stopband_attenuation_db.is_finite()
            && self.stopband_attenuation_db > self.passband_ripple_db)
        {
            return Err(infeasible(format!(
                "stopband attenuation {} dB must exceed passband ripple {} dB",
                self.stopband_attenuation_db, self.passband_ripple_db
            )));
        }

        let edges = self.edges();
        if let Some(bad) = edges
            .iter()
            .find(|f| !(f.is_finite() && **f > 0.0 && **f < nyquist))
        {
            return Err(infeasible(format!(
                "edge {} Hz outside (0, {}) Hz",
                bad, nyquist
            )));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(infeasible(format!(
                "stopband edges must lie strictly outside the passband, got {:?}",
                self.band
            )));
        }
        Ok(())
    }
}

fn infeasible(msg: impl Into<String>) -> ModemError {
    ModemError::SpecInfeasible(msg.into())
}

/// Zeros, poles and gain of a continuous- or discrete-time filter
#[derive(Debug, Clone)]
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

/// Design the lowest-order filter of `spec.family` meeting the template
pub fn design(spec: &FilterSpec) -> Result<FilterRealization> {
    spec.validate()?;

    let fs = spec.sample_rate as f64;
    let warp = |f: f64| 2.0 * fs * (PI * f / fs).tan();
    let ripple = 10f64.powf(spec.passband_ripple_db / 10.0) - 1.0;
    let attenuation = 10f64.powf(spec.stopband_attenuation_db / 10.0) - 1.0;
    let discrimination = attenuation / ripple;

    let selectivity = match spec.band {
        FilterBand::Lowpass {
            passband_edge,
            stopband_edge,
        } => warp(stopband_edge) / warp(passband_edge),
        FilterBand::Bandpass { passband, stopband } => {
            let (p1, p2) = (warp(passband[0]), warp(passband[1]));
            stopband
                .iter()
                .map(|&f| {
                    let s = warp(f);
                    ((s * s - p1 * p2) / (s * (p2 - p1))).abs()
                })
                .fold(f64::INFINITY, f64::min)
        }
    };

    let order = minimum_order(spec.family, selectivity, discrimination)?;
    let prototype = match spec.family {
        FilterFamily::Butterworth => butterworth_prototype(order),
        FilterFamily::Chebyshev1 => chebyshev1_prototype(order, spec.passband_ripple_db),
    };

    // Butterworth is scaled so the passband edge sees exactly the ripple bound
    let edge_scale = match spec.family {
        FilterFamily::Butterworth => ripple.powf(-1.0 / (2.0 * order as f64)),
        FilterFamily::Chebyshev1 => 1.0,
    };

    let (analog, reference_omega) = match spec.band {
        FilterBand::Lowpass { passband_edge, .. } => {
            let wo = warp(passband_edge) * edge_scale;
            (lowpass_to_lowpass(&prototype, wo), 0.0)
        }
        FilterBand::Bandpass { passband, .. } => {
            let (p1, p2) = (warp(passband[0]), warp(passband[1]));
            let wo = (p1 * p2).sqrt();
            let bw = (p2 - p1) * edge_scale;
            (
                lowpass_to_bandpass(&prototype, wo, bw),
                2.0 * (wo / (2.0 * fs)).atan(),
            )
        }
    };

    let digital = bilinear(&analog, fs);
    let sections = to_sections(&digital, reference_omega);

    if let Some(bad) = sections.iter().position(|s| !s.is_stable()) {
        return Err(infeasible(format!(
            "section {} of the order-{} realization is unstable",
            bad, order
        )));
    }

    log::debug!(
        "designed {:?} {:?}: prototype order {}, {} sections",
        spec.family,
        spec.band,
        order,
        sections.len()
    );

    Ok(FilterRealization::new(sections, spec.sample_rate))
}

fn minimum_order(family: FilterFamily, selectivity: f64, discrimination: f64) -> Result<usize> {
    if !(selectivity.is_finite() && selectivity > 1.0) {
        return Err(infeasible(format!(
            "transition band too narrow (selectivity {})",
            selectivity
        )));
    }

    let exact = match family {
        FilterFamily::Butterworth => discrimination.log10() / (2.0 * selectivity.log10()),
        FilterFamily::Chebyshev1 => discrimination.sqrt().acosh() / selectivity.acosh(),
    };
    if !exact.is_finite() {
        return Err(infeasible("order estimate diverged"));
    }

    let order = (exact.ceil() as usize).max(1);
    if order > MAX_PROTOTYPE_ORDER {
        return Err(infeasible(format!(
            "template needs order {} (limit {})",
            order, MAX_PROTOTYPE_ORDER
        )));
    }
    Ok(order)
}

/// Angles symmetric about the negative real axis, one per pole
fn prototype_angles(order: usize) -> impl Iterator<Item = f64> {
    let n = order as i64;
    (0..n).map(move |i| {
        let m = -n + 1 + 2 * i;
        PI * m as f64 / (2.0 * n as f64)
    })
}

fn butterworth_prototype(order: usize) -> Zpk {
    Zpk {
        zeros: Vec::new(),
        poles: prototype_angles(order)
            .map(|theta| -Complex64::from_polar(1.0, theta))
            .collect(),
        gain: 1.0,
    }
}

fn chebyshev1_prototype(order: usize, ripple_db: f64) -> Zpk {
    let eps = (10f64.powf(ripple_db / 10.0) - 1.0).sqrt();
    let mu = (1.0 / eps).asinh() / order as f64;

    let poles: Vec<Complex64> = prototype_angles(order)
        .map(|theta| -Complex64::new(mu, theta).sinh())
        .collect();

    let mut gain = poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, p| acc * -*p)
        .re;
    if order % 2 == 0 {
        gain /= (1.0 + eps * eps).sqrt();
    }

    Zpk {
        zeros: Vec::new(),
        poles,
        gain,
    }
}

fn lowpass_to_lowpass(proto: &Zpk, wo: f64) -> Zpk {
    let degree = proto.poles.len() - proto.zeros.len();
    Zpk {
        zeros: proto.zeros.iter().map(|z| *z * wo).collect(),
        poles: proto.poles.iter().map(|p| *p * wo).collect(),
        gain: proto.gain * wo.powi(degree as i32),
    }
}

fn lowpass_to_bandpass(proto: &Zpk, wo: f64, bw: f64) -> Zpk {
    let degree = proto.poles.len() - proto.zeros.len();
    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        roots
            .iter()
            .flat_map(|r| {
                let scaled = *r * (bw / 2.0);
                let offset = (scaled * scaled - wo * wo).sqrt();
                [scaled + offset, scaled - offset]
            })
            .collect()
    };

    let mut zeros = split(&proto.zeros);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: split(&proto.poles),
        gain: proto.gain * bw.powi(degree as i32),
    }
}

fn bilinear(analog: &Zpk, fs: f64) -> Zpk {
    let fs2 = 2.0 * fs;
    let degree = analog.poles.len() - analog.zeros.len();
    let map = |s: &Complex64| (fs2 + *s) / (fs2 - *s);

    let mut zeros: Vec<Complex64> = analog.zeros.iter().map(map).collect();
    zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));

    let num = analog
        .zeros
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, z| acc * (fs2 - *z));
    let den = analog
        .poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, p| acc * (fs2 - *p));

    Zpk {
        zeros,
        poles: analog.poles.iter().map(map).collect(),
        gain: analog.gain * (num / den).re,
    }
}

/// A conjugate pair, two real roots, or one real root
type RootGroup = (Complex64, Option<Complex64>);

fn group_roots(roots: &[Complex64]) -> Vec<RootGroup> {
    let mut groups: Vec<RootGroup> = roots
        .iter()
        .filter(|r| r.im > REAL_ROOT_TOLERANCE)
        .map(|r| (*r, Some(r.conj())))
        .collect();

    let mut reals: Vec<f64> = roots
        .iter()
        .filter(|r| r.im.abs() <= REAL_ROOT_TOLERANCE)
        .map(|r| r.re)
        .collect();
    reals.sort_by(|a, b| a.total_cmp(b));

    // Pairing from opposite ends turns the bandpass zeros at +1 and -1 into
    // (1 - z^-2) numerators instead of stacking like zeros in one section
    let (mut lo, mut hi) = (0usize, reals.len());
    while lo < hi {
        hi -= 1;
        let first = Complex64::new(reals[lo], 0.0);
        if lo == hi {
            groups.push((first, None));
        } else {
            groups.push((first, Some(Complex64::new(reals[hi], 0.0))));
        }
        lo += 1;
    }
    groups
}

fn polynomial(group: Option<&RootGroup>) -> [f64; 3] {
    match group {
        Some((r1, Some(r2))) => [1.0, -(*r1 + *r2).re, (*r1 * *r2).re],
        Some((r, None)) => [1.0, -r.re, 0.0],
        None => [1.0, 0.0, 0.0],
    }
}

fn to_sections(zpk: &Zpk, reference_omega: f64) -> Vec<Biquad> {
    let mut pole_groups = group_roots(&zpk.poles);
    // Poles nearest the unit circle go last
    pole_groups.sort_by(|a, b| {
        let ra = a.1.map_or(a.0.norm(), |p| a.0.norm().max(p.norm()));
        let rb = b.1.map_or(b.0.norm(), |p| b.0.norm().max(p.norm()));
        ra.total_cmp(&rb)
    });
    let mut zero_groups = group_roots(&zpk.zeros);

    let mut sections: Vec<Biquad> = pole_groups
        .iter()
        .map(|poles| {
            let wants_single = poles.1.is_none();
            let pick = zero_groups
                .iter()
                .enumerate()
                .filter(|(_, z)| z.1.is_none() == wants_single)
                .min_by(|(_, a), (_, b)| {
                    (a.0 - poles.0).norm().total_cmp(&(b.0 - poles.0).norm())
                })
                .map(|(i, _)| i)
                .or_else(|| {
                    zero_groups
                        .iter()
                        .enumerate()
                        .min_by(|(_, a), (_, b)| {
                            (a.0 - poles.0).norm().total_cmp(&(b.0 - poles.0).norm())
                        })
                        .map(|(i, _)| i)
                });
            let zeros = pick.map(|i| zero_groups.remove(i));

            let b = polynomial(zeros.as_ref());
            let a = polynomial(Some(poles));
            Biquad::new(b[0], b[1], b[2], a[1], a[2])
        })
        .collect();

    // Unit gain per section at the reference frequency, total gain on the first
    let mut total = zpk.gain;
    for section in &mut sections {
        let magnitude = section.response(reference_omega).norm();
        if magnitude > 1e-12 {
            section.b0 /= magnitude;
            section.b1 /= magnitude;
            section.b2 /= magnitude;
            total *= magnitude;
        }
    }
    if let Some(first) = sections.first_mut() {
        first.b0 *= total;
        first.b1 *= total;
        first.b2 *= total;
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_butterworth_prototype_poles_on_unit_circle() {
        let proto = butterworth_prototype(5);
        assert_eq!(proto.poles.len(), 5);
        for p in &proto.poles {
            assert!((p.norm() - 1.0).abs() < 1e-12);
            assert!(p.re < 0.0);
        }
    }

    #[test]
    fn test_chebyshev_prototype_dc_gain() {
        // Odd order: unity at DC. Even order: sits at the ripple floor
        for (order, expected_db) in [(3usize, 0.0), (4, -1.0)] {
            let proto = chebyshev1_prototype(order, 1.0);
            let den = proto
                .poles
                .iter()
                .fold(Complex64::new(1.0, 0.0), |acc, p| acc * -*p);
            let dc = 20.0 * (proto.gain / den.norm()).log10();
            assert!((dc - expected_db).abs() < 1e-9, "order {}: {}", order, dc);
        }
    }

    #[test]
    fn test_minimum_order_butterworth() {
        // Classic textbook: 1 dB / 40 dB with ws/wp = 5 needs order 4
        let g = (1e4 - 1.0) / (10f64.powf(0.1) - 1.0);
        assert_eq!(minimum_order(FilterFamily::Butterworth, 5.0, g).unwrap(), 4);
    }

    #[test]
    fn test_group_roots_pairs_conjugates_and_reals() {
        let roots = vec![
            Complex64::new(0.5, 0.5),
            Complex64::new(0.5, -0.5),
            Complex64::new(1.0, 0.0),
            Complex64::new(-1.0, 0.0),
            Complex64::new(-1.0, 0.0),
        ];
        let groups = group_roots(&roots);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups.iter().filter(|g| g.1.is_none()).count(), 1);
    }

    #[test]
    fn test_rejects_overlapping_edges() {
        let spec = FilterSpec::bandpass([2425.0, 2575.0], [2500.0, 2700.0], 1.0, 40.0, 20000);
        assert!(matches!(design(&spec), Err(ModemError::SpecInfeasible(_))));
    }

    #[test]
    fn test_rejects_contradictory_bounds() {
        let spec = FilterSpec::lowpass(100.0, 500.0, 40.0, 1.0, 20000);
        assert!(matches!(design(&spec), Err(ModemError::SpecInfeasible(_))));
    }

    #[test]
    fn test_rejects_edges_beyond_nyquist() {
        let spec = FilterSpec::lowpass(100.0, 12000.0, 1.0, 40.0, 20000);
        assert!(matches!(design(&spec), Err(ModemError::SpecInfeasible(_))));
    }

    #[test]
    fn test_rejects_excessive_order() {
        let spec = FilterSpec::lowpass(1000.0, 1001.0, 0.01, 120.0, 20000);
        assert!(matches!(design(&spec), Err(ModemError::SpecInfeasible(_))));
    }
}

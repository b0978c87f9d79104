use crate::error::{ModemError, Result};
use crate::filter_design::{FilterBand, FilterSpec};
use crate::frame::FrameDetectorConfig;
use crate::phase::PhaseEstimator;
use crate::timing::TimingConfig;
use crate::{
    BANDPASS_PASSBAND_HZ, BANDPASS_STOPBAND_HZ, BIT_DURATION_SECS, CARRIER_AMPLITUDE,
    CARRIER_FREQUENCY_HZ, LOWPASS_PASSBAND_HZ, LOWPASS_STOPBAND_HZ, PASSBAND_RIPPLE_DB,
    SAMPLE_RATE, STOPBAND_ATTENUATION_DB,
};

/// Carrier must stay below this fraction of Nyquist
const NYQUIST_GUARD_FRACTION: f32 = 0.8;

/// Operating constants of one acoustic link
///
/// Built once at startup and handed by reference to every stage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkParameters {
    pub sample_rate: u32,
    pub carrier_frequency: f32,
    /// Seconds per bit
    pub bit_duration: f32,
    pub carrier_amplitude: f32,
    /// Channel selection (receive) and spectral containment (transmit)
    pub bandpass: FilterSpec,
    /// Baseband extraction after I/Q mixing
    pub lowpass: FilterSpec,
}

impl Default for LinkParameters {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            carrier_frequency: CARRIER_FREQUENCY_HZ,
            bit_duration: BIT_DURATION_SECS,
            carrier_amplitude: CARRIER_AMPLITUDE,
            bandpass: FilterSpec::bandpass(
                BANDPASS_PASSBAND_HZ,
                BANDPASS_STOPBAND_HZ,
                PASSBAND_RIPPLE_DB,
                STOPBAND_ATTENUATION_DB,
                SAMPLE_RATE,
            ),
            lowpass: FilterSpec::lowpass(
                LOWPASS_PASSBAND_HZ,
                LOWPASS_STOPBAND_HZ,
                PASSBAND_RIPPLE_DB,
                STOPBAND_ATTENUATION_DB,
                SAMPLE_RATE,
            ),
        }
    }
}

impl LinkParameters {
    pub fn sample_interval(&self) -> f32 {
        1.0 / self.sample_rate as f32
    }

    /// Samples per bit, Ns = round(Tb * fs)
    pub fn samples_per_bit(&self) -> usize {
        (self.bit_duration * self.sample_rate as f32).round() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(config_error("sample rate must be positive"));
        }
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(config_error(format!("{} must be positive, got {}", name, v)))
            }
        };
        positive("carrier frequency", self.carrier_frequency)?;
        positive("bit duration", self.bit_duration)?;
        positive("carrier amplitude", self.carrier_amplitude)?;

        let nyquist = self.sample_rate as f32 / 2.0;
        if self.carrier_frequency > NYQUIST_GUARD_FRACTION * nyquist {
            return Err(config_error(format!(
                "carrier {} Hz leaves no guard band below Nyquist {} Hz",
                self.carrier_frequency, nyquist
            )));
        }
        if self.samples_per_bit() < 2 {
            return Err(config_error(format!(
                "bit duration {} s gives fewer than 2 samples per bit",
                self.bit_duration
            )));
        }

        for (name, spec) in [("bandpass", &self.bandpass), ("lowpass", &self.lowpass)] {
            if spec.sample_rate != self.sample_rate {
                return Err(config_error(format!(
                    "{} template designed for {} Hz but link runs at {} Hz",
                    name, spec.sample_rate, self.sample_rate
                )));
            }
        }
        match self.bandpass.band {
            FilterBand::Bandpass { passband, .. } => {
                let fc = self.carrier_frequency as f64;
                if fc < passband[0] || fc > passband[1] {
                    return Err(config_error(format!(
                        "carrier {} Hz outside bandpass passband {:?}",
                        fc, passband
                    )));
                }
            }
            FilterBand::Lowpass { .. } => {
                return Err(config_error("channel filter template must be a bandpass"));
            }
        }
        if !matches!(self.lowpass.band, FilterBand::Lowpass { .. }) {
            return Err(config_error("baseband filter template must be a lowpass"));
        }
        Ok(())
    }
}

/// Receive-side strategy selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiverConfig {
    pub frame: FrameDetectorConfig,
    pub phase: PhaseEstimator,
    pub timing: TimingConfig,
}

fn config_error(msg: impl Into<String>) -> ModemError {
    ModemError::Configuration(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_link_is_valid() {
        let link = LinkParameters::default();
        link.validate().unwrap();
        assert_eq!(link.samples_per_bit(), 800);
        assert!((link.sample_interval() - 1.0 / 20000.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let mut link = LinkParameters::default();
        link.bit_duration = 0.0;
        assert!(matches!(link.validate(), Err(ModemError::Configuration(_))));

        let mut link = LinkParameters::default();
        link.carrier_frequency = -10.0;
        assert!(matches!(link.validate(), Err(ModemError::Configuration(_))));

        let mut link = LinkParameters::default();
        link.carrier_amplitude = 0.0;
        assert!(matches!(link.validate(), Err(ModemError::Configuration(_))));
    }

    #[test]
    fn test_rejects_carrier_near_nyquist() {
        let mut link = LinkParameters::default();
        link.carrier_frequency = 9500.0;
        assert!(matches!(link.validate(), Err(ModemError::Configuration(_))));
    }

    #[test]
    fn test_rejects_mismatched_template_rate() {
        let mut link = LinkParameters::default();
        link.lowpass.sample_rate = 44100;
        assert!(matches!(link.validate(), Err(ModemError::Configuration(_))));
    }

    #[test]
    fn test_rejects_carrier_outside_passband() {
        let mut link = LinkParameters::default();
        link.carrier_frequency = 3000.0;
        assert!(matches!(link.validate(), Err(ModemError::Configuration(_))));
    }
}

use crate::error::{ModemError, Result};
use crate::signal::ComplexBasebandSignal;

/// Default threshold as a fraction of the envelope peak
pub const DEFAULT_THRESHOLD_FRACTION: f32 = 0.1;

/// Default margin kept around the detected frame (5 ms)
pub const DEFAULT_MARGIN_SECS: f32 = 0.005;

/// Default search window for [`FrameTrim::LeadingEdge`]
pub const DEFAULT_WINDOW_SECS: f32 = 6.0;

/// How the active part of a capture is cut out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameTrim {
    /// First to last sample above threshold, widened by a margin on both sides
    DetectedInterval { margin_secs: f32 },
    /// Only the first `window_secs` are searched; everything before the
    /// first sample above threshold is dropped and the tail is kept
    LeadingEdge { window_secs: f32 },
}

impl Default for FrameTrim {
    fn default() -> Self {
        FrameTrim::DetectedInterval {
            margin_secs: DEFAULT_MARGIN_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDetectorConfig {
    /// Fraction of max |z| a sample must exceed, in (0, 1)
    pub threshold_fraction: f32,
    pub trim: FrameTrim,
}

impl Default for FrameDetectorConfig {
    fn default() -> Self {
        Self {
            threshold_fraction: DEFAULT_THRESHOLD_FRACTION,
            trim: FrameTrim::default(),
        }
    }
}

impl FrameDetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold_fraction > 0.0 && self.threshold_fraction < 1.0) {
            return Err(ModemError::Configuration(format!(
                "threshold fraction {} not in (0, 1)",
                self.threshold_fraction
            )));
        }
        let secs = match self.trim {
            FrameTrim::DetectedInterval { margin_secs } => margin_secs,
            FrameTrim::LeadingEdge { window_secs } => window_secs,
        };
        if !(secs.is_finite() && secs >= 0.0) {
            return Err(ModemError::Configuration(format!(
                "frame trim duration {} s must be non-negative",
                secs
            )));
        }
        Ok(())
    }
}

/// Half-open sample range `[start, end)` of the detected frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpan {
    pub start: usize,
    pub end: usize,
}

impl FrameSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Energy-threshold frame locator
pub struct FrameDetector {
    config: FrameDetectorConfig,
}

impl FrameDetector {
    pub fn new(config: FrameDetectorConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, signal: &ComplexBasebandSignal) -> Result<FrameSpan> {
        let rate = signal.sample_rate as f32;
        let magnitude = signal.magnitude();

        let search_len = match self.config.trim {
            FrameTrim::LeadingEdge { window_secs } => {
                ((window_secs * rate) as usize).min(magnitude.len())
            }
            FrameTrim::DetectedInterval { .. } => magnitude.len(),
        };
        let window = &magnitude[..search_len];

        let peak = window.iter().copied().fold(0.0f32, f32::max);
        let threshold = self.config.threshold_fraction * peak;

        let first = window.iter().position(|&m| m > threshold);
        let last = window.iter().rposition(|&m| m > threshold);
        let (first, last) = match (first, last) {
            (Some(first), Some(last)) if peak > 0.0 => (first, last),
            _ => {
                log::debug!(
                    "no sample above threshold {:.3e} in {} samples",
                    threshold,
                    search_len
                );
                return Err(ModemError::NoSignalDetected);
            }
        };

        let span = match self.config.trim {
            FrameTrim::DetectedInterval { margin_secs } => {
                let margin = (margin_secs * rate).round() as usize;
                FrameSpan {
                    start: first.saturating_sub(margin),
                    end: (last + 1 + margin).min(magnitude.len()),
                }
            }
            FrameTrim::LeadingEdge { .. } => FrameSpan {
                start: first,
                end: search_len,
            },
        };

        log::debug!(
            "frame detected at samples {}..{} (peak {:.3e}, threshold {:.3e})",
            span.start,
            span.end,
            peak,
            threshold
        );
        Ok(span)
    }

    pub fn trim(&self, signal: &ComplexBasebandSignal) -> Result<ComplexBasebandSignal> {
        let span = self.detect(signal)?;
        Ok(ComplexBasebandSignal::new(
            signal.samples[span.start..span.end].to_vec(),
            signal.sample_rate,
        ))
    }
}

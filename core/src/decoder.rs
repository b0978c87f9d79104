use crate::codec::{AsciiCodec, SymbolCodec};
use crate::config::{LinkParameters, ReceiverConfig};
use crate::demod::QuadratureDemodulator;
use crate::error::Result;
use crate::filter::FilterRealization;
use crate::filter_design::design;
use crate::frame::{FrameDetector, FrameSpan};
use crate::phase::PhaseSynchronizer;
use crate::resample::resample;
use crate::signal::{BitStream, ComplexBasebandSignal, SampleBuffer};
use crate::timing::TimingRecovery;

/// Result of one receive pass
#[derive(Debug, Clone, PartialEq)]
pub struct Reception {
    /// Decoded text, empty when no timing candidate decoded
    pub text: String,
    pub bits: BitStream,
    /// Printable characters in `text`
    pub score: usize,
    /// Winning timing offset within the trimmed frame
    pub offset: Option<usize>,
    /// Whether the winning reading used the negated decision waveform
    pub inverted: bool,
    /// Carrier phase removed before slicing, in radians
    pub phase: f32,
    /// Trimmed frame in samples of the link-rate capture
    pub frame: FrameSpan,
}

/// Phase-aligned in-phase waveform of the detected frame
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionWaveform {
    pub samples: Vec<f32>,
    pub phase: f32,
    pub frame: FrameSpan,
}

pub struct Decoder {
    link: LinkParameters,
    codec: Box<dyn SymbolCodec>,
    bandpass: FilterRealization,
    lowpass: FilterRealization,
    frame: FrameDetector,
    phase: PhaseSynchronizer,
    timing: TimingRecovery,
}

impl Decoder {
    pub fn new(link: LinkParameters, config: ReceiverConfig) -> Result<Self> {
        Self::with_codec(link, config, Box::new(AsciiCodec))
    }

    pub fn with_codec(
        link: LinkParameters,
        config: ReceiverConfig,
        codec: Box<dyn SymbolCodec>,
    ) -> Result<Self> {
        link.validate()?;
        config.frame.validate()?;

        let bandpass = design(&link.bandpass)?;
        let lowpass = design(&link.lowpass)?;
        log::debug!(
            "receive filters: bandpass {} sections, lowpass {} sections",
            bandpass.sections().len(),
            lowpass.sections().len()
        );

        let timing = TimingRecovery::new(link.bit_duration, link.sample_rate, config.timing)?;

        Ok(Self {
            link,
            codec,
            bandpass,
            lowpass,
            frame: FrameDetector::new(config.frame),
            phase: PhaseSynchronizer::new(config.phase),
            timing,
        })
    }

    pub fn link(&self) -> &LinkParameters {
        &self.link
    }

    pub fn timing(&self) -> &TimingRecovery {
        &self.timing
    }

    /// Bring a capture to the link rate and append one bit period of silence
    ///
    /// A recording that stops right at the end of the burst still needs the
    /// receive filters to ring out, otherwise the last mid-bit decision falls
    /// past the end of the buffer.
    fn condition(&self, capture: &SampleBuffer) -> Result<SampleBuffer> {
        let mut conditioned = if capture.sample_rate == self.link.sample_rate {
            capture.clone()
        } else {
            log::warn!(
                "capture at {} Hz, resampling to link rate {} Hz",
                capture.sample_rate,
                self.link.sample_rate
            );
            resample(capture, self.link.sample_rate)?
        };
        conditioned
            .samples
            .extend(std::iter::repeat(0.0).take(self.link.samples_per_bit()));
        Ok(conditioned)
    }

    /// Bandpass, I/Q demodulation, frame trim and phase alignment
    pub fn decision_waveform(&self, capture: &SampleBuffer) -> Result<DecisionWaveform> {
        let capture = self.condition(capture)?;

        let filtered = SampleBuffer::new(self.bandpass.apply(&capture.samples), capture.sample_rate);
        let baseband = QuadratureDemodulator::new(self.link.carrier_frequency, &self.lowpass)
            .demodulate(&filtered);

        let frame = self.frame.detect(&baseband)?;
        let trimmed = ComplexBasebandSignal::new(
            baseband.samples[frame.start..frame.end].to_vec(),
            baseband.sample_rate,
        );
        let (samples, phase) = self.phase.align(&trimmed);

        Ok(DecisionWaveform {
            samples,
            phase,
            frame,
        })
    }

    /// Run the full receive chain on a mono capture
    pub fn decode(&self, capture: &SampleBuffer) -> Result<Reception> {
        let waveform = self.decision_waveform(capture)?;
        let outcome = self.timing.recover(&waveform.samples, self.codec.as_ref());

        Ok(Reception {
            text: outcome.text,
            bits: outcome.bits,
            score: outcome.score,
            offset: outcome.offset,
            inverted: outcome.inverted,
            phase: waveform.phase,
            frame: waveform.frame,
        })
    }
}

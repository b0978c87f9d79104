//! Blind symbol timing recovery
//!
//! Without a shared clock the receiver does not know where bit periods start
//! inside the trimmed frame. Every candidate offset within one bit period is
//! sliced at mid-bit, decoded, and scored by how much printable text comes
//! out; the best-scoring candidate wins, lowest offset first on ties.

use crate::codec::{printable_score, SymbolCodec};
use crate::error::{ModemError, Result};
use crate::signal::BitStream;

/// Offsets tried per bit period when no stride is configured
const DEFAULT_OFFSETS_PER_BIT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Step between candidate offsets in samples; `None` picks Ns/16
    pub stride: Option<usize>,
    /// Also try the negated decision waveform (BPSK pi ambiguity)
    pub resolve_polarity: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            stride: None,
            resolve_polarity: true,
        }
    }
}

/// Outcome of slicing and decoding at one offset and polarity
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Decoded {
        offset: usize,
        inverted: bool,
        bits: BitStream,
        text: String,
        score: usize,
    },
    Rejected {
        offset: usize,
        inverted: bool,
        reason: String,
    },
}

/// Best candidate, or the empty outcome when nothing decoded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingOutcome {
    pub text: String,
    pub bits: BitStream,
    pub score: usize,
    /// Winning offset in samples from the start of the waveform
    pub offset: Option<usize>,
    pub inverted: bool,
}

impl TimingOutcome {
    pub fn is_empty(&self) -> bool {
        self.offset.is_none()
    }
}

pub struct TimingRecovery {
    samples_per_bit: usize,
    stride: usize,
    resolve_polarity: bool,
}

impl TimingRecovery {
    pub fn new(bit_duration: f32, sample_rate: u32, config: TimingConfig) -> Result<Self> {
        let samples_per_bit = (bit_duration * sample_rate as f32).round() as usize;
        if samples_per_bit == 0 {
            return Err(ModemError::Configuration(format!(
                "bit duration {} s is shorter than one sample at {} Hz",
                bit_duration, sample_rate
            )));
        }

        let stride = config
            .stride
            .unwrap_or(samples_per_bit / DEFAULT_OFFSETS_PER_BIT)
            .max(1);
        if stride > samples_per_bit {
            return Err(ModemError::Configuration(format!(
                "timing stride {} exceeds the {}-sample bit period",
                stride, samples_per_bit
            )));
        }

        Ok(Self {
            samples_per_bit,
            stride,
            resolve_polarity: config.resolve_polarity,
        })
    }

    pub fn samples_per_bit(&self) -> usize {
        self.samples_per_bit
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Sign decisions at `offset + k*Ns + Ns/2`; empty when no full bit fits
    pub fn slice(&self, waveform: &[f32], offset: usize) -> BitStream {
        let ns = self.samples_per_bit;
        let nbits = waveform.len().saturating_sub(offset) / ns;
        (0..nbits)
            .map(|k| waveform[offset + k * ns + ns / 2] > 0.0)
            .collect::<Vec<_>>()
            .into()
    }

    fn evaluate(
        &self,
        waveform: &[f32],
        offset: usize,
        inverted: bool,
        codec: &dyn SymbolCodec,
    ) -> Candidate {
        let bits = self.slice(waveform, offset);
        let bits = if inverted { bits.complement() } else { bits };
        if bits.is_empty() {
            return Candidate::Rejected {
                offset,
                inverted,
                reason: "no complete bit period".to_string(),
            };
        }

        match codec.decode(&bits) {
            Ok(text) => Candidate::Decoded {
                offset,
                inverted,
                score: printable_score(&text),
                bits,
                text,
            },
            Err(e) => Candidate::Rejected {
                offset,
                inverted,
                reason: e.to_string(),
            },
        }
    }

    /// Every candidate in evaluation order: ascending offset, upright before inverted
    pub fn candidates(&self, waveform: &[f32], codec: &dyn SymbolCodec) -> Vec<Candidate> {
        let polarities: &[bool] = if self.resolve_polarity {
            &[false, true]
        } else {
            &[false]
        };

        (0..self.samples_per_bit)
            .step_by(self.stride)
            .flat_map(|offset| {
                polarities
                    .iter()
                    .map(move |&inverted| (offset, inverted))
            })
            .map(|(offset, inverted)| self.evaluate(waveform, offset, inverted, codec))
            .collect()
    }

    pub fn recover(&self, waveform: &[f32], codec: &dyn SymbolCodec) -> TimingOutcome {
        let outcome = self
            .candidates(waveform, codec)
            .into_iter()
            .fold(TimingOutcome::default(), |best, candidate| match candidate {
                Candidate::Decoded {
                    offset,
                    inverted,
                    bits,
                    text,
                    score,
                } => {
                    log::trace!(
                        "offset {} inverted {}: score {} ({} bits)",
                        offset,
                        inverted,
                        score,
                        bits.len()
                    );
                    // Strictly greater keeps the earliest candidate on ties
                    if best.is_empty() || score > best.score {
                        TimingOutcome {
                            text,
                            bits,
                            score,
                            offset: Some(offset),
                            inverted,
                        }
                    } else {
                        best
                    }
                }
                Candidate::Rejected {
                    offset,
                    inverted,
                    reason,
                } => {
                    log::trace!("offset {} inverted {} rejected: {}", offset, inverted, reason);
                    best
                }
            });

        match outcome.offset {
            Some(offset) => log::info!(
                "timing recovered at offset {} (inverted: {}), score {}, {} bits",
                offset,
                outcome.inverted,
                outcome.score,
                outcome.bits.len()
            ),
            None => log::warn!(
                "no timing offset decoded ({} samples, {} per bit)",
                waveform.len(),
                self.samples_per_bit
            ),
        }
        outcome
    }
}

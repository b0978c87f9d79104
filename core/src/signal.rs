use crate::error::{ModemError, Result};
use num_complex::Complex32;
use std::fmt;
use std::str::FromStr;

/// Real-valued samples tagged with the rate they were taken at
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Negated copy, used to model a polarity-inverted channel
    pub fn inverted(&self) -> Self {
        Self::new(self.samples.iter().map(|s| -s).collect(), self.sample_rate)
    }
}

/// I/Q baseband samples produced by the quadrature demodulator
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexBasebandSignal {
    pub samples: Vec<Complex32>,
    pub sample_rate: u32,
}

impl ComplexBasebandSignal {
    pub fn new(samples: Vec<Complex32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Magnitude envelope |z[n]|
    pub fn magnitude(&self) -> Vec<f32> {
        self.samples.iter().map(|z| z.norm()).collect()
    }
}

/// One binary decision per bit period
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitStream(Vec<bool>);

impl BitStream {
    pub fn new(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn into_bits(self) -> Vec<bool> {
        self.0
    }

    pub fn complement(&self) -> Self {
        Self(self.0.iter().map(|b| !b).collect())
    }
}

impl From<Vec<bool>> for BitStream {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

/// Parses a string of '0'/'1' characters (whitespace ignored)
impl FromStr for BitStream {
    type Err = ModemError;

    fn from_str(s: &str) -> Result<Self> {
        let mut bits = Vec::with_capacity(s.len());
        for (i, c) in s.chars().enumerate() {
            match c {
                '0' => bits.push(false),
                '1' => bits.push(true),
                c if c.is_whitespace() => {}
                other => {
                    return Err(ModemError::InvalidMessage(format!(
                        "unexpected character {:?} at position {} in bit string",
                        other, i
                    )))
                }
            }
        }
        if bits.is_empty() {
            return Err(ModemError::InvalidMessage("empty bit string".to_string()));
        }
        Ok(Self(bits))
    }
}

impl fmt::Display for BitStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_string_parse_and_display() {
        let bits: BitStream = "0100 1000".parse().unwrap();
        assert_eq!(bits.len(), 8);
        assert_eq!(bits.to_string(), "01001000");
    }

    #[test]
    fn test_bit_string_rejects_garbage() {
        assert!("01201".parse::<BitStream>().is_err());
        assert!("   ".parse::<BitStream>().is_err());
    }

    #[test]
    fn test_complement() {
        let bits = BitStream::new(vec![true, false, false]);
        assert_eq!(bits.complement().bits(), &[false, true, true]);
    }

    #[test]
    fn test_duration() {
        let buffer = SampleBuffer::new(vec![0.0; 20000], 20000);
        assert!((buffer.duration() - 1.0).abs() < 1e-6);
    }
}

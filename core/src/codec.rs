//! Text and baseband collaborators of the signal chain
//!
//! The modem itself only moves bits; turning text into bits and bits into a
//! rectangular baseband waveform happens behind these two traits so the
//! framing can be swapped without touching the DSP.

use crate::error::{ModemError, Result};
use crate::signal::{BitStream, SampleBuffer};

/// Printable ASCII range used to score decoded text
pub const PRINTABLE: std::ops::RangeInclusive<char> = ' '..='~';

pub trait SymbolCodec {
    fn encode(&self, text: &str) -> Result<BitStream>;

    /// Fails with [`ModemError::DecodeFailure`] on undecodable input
    fn decode(&self, bits: &BitStream) -> Result<String>;
}

pub trait BasebandEncoder {
    fn encode(&self, bits: &BitStream, bit_duration: f32, sample_rate: u32) -> SampleBuffer;
}

/// 7-bit ASCII carried in 8-bit characters, most significant bit first
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiCodec;

impl SymbolCodec for AsciiCodec {
    fn encode(&self, text: &str) -> Result<BitStream> {
        if let Some(c) = text.chars().find(|c| !c.is_ascii()) {
            return Err(ModemError::InvalidMessage(format!(
                "character {:?} is not ASCII",
                c
            )));
        }

        let mut bits = Vec::with_capacity(text.len() * 8);
        for byte in text.bytes() {
            for i in (0..8).rev() {
                bits.push((byte >> i) & 1 == 1);
            }
        }
        Ok(BitStream::new(bits))
    }

    /// A trailing partial character is ignored
    fn decode(&self, bits: &BitStream) -> Result<String> {
        if bits.len() < 8 {
            return Err(ModemError::DecodeFailure(format!(
                "{} bits do not hold a single character",
                bits.len()
            )));
        }

        let mut text = String::with_capacity(bits.len() / 8);
        for (index, chunk) in bits.bits().chunks_exact(8).enumerate() {
            let byte = chunk
                .iter()
                .fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit));
            if !byte.is_ascii() {
                return Err(ModemError::DecodeFailure(format!(
                    "byte {:#04x} at character {} is not ASCII",
                    byte, index
                )));
            }
            text.push(byte as char);
        }
        Ok(text)
    }
}

/// Count of characters in the printable ASCII range
pub fn printable_score(text: &str) -> usize {
    text.chars().filter(|c| PRINTABLE.contains(c)).count()
}

/// Bipolar NRZ: 1 -> +1, 0 -> -1, each held for one bit period
#[derive(Debug, Clone, Copy, Default)]
pub struct RectangularEncoder;

impl BasebandEncoder for RectangularEncoder {
    fn encode(&self, bits: &BitStream, bit_duration: f32, sample_rate: u32) -> SampleBuffer {
        let samples_per_bit = (bit_duration * sample_rate as f32).round() as usize;
        let mut samples = Vec::with_capacity(bits.len() * samples_per_bit);
        for &bit in bits.bits() {
            let level = if bit { 1.0 } else { -1.0 };
            samples.extend(std::iter::repeat(level).take(samples_per_bit));
        }
        SampleBuffer::new(samples, sample_rate)
    }
}

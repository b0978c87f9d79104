use crate::codec::{AsciiCodec, BasebandEncoder, RectangularEncoder, SymbolCodec};
use crate::config::LinkParameters;
use crate::error::{ModemError, Result};
use crate::filter::FilterRealization;
use crate::filter_design::design;
use crate::modulator::CarrierModulator;
use crate::signal::{BitStream, SampleBuffer};

/// What goes over the air
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Text passed through the symbol codec
    Text(String),
    /// Raw bits, bypassing the codec
    Bits(BitStream),
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<BitStream> for Message {
    fn from(bits: BitStream) -> Self {
        Message::Bits(bits)
    }
}

pub struct Encoder {
    link: LinkParameters,
    codec: Box<dyn SymbolCodec>,
    baseband: Box<dyn BasebandEncoder>,
    modulator: CarrierModulator,
    bandpass: FilterRealization,
}

impl Encoder {
    pub fn new(link: LinkParameters) -> Result<Self> {
        Self::with_collaborators(link, Box::new(AsciiCodec), Box::new(RectangularEncoder))
    }

    /// Encoder with a custom text codec and baseband line code
    pub fn with_collaborators(
        link: LinkParameters,
        codec: Box<dyn SymbolCodec>,
        baseband: Box<dyn BasebandEncoder>,
    ) -> Result<Self> {
        link.validate()?;
        let bandpass = design(&link.bandpass)?;
        log::debug!(
            "transmit bandpass: {} sections",
            bandpass.sections().len()
        );

        Ok(Self {
            modulator: CarrierModulator::new(link.carrier_frequency, link.carrier_amplitude),
            link,
            codec,
            baseband,
            bandpass,
        })
    }

    pub fn link(&self) -> &LinkParameters {
        &self.link
    }

    /// Encode a message into band-limited carrier samples at the link rate
    /// Returns: bandpass(Ac * xb * sin(2*pi*fc*t))
    pub fn encode(&self, message: &Message) -> Result<SampleBuffer> {
        let bits = match message {
            Message::Text(text) => self.codec.encode(text)?,
            Message::Bits(bits) => bits.clone(),
        };
        if bits.is_empty() {
            return Err(ModemError::InvalidMessage("nothing to transmit".to_string()));
        }

        let xb = self
            .baseband
            .encode(&bits, self.link.bit_duration, self.link.sample_rate);
        let xm = self.modulator.modulate(&xb);
        let xt = self.bandpass.apply(&xm.samples);

        log::info!(
            "encoded {} bits into {} samples ({:.2} s)",
            bits.len(),
            xt.len(),
            xm.duration()
        );
        Ok(SampleBuffer::new(xt, self.link.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_length_follows_bit_count() {
        let encoder = Encoder::new(LinkParameters::default()).unwrap();
        let out = encoder.encode(&Message::from("Hi")).unwrap();
        assert_eq!(out.sample_rate, 20000);
        assert_eq!(out.len(), 16 * 800);
    }

    #[test]
    fn test_encode_bits_bypasses_codec() {
        let encoder = Encoder::new(LinkParameters::default()).unwrap();
        let bits: BitStream = "1011".parse().unwrap();
        let out = encoder.encode(&Message::from(bits)).unwrap();
        assert_eq!(out.len(), 4 * 800);
    }

    #[test]
    fn test_output_is_bounded_and_nonzero() {
        let encoder = Encoder::new(LinkParameters::default()).unwrap();
        let out = encoder.encode(&Message::from("Hello")).unwrap();
        let peak = out.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.3, "peak {}", peak);
        assert!(peak < 1.5, "peak {}", peak);
        assert!(out.samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_rejects_empty_and_non_ascii_messages() {
        let encoder = Encoder::new(LinkParameters::default()).unwrap();
        assert!(matches!(
            encoder.encode(&Message::from("")),
            Err(ModemError::InvalidMessage(_))
        ));
        assert!(matches!(
            encoder.encode(&Message::Text("\u{e9}".to_string())),
            Err(ModemError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_invalid_link_is_rejected_up_front() {
        let mut link = LinkParameters::default();
        link.carrier_frequency = 9000.0;
        assert!(matches!(
            Encoder::new(link),
            Err(ModemError::Configuration(_))
        ));
    }
}

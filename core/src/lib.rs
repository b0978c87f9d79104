//! Acoustic BPSK modem for short text messages over a speaker and microphone
//!
//! Single carrier, one bit per symbol, IIR channel and baseband filters
//! designed from attenuation templates, blind timing recovery

pub mod codec;
pub mod config;
pub mod decoder;
pub mod demod;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod filter_design;
pub mod frame;
pub mod modulator;
pub mod phase;
pub mod resample;
pub mod signal;
pub mod timing;

pub use codec::{AsciiCodec, BasebandEncoder, RectangularEncoder, SymbolCodec};
pub use config::{LinkParameters, ReceiverConfig};
pub use decoder::{Decoder, Reception};
pub use encoder::{Encoder, Message};
pub use error::{ModemError, Result};
pub use filter::FilterRealization;
pub use filter_design::{design, FilterBand, FilterFamily, FilterSpec};
pub use frame::{FrameDetectorConfig, FrameTrim};
pub use phase::PhaseEstimator;
pub use signal::{BitStream, SampleBuffer};
pub use timing::TimingConfig;

// Link configuration
pub const SAMPLE_RATE: u32 = 20000;
pub const CARRIER_FREQUENCY_HZ: f32 = 2500.0;
pub const BIT_DURATION_SECS: f32 = 0.04; // 25 bit/s, 800 samples per bit
pub const CARRIER_AMPLITUDE: f32 = 0.8;

// Channel bandpass template
pub const BANDPASS_PASSBAND_HZ: [f64; 2] = [2425.0, 2575.0];
pub const BANDPASS_STOPBAND_HZ: [f64; 2] = [2300.0, 2700.0];

// Baseband lowpass template
pub const LOWPASS_PASSBAND_HZ: f64 = 100.0;
pub const LOWPASS_STOPBAND_HZ: f64 = 500.0;

pub const PASSBAND_RIPPLE_DB: f64 = 1.0;
pub const STOPBAND_ATTENUATION_DB: f64 = 40.0;

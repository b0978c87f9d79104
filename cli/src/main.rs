use clap::{Parser, Subcommand, ValueEnum};
use hound::WavSpec;
use sonolink_core::frame::{FrameTrim, DEFAULT_MARGIN_SECS};
use sonolink_core::resample::downmix;
use sonolink_core::{
    BitStream, Decoder, Encoder, FrameDetectorConfig, LinkParameters, Message, ModemError,
    PhaseEstimator, ReceiverConfig, SampleBuffer, TimingConfig,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("modem error: {0}")]
    Modem(#[from] ModemError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid link configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("unsupported WAV format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Parser)]
#[command(name = "sonolink")]
#[command(about = "Acoustic BPSK modem for short text messages")]
struct Cli {
    /// JSON file overriding the default link parameters
    #[arg(long, global = true, value_name = "LINK.JSON")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Modulate a message into a WAV file
    Transmit {
        /// Text to send, or a string of 0/1 with --binary
        #[arg(value_name = "MESSAGE")]
        message: String,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Treat MESSAGE as raw bits
        #[arg(long)]
        binary: bool,

        /// Silence written before and after the burst
        #[arg(long, default_value = "250")]
        padding_ms: u32,
    },

    /// Recover a message from a WAV recording
    Receive {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Carrier phase estimator
        #[arg(long, value_enum, default_value = "squared")]
        phase: PhaseArg,

        /// Frame threshold as a fraction of the envelope peak
        #[arg(long, default_value = "0.1")]
        threshold: f32,

        /// Keep this much audio around the detected frame
        #[arg(long, conflicts_with = "window_secs")]
        margin_ms: Option<f32>,

        /// Search only the first seconds and keep everything after the leading edge
        #[arg(long)]
        window_secs: Option<f32>,

        /// Timing search step in samples (default: a sixteenth of a bit)
        #[arg(long)]
        stride: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PhaseArg {
    /// angle of the mean baseband sample
    First,
    /// half the angle of the mean squared baseband sample
    Squared,
}

impl From<PhaseArg> for PhaseEstimator {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::First => PhaseEstimator::FirstMoment,
            PhaseArg::Squared => PhaseEstimator::SquaredMoment,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    run(cli).map_err(|e| e.to_string().into())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let link = load_link(cli.config.as_deref())?;

    match cli.command {
        Commands::Transmit {
            message,
            output,
            binary,
            padding_ms,
        } => transmit_command(link, &message, binary, padding_ms, &output)?,
        Commands::Receive {
            input,
            phase,
            threshold,
            margin_ms,
            window_secs,
            stride,
        } => {
            let trim = match window_secs {
                Some(window_secs) => FrameTrim::LeadingEdge { window_secs },
                None => FrameTrim::DetectedInterval {
                    margin_secs: margin_ms.map_or(DEFAULT_MARGIN_SECS, |ms| ms / 1000.0),
                },
            };
            let config = ReceiverConfig {
                frame: FrameDetectorConfig {
                    threshold_fraction: threshold,
                    trim,
                },
                phase: phase.into(),
                timing: TimingConfig {
                    stride,
                    ..TimingConfig::default()
                },
            };
            receive_command(link, config, &input)?
        }
    }

    Ok(())
}

fn load_link(path: Option<&Path>) -> Result<LinkParameters, CliError> {
    let Some(path) = path else {
        return Ok(LinkParameters::default());
    };
    let link: LinkParameters = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    link.validate()?;
    log::info!("link parameters loaded from {}", path.display());
    Ok(link)
}

fn transmit_command(
    link: LinkParameters,
    message: &str,
    binary: bool,
    padding_ms: u32,
    output_path: &Path,
) -> Result<(), CliError> {
    let message = if binary {
        Message::Bits(message.parse::<BitStream>()?)
    } else {
        Message::Text(message.to_string())
    };

    let encoder = Encoder::new(link)?;
    let burst = encoder.encode(&message)?;
    println!(
        "Encoded to {} audio samples ({:.2} s)",
        burst.len(),
        burst.duration()
    );

    let padding = (padding_ms as u64 * burst.sample_rate as u64 / 1000) as usize;
    let mut samples = vec![0.0; padding];
    samples.extend_from_slice(&burst.samples);
    samples.extend(std::iter::repeat(0.0).take(padding));

    write_wav(output_path, &SampleBuffer::new(samples, burst.sample_rate))?;
    println!("Wrote {}", output_path.display());
    Ok(())
}

fn receive_command(
    link: LinkParameters,
    config: ReceiverConfig,
    input_path: &Path,
) -> Result<(), CliError> {
    let capture = read_wav(input_path)?;
    println!(
        "Extracted {} samples ({:.2} s at {} Hz)",
        capture.len(),
        capture.duration(),
        capture.sample_rate
    );

    let decoder = Decoder::new(link, config)?;
    let reception = decoder.decode(&capture)?;

    match reception.offset {
        Some(offset) => {
            println!("Decoded: {}", reception.text);
            println!(
                "{} bits, score {}, timing offset {}, phase {:.3} rad{}",
                reception.bits.len(),
                reception.score,
                offset,
                reception.phase,
                if reception.inverted { ", inverted" } else { "" }
            );
        }
        None => println!("No timing offset produced decodable text"),
    }
    Ok(())
}

fn write_wav(path: &Path, buffer: &SampleBuffer) -> Result<(), CliError> {
    // Write WAV file (16-bit PCM)
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &buffer.samples {
        // Clamp to [-1.0, 1.0] range to avoid overflow, then scale to i16
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

fn read_wav(path: &Path) -> Result<SampleBuffer, CliError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    log::debug!(
        "WAV: {} Hz, {} channels, {} bits {:?}",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / 32768.0))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
        (format, bits) => {
            return Err(CliError::UnsupportedFormat(format!(
                "{} bit {:?}",
                bits, format
            )))
        }
    };

    let samples = downmix(&interleaved, spec.channels as usize)?;
    Ok(SampleBuffer::new(samples, spec.sample_rate))
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModemError {
    #[error("Filter template cannot be met: {0}")]
    SpecInfeasible(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("No signal above the detection threshold")]
    NoSignalDetected,

    #[error("Failed to decode bit stream: {0}")]
    DecodeFailure(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

pub type Result<T> = std::result::Result<T, ModemError>;

use thiserror::Error;

/// Why the platform was lost
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestructionCause {
    #[error("reactor core went unstable while over capacity")]
    ReactorMeltdown,

    #[error("hull integrity collapsed")]
    HullBreached,

    #[error("aggregate health exhausted")]
    SystemsCollapse,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Platform destroyed: {0}")]
    Destroyed(DestructionCause),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl PlatformError {
    /// Destruction is the only non-recoverable failure
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlatformError::Destroyed(_))
    }
}

impl From<tokio::task::JoinError> for PlatformError {
    fn from(err: tokio::task::JoinError) -> Self {
        PlatformError::TaskFailed(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

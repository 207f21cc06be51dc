//! Flex protocol error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlexError {
    #[error("malformed flex command: {0}")]
    MalformedCommand(String),

    #[error("command {0:?} not recognized as a valid flex command")]
    UnknownVerb(String),

    #[error("{0}")]
    Validation(String),

    #[error("invalid flex options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("device {0} is not a block device")]
    NotABlockDevice(String),

    #[error("{command} failed: {message}")]
    MountCommand { command: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlexError>;

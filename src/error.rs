//! Error types for EchoSonic

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchoSonicError {
    #[error("Invalid acoustic parameters: {0}")]
    InvalidParameters(String),

    #[error("Malformed audio batch: {0}")]
    InvalidBatch(String),
}

pub type Result<T> = std::result::Result<T, EchoSonicError>;

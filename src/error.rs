//! Error types and handling.

use thiserror::Error;

use crate::epp::EppError;
use crate::usb::TransportError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// File or stdio operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Device open, claim or raw transfer failed
    #[error("USB transport error: {0}")]
    Transport(#[from] TransportError),

    /// Register transaction aborted by the bridge protocol
    #[error("EPP transaction failed: {0}")]
    Epp(#[from] EppError),

    /// Input data did not match the requested length
    #[error("Input length mismatch: {0}")]
    InputLength(String),

    /// Invalid combination of command-line options
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

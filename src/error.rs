// Error types for the FaceApp client.
//
// Every failure is surfaced on first occurrence; nothing in this crate
// retries a request.

use std::fmt;
use thiserror::Error;

/// Top-level error type for client operations.
#[derive(Error, Debug)]
pub enum FaceAppError {
    /// The client configuration could not be turned into a transport
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Connection-level failure (DNS, TCP, TLS), passed through verbatim
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The server rejected the request
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server answered with something that does not match the API contract
    #[error("Unexpected response from server: {0}")]
    Protocol(String),

    /// Reading the input, the response body, or writing the destination failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An error reported by the FaceApp API, already translated into a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Machine-readable code, e.g. `bad_filter_id`
    pub code: String,
    /// Message shown to the user
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

/// Convenience type alias for client results.
pub type Result<T> = std::result::Result<T, FaceAppError>;

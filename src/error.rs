//! Error types for the Textgate service.
//!
//! A rate limit denial is not an error: it is returned as a
//! [`RateLimitDecision`](crate::ratelimit::RateLimitDecision) with
//! `success == false`. The variants below cover genuine faults only.

use thiserror::Error;

/// Main error type for Textgate operations.
#[derive(Error, Debug)]
pub enum TextgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// gRPC server errors
    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::transport::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for TextgateError {
    fn from(err: config::ConfigError) -> Self {
        TextgateError::Config(err.to_string())
    }
}

/// Result type alias for Textgate operations.
pub type Result<T> = std::result::Result<T, TextgateError>;

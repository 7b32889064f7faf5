//! Error types for the portfolio state manager.
//!
//! This module defines gateway-agnostic error types. HTTP-specific failures
//! are converted to [`GatewayError`] by the gateway layer; repository and
//! validation failures never reach the network.

use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the portfolio state manager.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Holding '{0}' not found")]
    NotFound(String),

    #[error("Holding '{0}' already exists")]
    DuplicateKey(String),

    #[error("Gateway operation failed: {0}")]
    Gateway(#[from] GatewayError),

    /// A completion arrived for a session that has since been cleared.
    /// Internal marker, never recorded in an operation status.
    #[error("Stale generation")]
    StaleGeneration,
}

impl Error {
    /// Whether this error is the internal stale-completion marker.
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::StaleGeneration)
    }
}

/// Input fails local invariants before any network call.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("Average cost must be positive, got {0}")]
    NonPositiveCost(Decimal),

    #[error("Average cost cannot be negative, got {0}")]
    NegativeCost(Decimal),

    #[error("Price cannot be negative, got {0}")]
    NegativePrice(Decimal),
}

/// Network failure, non-2xx response, or malformed payload from the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

//! # Error Types
//!
//! Errors shared across subsystems.

use thiserror::Error;

/// Errors raised when building or parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Input was not valid hex.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded input had the wrong number of bytes.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Label was empty or not printable ASCII.
    #[error("Invalid label: {0:?}")]
    InvalidLabel(String),
}

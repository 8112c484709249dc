//! Error types shared by every public operation of the crate.

use thiserror::Error;

/// Unified error type for enrichment computations.
///
/// Errors are raised eagerly at the boundary of constructors and compute
/// calls. No partially filled result is ever returned alongside them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnrichError {
    /// An identifier or index is unknown to the entity database.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Two structures are backed by different entity databases.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// Malformed category or score collection.
    #[error("input error: {0}")]
    Input(String),

    /// The statistic has no closed-form test for the requested mode.
    #[error("unsupported mode: {method} has no {mode} p-value")]
    UnsupportedMode { method: String, mode: String },

    /// Degenerate numeric input (empty universe, subset violations,
    /// out-of-range counts or probabilities).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, EnrichError>;

macro_rules! invalid_input {
    ($($arg:tt)*) => {
        $crate::error::EnrichError::InvalidInput(format!($($arg)*))
    };
}
pub(crate) use invalid_input;

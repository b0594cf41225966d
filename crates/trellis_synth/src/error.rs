//! Error types for validation and synthesis.

use thiserror::Error;

use crate::validator::ValidationReport;

/// Result type alias for synthesis operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors that can occur while validating or synthesizing a construct tree.
#[derive(Error, Debug)]
pub enum SynthError {
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    #[error("Cyclic reference detected: {}", .cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },

    #[error("Unresolvable token: {0}")]
    UnresolvableToken(String),

    #[error("Duplicate logical id '{id}' produced by '{first}' and '{second}'")]
    DuplicateLogicalId {
        id: String,
        first: String,
        second: String,
    },

    #[error("Core error: {0}")]
    Core(#[from] trellis_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

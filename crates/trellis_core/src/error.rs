//! Error types for the construct substrate.

use thiserror::Error;

/// Result type alias for construct tree operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while building a construct tree or allocating
/// logical identities.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Duplicate construct name '{name}' under '{parent_path}'")]
    DuplicateName { parent_path: String, name: String },

    #[error("Construct name '{0}' sanitizes to an empty identity segment")]
    InvalidName(String),

    #[error("Cannot allocate an identity for an empty path")]
    EmptyPath,

    #[error("Construct node is not part of this tree: {0}")]
    NodeNotFound(String),

    #[error("Construct at '{0}' already has a resource kind bound")]
    KindAlreadyBound(String),
}

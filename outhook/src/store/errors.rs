//! Storage backend errors.

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum StoreError {
    /// No record matched the given key
    #[error("record not found")]
    NotFound,

    /// Backend-specific failure with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

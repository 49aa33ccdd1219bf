//! Error types for the delivery core.

use thiserror::Error as ThisError;

use crate::store::StoreError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Requested resource not found.
    ///
    /// Also returned for ownership mismatches on update/delete/rotate, so a
    /// caller cannot distinguish "exists but belongs to someone else" from
    /// "does not exist".
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// Invalid request data or business rule violation.
    #[error("{message}")]
    BadRequest { message: String },

    /// Storage backend error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;

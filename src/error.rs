//! Fatal errors of a validation run.
//!
//! Anything in here terminates the run. Ordinary "this input is not valid"
//! outcomes never show up as an [`Error`]: they are recorded in the error map
//! of the [`Validator`](crate::Validator) and read back with `is_valid()`.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a [`UniquenessChecker`](crate::UniquenessChecker) backend.
///
/// Wraps whatever the backend produced so the original cause stays reachable
/// through `source()`.
#[derive(Debug, Error)]
#[error("storage backend failure: {0}")]
pub struct StorageError(#[from] pub anyhow::Error);

impl StorageError {
    /// Builds a storage error from a plain message.
    pub fn msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self(anyhow::Error::msg(message))
    }
}

/// Run-terminating errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Field {0} is not a file upload")]
    NotAFile(String),
    #[error("Unknown file category: {0}")]
    UnknownCategory(String),
    #[error("Invalid upload destination {path}: {reason}")]
    InvalidDestination { path: PathBuf, reason: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

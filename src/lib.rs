//! Per-field validation of untrusted form input and uploaded files.
//!
//! A [`Validator`] runs over one [`InputRecord`]. Each field is selected with
//! [`Validator::field`] (or [`Validator::file`] for uploads) and checked by a
//! chain of rules. The first failing rule of a field records a message in the
//! error map; accepted values are copied into the cleaned data on request.
//! Faults that are not about the input itself (unknown field, unknown
//! category, unusable upload directory, storage failure) come back as
//! [`Error`] instead.

pub mod config;
pub mod consts;
pub mod database;
pub mod error;
pub mod messages;
pub mod validation;

pub use config::ValidatorConfig;
pub use database::{FnChecker, UniquenessChecker, YamlTableStore};
pub use error::{Error, Result, StorageError};
pub use messages::{ErrorKind, MessageTable};
pub use validation::{
    CategoryTable, DimensionBounds, FileCategory, FileChain, FileDescriptor, FileRecord, Input,
    InputRecord, SizeLimit, UploadStatus, Validator,
};

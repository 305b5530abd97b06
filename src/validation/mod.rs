//! Root module for the validation system.
//! Exposes the rule chains and the types they work on.

mod categories;
mod context;
mod descriptor;
mod file;
mod types;
pub mod validators;

// Re-export commonly used types
pub use categories::{CategoryTable, FileCategory};
pub use context::Validator;
pub use descriptor::FileDescriptor;
pub use file::FileChain;
pub use types::{DimensionBounds, FileRecord, Input, InputRecord, SizeLimit, UploadStatus};

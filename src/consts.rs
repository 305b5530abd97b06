//! Constants used throughout the validation engine.

/// Number of leading bytes read from a temp file to sniff its content type
pub const SNIFF_WINDOW: usize = 64 * 1024;

/// Default size ceiling of the `images` category (5 MB)
pub const MAX_IMAGE_SIZE: u64 = 5 * 1024 * 1024;
/// Default size ceiling of the `documents` category (10 MB)
pub const MAX_DOCUMENT_SIZE: u64 = 10 * 1024 * 1024;
/// Default size ceiling of the `archives` category (50 MB)
pub const MAX_ARCHIVE_SIZE: u64 = 50 * 1024 * 1024;

/// Units used when rendering byte counts in messages, smallest first.
pub const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

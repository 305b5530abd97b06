//! File validation chain
//!
//! A [`FileChain`] is the file counterpart of the scalar rule chain: it holds
//! the [`FileDescriptor`] of one upload and records failures in the error map
//! of the [`Validator`] it borrows, with the same first-failure-wins rule.
//!
//! ```no_run
//! use formcheck::{DimensionBounds, FileRecord, InputRecord, Validator};
//!
//! let upload = FileRecord::new("avatar.png", "/tmp/upload_a1b2", 48_213);
//! let mut v = Validator::new(InputRecord::new().with_file("avatar", upload));
//!
//! v.file("avatar")?
//!     .allowed_for("images")?
//!     .max_file_size(1024 * 1024_u64)?
//!     .image_dimensions(DimensionBounds::new().max(512, 512))
//!     .move_to("./data/uploads", None)?;
//!
//! if v.is_valid() {
//!     println!("stored at {}", v.get("avatar").unwrap());
//! }
//! # Ok::<(), formcheck::Error>(())
//! ```

use log::warn;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::context::Validator;
use super::descriptor::FileDescriptor;
use super::types::{DimensionBounds, FileRecord, SizeLimit};
use super::validators::file as file_validators;
use crate::error::{Error, Result};
use crate::messages::ErrorKind;

pub struct FileChain<'v, 'a> {
    validator: &'v mut Validator<'a>,
    file: FileDescriptor,
}

impl<'v, 'a> FileChain<'v, 'a> {
    /// Points the validator at `name` and records the upload failure, if any.
    pub(crate) fn begin(validator: &'v mut Validator<'a>, name: &str, record: FileRecord) -> Self {
        validator.set_cursor(name, Value::String(record.name.clone()));

        let mut chain = Self {
            validator,
            file: FileDescriptor::new(record),
        };

        let status = chain.file.status();
        if !status.is_ok() && !chain.check_error() {
            chain
                .validator
                .record(ErrorKind::FileUpload, &[("upload", status.description())], None);
        }
        chain
    }

    /// The descriptor of the file being validated
    pub fn descriptor(&self) -> &FileDescriptor {
        &self.file
    }

    /// True when this file field already has an error
    pub fn check_error(&self) -> bool {
        self.validator.check_error()
    }

    /// Replaces the message of the next check evaluated on this chain.
    pub fn message(&mut self, message: impl Into<String>) -> &mut Self {
        self.validator.set_pending_message(message.into());
        self
    }

    /// Checks extension and sniffed content type against a named category.
    ///
    /// # Errors
    /// [`Error::UnknownCategory`] if the category is not configured.
    pub fn allowed_for(&mut self, category: &str) -> Result<&mut Self> {
        let category = self.validator.categories.get(category).cloned().ok_or_else(|| {
            warn!("Unknown file category {}", category);
            Error::UnknownCategory(category.to_string())
        })?;

        Ok(self.rule(ErrorKind::FileType, &[], |file| {
            file.matches_types(&category.extensions, &category.mime_types)
        }))
    }

    /// Checks extension and sniffed content type against explicit lists.
    ///
    /// An empty `mime_types` slice only checks the extension.
    pub fn allowed_types(&mut self, extensions: &[&str], mime_types: &[&str]) -> &mut Self {
        let extensions: Vec<String> = extensions.iter().map(|s| s.to_string()).collect();
        let mime_types: Vec<String> = mime_types.iter().map(|s| s.to_string()).collect();

        self.rule(ErrorKind::FileType, &[], |file| {
            file.matches_types(&extensions, &mime_types)
        })
    }

    /// Fails when the file is strictly larger than the ceiling.
    ///
    /// # Errors
    /// [`Error::UnknownCategory`] if the limit names an unknown category.
    pub fn max_file_size(&mut self, limit: impl Into<SizeLimit>) -> Result<&mut Self> {
        let max_size = match limit.into() {
            SizeLimit::Bytes(bytes) => bytes,
            SizeLimit::Category(name) => match self.validator.categories.get(&name) {
                Some(category) => category.max_size,
                None => {
                    warn!("Unknown file category {}", name);
                    return Err(Error::UnknownCategory(name));
                }
            },
        };

        let args = [("size", file_validators::format_size(max_size))];
        Ok(self.rule(ErrorKind::FileSize, &args, |file| file.within_size(max_size)))
    }

    /// Checks the pixel size of an image against the supplied bounds.
    ///
    /// Files whose sniffed type is not `image/*`, or whose dimensions cannot
    /// be read, fail with the `not_an_image` message.
    pub fn image_dimensions(&mut self, bounds: DimensionBounds) -> &mut Self {
        let custom = self.validator.take_pending_message();
        if self.check_error() {
            return self;
        }

        let Some((width, height)) = self.file.dimensions() else {
            self.validator.record(ErrorKind::NotAnImage, &[], custom);
            return self;
        };

        let violation = match bounds {
            DimensionBounds { min_width: Some(min), .. } if width < min => {
                Some((ErrorKind::MinWidth, "width", min))
            }
            DimensionBounds { min_height: Some(min), .. } if height < min => {
                Some((ErrorKind::MinHeight, "height", min))
            }
            DimensionBounds { max_width: Some(max), .. } if width > max => {
                Some((ErrorKind::MaxWidth, "width", max))
            }
            DimensionBounds { max_height: Some(max), .. } if height > max => {
                Some((ErrorKind::MaxHeight, "height", max))
            }
            _ => None,
        };

        if let Some((kind, placeholder, limit)) = violation {
            self.validator
                .record(kind, &[(placeholder, limit.to_string())], custom);
        }
        self
    }

    /// Requires the original file name to match `pattern`.
    pub fn file_name_pattern(&mut self, pattern: &Regex) -> &mut Self {
        self.rule(ErrorKind::FileName, &[], |file| pattern.is_match(file.name()))
    }

    /// Moves the upload to `destination/(new_name or original name)` and
    /// stores the resulting path as the cleaned value of the field.
    ///
    /// Path components in the name are stripped. A failed move is recorded as
    /// a field error. When a copy succeeded but the temp file could not be
    /// removed afterwards, the copy is left behind for the caller to clean up.
    ///
    /// # Errors
    /// [`Error::InvalidDestination`] if `destination` is not an existing
    /// directory the calling process can create files in. Nothing is moved in
    /// that case.
    pub fn move_to(
        &mut self,
        destination: impl AsRef<Path>,
        new_name: Option<&str>,
    ) -> Result<&mut Self> {
        let destination = destination.as_ref();
        check_destination(destination)?;

        let custom = self.validator.take_pending_message();
        if self.check_error() {
            return Ok(self);
        }

        let original = self.file.name().to_string();
        let Some(target_name) = file_validators::sanitize_filename(new_name.unwrap_or(&original))
        else {
            self.validator.record(ErrorKind::FileMove, &[], custom);
            return Ok(self);
        };

        let stored = match self.file.finalize(destination.join(target_name)) {
            Ok(path) => Value::String(path.to_string_lossy().into_owned()),
            Err(e) => {
                warn!("Failed to move upload {}: {}", original, e);
                self.validator.record(ErrorKind::FileMove, &[], custom);
                return Ok(self);
            }
        };
        self.validator.store_value(stored);
        Ok(self)
    }

    fn rule(
        &mut self,
        kind: ErrorKind,
        args: &[(&str, String)],
        passes: impl FnOnce(&FileDescriptor) -> bool,
    ) -> &mut Self {
        let custom = self.validator.take_pending_message();
        if !self.check_error() && !passes(&self.file) {
            self.validator.record(kind, args, custom);
        }
        self
    }
}

fn check_destination(destination: &Path) -> Result<()> {
    let invalid = |reason: &str| {
        warn!("Invalid upload destination {}: {}", destination.display(), reason);
        Error::InvalidDestination {
            path: destination.to_path_buf(),
            reason: reason.to_string(),
        }
    };

    let metadata = fs::metadata(destination).map_err(|_| invalid("does not exist"))?;
    if !metadata.is_dir() {
        return Err(invalid("not a directory"));
    }
    // Permission bits ignore ownership and mount flags; creating a file does not
    tempfile::Builder::new()
        .prefix(".formcheck-")
        .tempfile_in(destination)
        .map_err(|_| invalid("not writable"))?;
    Ok(())
}

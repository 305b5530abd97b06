//! Wraps one uploaded file while its validation chain runs.
//!
//! Everything derived from the file content is computed lazily and only once:
//! the sniffed MIME type and the image dimensions are memoized on the
//! descriptor, so chaining several checks reads the temp file at most twice.

use log::info;
use once_cell::unsync::OnceCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::types::{FileRecord, UploadStatus};
use super::validators::file as file_validators;

#[derive(Debug)]
pub struct FileDescriptor {
    record: FileRecord,
    mime: OnceCell<Option<String>>,
    dimensions: OnceCell<Option<(u32, u32)>>,
    final_path: Option<PathBuf>,
}

impl FileDescriptor {
    pub fn new(record: FileRecord) -> Self {
        Self {
            record,
            mime: OnceCell::new(),
            dimensions: OnceCell::new(),
            final_path: None,
        }
    }

    /// Original file name sent by the client
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn temp_path(&self) -> &Path {
        &self.record.temp_path
    }

    /// Client-declared content type. Informational only.
    pub fn declared_type(&self) -> &str {
        &self.record.declared_type
    }

    pub fn status(&self) -> UploadStatus {
        self.record.status
    }

    pub fn size(&self) -> u64 {
        self.record.size
    }

    /// Lowercase extension of the original name
    pub fn extension(&self) -> Option<String> {
        file_validators::extension_of(&self.record.name)
    }

    /// MIME type sniffed from the temp file content, `None` if it is unreadable
    pub fn mime_type(&self) -> Option<&str> {
        self.mime
            .get_or_init(|| file_validators::sniff_mime(&self.record.temp_path))
            .as_deref()
    }

    pub fn is_image(&self) -> bool {
        self.mime_type().is_some_and(|mime| mime.starts_with("image/"))
    }

    /// `(width, height)` of the image, `None` for non-images or undecodable headers
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        *self.dimensions.get_or_init(|| {
            if self.is_image() {
                file_validators::read_dimensions(&self.record.temp_path)
            } else {
                None
            }
        })
    }

    /// True when the extension and the sniffed type are both allowed.
    ///
    /// An empty `mime_types` list disables the content type check.
    pub fn matches_types(&self, extensions: &[String], mime_types: &[String]) -> bool {
        let extension_ok = self.extension().is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        });
        if !extension_ok {
            return false;
        }

        if mime_types.is_empty() {
            return true;
        }

        self.mime_type().is_some_and(|mime| {
            mime_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(mime))
        })
    }

    /// True when the size does not exceed `max_size` bytes
    pub fn within_size(&self, max_size: u64) -> bool {
        self.record.size <= max_size
    }

    /// A collision-free name for storing the file: `<uuid>-<original name>`
    pub fn unique_name(&self) -> String {
        let original = file_validators::sanitize_filename(&self.record.name)
            .unwrap_or_else(|| "upload".to_string());
        format!("{}-{}", Uuid::new_v4(), original)
    }

    /// Where the file ended up after a successful move
    pub fn final_path(&self) -> Option<&Path> {
        self.final_path.as_deref()
    }

    /// Moves the temp file to `target`, falling back to copy-and-delete when a
    /// plain rename is impossible (e.g. across filesystems).
    ///
    /// On failure the final path stays unset. A copy that succeeded before the
    /// temp file could be removed is left in place.
    pub(crate) fn finalize(&mut self, target: PathBuf) -> io::Result<&Path> {
        if fs::rename(&self.record.temp_path, &target).is_err() {
            fs::copy(&self.record.temp_path, &target)?;
            fs::remove_file(&self.record.temp_path)?;
        }

        info!("Stored upload {} at {}", self.record.name, target.display());
        Ok(self.final_path.insert(target).as_path())
    }
}

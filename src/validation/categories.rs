//! Named bundles of allowed extensions, sniffed MIME types and size ceiling.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::consts::{MAX_ARCHIVE_SIZE, MAX_DOCUMENT_SIZE, MAX_IMAGE_SIZE};

/// One entry of the [`CategoryTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCategory {
    /// Allowed extensions, compared case-insensitively and without the dot
    pub extensions: Vec<String>,
    /// Allowed sniffed MIME types; empty means the content type is not checked
    #[serde(default)]
    pub mime_types: Vec<String>,
    /// Size ceiling in bytes
    pub max_size: u64,
}

impl FileCategory {
    pub fn new<E, M>(extensions: E, mime_types: M, max_size: u64) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
            mime_types: mime_types
                .into_iter()
                .map(|mime| mime.as_ref().to_lowercase())
                .collect(),
            max_size,
        }
    }
}

/// Category name to [`FileCategory`] mapping.
///
/// `images`, `documents` and `archives` are provided by default; entries can be
/// replaced or added with [`CategoryTable::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: HashMap<String, FileCategory>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert(
            "images",
            FileCategory::new(
                ["jpg", "jpeg", "png", "gif", "webp", "bmp"],
                ["image/jpeg", "image/png", "image/gif", "image/webp", "image/bmp"],
                MAX_IMAGE_SIZE,
            ),
        );
        table.insert(
            "documents",
            FileCategory::new(
                ["pdf", "doc", "docx", "xls", "xlsx", "txt"],
                [
                    "application/pdf",
                    "application/msword",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                    "text/plain",
                ],
                MAX_DOCUMENT_SIZE,
            ),
        );
        table.insert(
            "archives",
            FileCategory::new(
                ["zip", "gz", "tgz", "tar", "rar", "7z", "bz2"],
                [
                    "application/zip",
                    "application/gzip",
                    "application/x-tar",
                    "application/vnd.rar",
                    "application/x-7z-compressed",
                    "application/x-bzip2",
                ],
                MAX_ARCHIVE_SIZE,
            ),
        );
        table
    }
}

impl CategoryTable {
    /// A table without any category.
    pub fn empty() -> Self {
        Self {
            categories: HashMap::new(),
        }
    }

    /// Adds `category` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, category: FileCategory) -> &mut Self {
        self.categories.insert(name.into(), category);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FileCategory> {
        self.categories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}

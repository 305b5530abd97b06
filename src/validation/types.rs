//! Core types used throughout the validation system

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Outcome of the transport-level upload, as reported alongside the file.
///
/// The numbering follows the conventional upload error codes, so records
/// produced by a form parser can be converted with [`UploadStatus::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UploadStatus {
    #[default]
    Ok,
    /// The file exceeds the server-wide size limit
    ServerSizeLimit,
    /// The file exceeds the size limit declared by the form
    FormSizeLimit,
    /// Only part of the file was received
    Partial,
    /// No file was sent
    NoFile,
    /// The server has no temporary directory
    MissingTempDir,
    /// The temporary file could not be written
    WriteFailure,
    /// A server extension stopped the upload
    ExtensionBlocked,
    /// Any code not listed above
    Unknown(u16),
}

impl UploadStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => UploadStatus::Ok,
            1 => UploadStatus::ServerSizeLimit,
            2 => UploadStatus::FormSizeLimit,
            3 => UploadStatus::Partial,
            4 => UploadStatus::NoFile,
            6 => UploadStatus::MissingTempDir,
            7 => UploadStatus::WriteFailure,
            8 => UploadStatus::ExtensionBlocked,
            other => UploadStatus::Unknown(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            UploadStatus::Ok => 0,
            UploadStatus::ServerSizeLimit => 1,
            UploadStatus::FormSizeLimit => 2,
            UploadStatus::Partial => 3,
            UploadStatus::NoFile => 4,
            UploadStatus::MissingTempDir => 6,
            UploadStatus::WriteFailure => 7,
            UploadStatus::ExtensionBlocked => 8,
            UploadStatus::Unknown(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == UploadStatus::Ok
    }

    /// Human-readable description, used in the `file_upload` message.
    pub fn description(self) -> String {
        match self {
            UploadStatus::Ok => "the file was uploaded successfully".to_string(),
            UploadStatus::ServerSizeLimit => {
                "the file exceeds the maximum upload size allowed by the server".to_string()
            }
            UploadStatus::FormSizeLimit => {
                "the file exceeds the maximum upload size allowed by the form".to_string()
            }
            UploadStatus::Partial => "the file was only partially uploaded".to_string(),
            UploadStatus::NoFile => "no file was uploaded".to_string(),
            UploadStatus::MissingTempDir => "the temporary folder is missing".to_string(),
            UploadStatus::WriteFailure => "the file could not be written to disk".to_string(),
            UploadStatus::ExtensionBlocked => "the upload was stopped by an extension".to_string(),
            UploadStatus::Unknown(code) => format!("unknown upload error (code {code})"),
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Metadata of one uploaded file, as handed over by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Original file name sent by the client
    pub name: String,
    /// Where the transport layer stored the upload
    pub temp_path: PathBuf,
    /// Content type declared by the client. Never trusted.
    #[serde(default)]
    pub declared_type: String,
    #[serde(default)]
    pub status: UploadStatus,
    /// Size in bytes
    pub size: u64,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, temp_path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            temp_path: temp_path.into(),
            declared_type: String::new(),
            status: UploadStatus::Ok,
            size,
        }
    }

    pub fn with_declared_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = declared_type.into();
        self
    }

    pub fn with_status(mut self, status: UploadStatus) -> Self {
        self.status = status;
        self
    }
}

/// A single named entry of the [`InputRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Text, number, boolean, list or map value
    Value(Value),
    /// Uploaded file
    File(FileRecord),
}

/// Immutable snapshot of every field available to a validation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRecord {
    fields: HashMap<String, Input>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from a JSON object; anything else gives an empty record.
    ///
    /// Every member becomes an [`Input::Value`], objects included, so file
    /// metadata embedded in the JSON is not treated as an upload. Add uploads
    /// with [`InputRecord::with_file`]:
    ///
    /// ```
    /// use formcheck::{FileRecord, InputRecord};
    ///
    /// let input = InputRecord::from_json(serde_json::json!({ "title": "Holidays" }))
    ///     .with_file("photo", FileRecord::new("beach.jpg", "/tmp/upload_1", 5120));
    /// assert_eq!(input.len(), 2);
    /// ```
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => map.into_iter().map(|(k, v)| (k, Input::Value(v))).collect(),
            _ => Self::default(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), Input::Value(value.into()));
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, file: FileRecord) -> Self {
        self.fields.insert(name.into(), Input::File(file));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Input> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Input)> for InputRecord {
    fn from_iter<T: IntoIterator<Item = (String, Input)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Ceiling accepted by `max_file_size`: either literal bytes or the ceiling of
/// a named category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeLimit {
    Bytes(u64),
    Category(String),
}

impl From<u64> for SizeLimit {
    fn from(bytes: u64) -> Self {
        SizeLimit::Bytes(bytes)
    }
}

impl From<&str> for SizeLimit {
    fn from(category: &str) -> Self {
        SizeLimit::Category(category.to_string())
    }
}

impl From<String> for SizeLimit {
    fn from(category: String) -> Self {
        SizeLimit::Category(category)
    }
}

/// Optional pixel bounds for `image_dimensions`. Every bound is inclusive and
/// checked on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DimensionBounds {
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl DimensionBounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, width: u32, height: u32) -> Self {
        self.min_width = Some(width);
        self.min_height = Some(height);
        self
    }

    pub fn max(mut self, width: u32, height: u32) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    pub fn min_width(mut self, width: u32) -> Self {
        self.min_width = Some(width);
        self
    }

    pub fn min_height(mut self, height: u32) -> Self {
        self.min_height = Some(height);
        self
    }

    pub fn max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }
}

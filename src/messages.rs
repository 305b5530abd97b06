//! Default human-readable messages, keyed by the kind of failure.
//!
//! Messages may reference placeholders written as `{name}`. `{field}` is always
//! available and expands to the field name with underscores turned into
//! spaces; rule-specific placeholders (`{min}`, `{max}`, `{other}`, `{size}`,
//! `{width}`, `{height}`, `{upload}`) are documented on each [`ErrorKind`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifies which rule produced a per-field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Required,
    /// `{min}`
    MinLength,
    /// `{max}`
    MaxLength,
    /// `{other}`
    Similar,
    Email,
    Number,
    Array,
    Alpha,
    Caps,
    NumberRequired,
    SymbolRequired,
    NoNumbers,
    NoSymbols,
    NoSpace,
    NoHtml,
    ControlChars,
    Pattern,
    Unique,
    /// `{upload}`, the description of the upload status
    FileUpload,
    FileType,
    /// `{size}`, the ceiling rendered in human units
    FileSize,
    NotAnImage,
    /// `{width}`
    MinWidth,
    /// `{height}`
    MinHeight,
    /// `{width}`
    MaxWidth,
    /// `{height}`
    MaxHeight,
    FileName,
    FileMove,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 28] = [
        ErrorKind::Required,
        ErrorKind::MinLength,
        ErrorKind::MaxLength,
        ErrorKind::Similar,
        ErrorKind::Email,
        ErrorKind::Number,
        ErrorKind::Array,
        ErrorKind::Alpha,
        ErrorKind::Caps,
        ErrorKind::NumberRequired,
        ErrorKind::SymbolRequired,
        ErrorKind::NoNumbers,
        ErrorKind::NoSymbols,
        ErrorKind::NoSpace,
        ErrorKind::NoHtml,
        ErrorKind::ControlChars,
        ErrorKind::Pattern,
        ErrorKind::Unique,
        ErrorKind::FileUpload,
        ErrorKind::FileType,
        ErrorKind::FileSize,
        ErrorKind::NotAnImage,
        ErrorKind::MinWidth,
        ErrorKind::MinHeight,
        ErrorKind::MaxWidth,
        ErrorKind::MaxHeight,
        ErrorKind::FileName,
        ErrorKind::FileMove,
    ];

    /// Configuration key of this kind, e.g. `"min_length"`.
    pub fn key(self) -> &'static str {
        match self {
            ErrorKind::Required => "required",
            ErrorKind::MinLength => "min_length",
            ErrorKind::MaxLength => "max_length",
            ErrorKind::Similar => "similar",
            ErrorKind::Email => "email",
            ErrorKind::Number => "number",
            ErrorKind::Array => "array",
            ErrorKind::Alpha => "alpha",
            ErrorKind::Caps => "caps",
            ErrorKind::NumberRequired => "number_required",
            ErrorKind::SymbolRequired => "symbol_required",
            ErrorKind::NoNumbers => "no_numbers",
            ErrorKind::NoSymbols => "no_symbols",
            ErrorKind::NoSpace => "no_space",
            ErrorKind::NoHtml => "no_html",
            ErrorKind::ControlChars => "control_chars",
            ErrorKind::Pattern => "pattern",
            ErrorKind::Unique => "unique",
            ErrorKind::FileUpload => "file_upload",
            ErrorKind::FileType => "file_type",
            ErrorKind::FileSize => "file_size",
            ErrorKind::NotAnImage => "not_an_image",
            ErrorKind::MinWidth => "min_width",
            ErrorKind::MinHeight => "min_height",
            ErrorKind::MaxWidth => "max_width",
            ErrorKind::MaxHeight => "max_height",
            ErrorKind::FileName => "file_name",
            ErrorKind::FileMove => "file_move",
        }
    }

    /// Looks a kind up by its configuration key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    fn default_message(self) -> &'static str {
        match self {
            ErrorKind::Required => "The {field} field is required.",
            ErrorKind::MinLength => "The {field} field must be at least {min} characters long.",
            ErrorKind::MaxLength => "The {field} field may not be longer than {max} characters.",
            ErrorKind::Similar => "The {field} field must match the {other} field.",
            ErrorKind::Email => "The {field} field must be a valid email address.",
            ErrorKind::Number => "The {field} field must be a number.",
            ErrorKind::Array => "The {field} field must be a list.",
            ErrorKind::Alpha => "The {field} field may only contain letters.",
            ErrorKind::Caps => "The {field} field must contain at least one capital letter.",
            ErrorKind::NumberRequired => "The {field} field must contain at least one number.",
            ErrorKind::SymbolRequired => "The {field} field must contain at least one symbol.",
            ErrorKind::NoNumbers => "The {field} field may not contain numbers.",
            ErrorKind::NoSymbols => "The {field} field may not contain symbols.",
            ErrorKind::NoSpace => "The {field} field may not contain spaces.",
            ErrorKind::NoHtml => "The {field} field may not contain HTML.",
            ErrorKind::ControlChars => "The {field} field contains invalid control characters.",
            ErrorKind::Pattern => "The {field} field has an invalid format.",
            ErrorKind::Unique => "This {field} is already taken.",
            ErrorKind::FileUpload => "The {field} upload failed: {upload}.",
            ErrorKind::FileType => "The {field} file type is not allowed.",
            ErrorKind::FileSize => "The {field} file may not be larger than {size}.",
            ErrorKind::NotAnImage => "The {field} file must be an image.",
            ErrorKind::MinWidth => "The {field} image must be at least {width} pixels wide.",
            ErrorKind::MinHeight => "The {field} image must be at least {height} pixels high.",
            ErrorKind::MaxWidth => "The {field} image may not be wider than {width} pixels.",
            ErrorKind::MaxHeight => "The {field} image may not be higher than {height} pixels.",
            ErrorKind::FileName => "The {field} file name is not allowed.",
            ErrorKind::FileMove => "The {field} file could not be saved.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Default message per [`ErrorKind`], overridable per validator instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTable {
    messages: HashMap<ErrorKind, String>,
}

impl Default for MessageTable {
    fn default() -> Self {
        let messages = ErrorKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.default_message().to_string()))
            .collect();
        Self { messages }
    }
}

impl MessageTable {
    /// Replaces the default message of `kind`.
    pub fn set(&mut self, kind: ErrorKind, message: impl Into<String>) -> &mut Self {
        self.messages.insert(kind, message.into());
        self
    }

    /// Returns the raw (unrendered) message of `kind`.
    pub fn get(&self, kind: ErrorKind) -> &str {
        self.messages
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_message())
    }

    /// Copies every entry of `overrides` over this table.
    pub fn merge(&mut self, overrides: impl IntoIterator<Item = (ErrorKind, String)>) {
        self.messages.extend(overrides);
    }

    /// Renders the message of `kind` for `field`, substituting `args`.
    pub fn render(&self, kind: ErrorKind, field: &str, args: &[(&str, String)]) -> String {
        render_template(self.get(kind), field, args)
    }
}

/// Expands `{field}` and the supplied placeholders in `template`.
///
/// Custom per-call messages go through the same expansion, so callers can use
/// placeholders there too.
pub fn render_template(template: &str, field: &str, args: &[(&str, String)]) -> String {
    let mut rendered = template.replace("{field}", &field_label(field));
    for (name, value) in args {
        rendered = rendered.replace(&format!("{{{name}}}"), value);
    }
    rendered
}

/// Turns a field name into something readable, `password_confirm` becoming
/// `password confirm`.
pub fn field_label(field: &str) -> String {
    field.replace(['_', '-'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_default() {
        let table = MessageTable::default();
        for kind in ErrorKind::ALL {
            assert!(!table.get(kind).is_empty(), "No default message for {}", kind);
        }
    }

    #[test]
    fn test_keys_round_trip() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(ErrorKind::from_key("nope"), None);
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let table = MessageTable::default();
        let message = table.render(ErrorKind::MinLength, "user_name", &[("min", "5".to_string())]);
        assert_eq!(message, "The user name field must be at least 5 characters long.");
    }

    #[test]
    fn test_override_wins_over_default() {
        let mut table = MessageTable::default();
        table.set(ErrorKind::Required, "Please fill in {field}");
        assert_eq!(table.render(ErrorKind::Required, "email", &[]), "Please fill in email");

        // Other kinds keep their defaults
        assert_eq!(table.get(ErrorKind::Email), ErrorKind::Email.default_message());
    }

    #[test]
    fn test_kind_deserializes_from_key() {
        let kind: ErrorKind = serde_yaml::from_str("no_space").unwrap();
        assert_eq!(kind, ErrorKind::NoSpace);
    }
}

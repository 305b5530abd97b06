//! The validation context: one per validation run.
//!
//! A [`Validator`] owns the input snapshot, the error map, the cleaned-data map
//! and a cursor on the field currently being checked. Rules are chained on the
//! cursor:
//!
//! ```
//! use formcheck::{InputRecord, Validator};
//!
//! let input = InputRecord::new()
//!     .with_value("username", "alice")
//!     .with_value("password", "s3cret!")
//!     .with_value("password_confirm", "s3cret?");
//!
//! let mut v = Validator::new(input);
//! v.field("username")?.required().min_length(3).no_space().store();
//! v.field("password")?.required().has_numbers().has_symbols();
//! v.field("password_confirm")?.similar_to("password");
//!
//! assert!(!v.is_valid());
//! assert_eq!(v.get("username"), Some(&serde_json::json!("alice")));
//! assert!(v.error("password_confirm").is_some());
//! # Ok::<(), formcheck::Error>(())
//! ```
//!
//! Only the first failing rule of a field is recorded; every later rule on that
//! field is skipped. Fatal problems (unknown field, storage failure, ...) are
//! returned as [`Error`] and end the run.

use log::{debug, warn};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use super::categories::CategoryTable;
use super::file::FileChain;
use super::types::{FileRecord, Input, InputRecord};
use super::validators::text as text_validators;
use crate::config::ValidatorConfig;
use crate::database::UniquenessChecker;
use crate::error::{Error, Result};
use crate::messages::{render_template, ErrorKind, MessageTable};

/// The field the chained rules currently apply to
#[derive(Debug)]
struct Cursor {
    name: String,
    value: Value,
}

pub struct Validator<'a> {
    input: InputRecord,
    errors: HashMap<String, String>,
    clean: HashMap<String, Value>,
    current: Option<Cursor>,
    pending_message: Option<String>,
    pub(crate) messages: MessageTable,
    pub(crate) categories: CategoryTable,
    checker: Option<Box<dyn UniquenessChecker + 'a>>,
}

impl<'a> Validator<'a> {
    /// Starts a run over `input` with the default messages and categories.
    pub fn new(input: InputRecord) -> Self {
        Self {
            input,
            errors: HashMap::new(),
            clean: HashMap::new(),
            current: None,
            pending_message: None,
            messages: MessageTable::default(),
            categories: CategoryTable::default(),
            checker: None,
        }
    }

    /// Injects the collaborator used by [`Validator::is_unique`].
    pub fn with_checker(mut self, checker: impl UniquenessChecker + 'a) -> Self {
        self.checker = Some(Box::new(checker));
        self
    }

    pub fn with_messages(mut self, messages: MessageTable) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_categories(mut self, categories: CategoryTable) -> Self {
        self.categories = categories;
        self
    }

    /// Applies message and category overrides from a loaded configuration.
    pub fn with_config(mut self, config: &ValidatorConfig) -> Result<Self> {
        config.apply(&mut self.messages, &mut self.categories)?;
        Ok(self)
    }

    pub fn messages_mut(&mut self) -> &mut MessageTable {
        &mut self.messages
    }

    pub fn categories_mut(&mut self) -> &mut CategoryTable {
        &mut self.categories
    }

    /// Points the cursor at `name`.
    ///
    /// # Errors
    /// [`Error::UnknownField`] if the input has no such field.
    pub fn field(&mut self, name: &str) -> Result<&mut Self> {
        let value = match self.input.get(name) {
            Some(Input::Value(value)) => value.clone(),
            Some(Input::File(record)) => Value::String(record.name.clone()),
            None => {
                warn!("Validation of unknown field {}", name);
                return Err(Error::UnknownField(name.to_string()));
            }
        };

        self.set_cursor(name, value);
        Ok(self)
    }

    /// Starts the file chain of the upload stored under `name`.
    ///
    /// # Errors
    /// [`Error::UnknownField`] if the input has no such field,
    /// [`Error::NotAFile`] if the field is not an upload.
    pub fn file(&mut self, name: &str) -> Result<FileChain<'_, 'a>> {
        let record = match self.input.get(name) {
            Some(Input::File(record)) => record.clone(),
            Some(Input::Value(_)) => {
                warn!("Field {} is not a file upload", name);
                return Err(Error::NotAFile(name.to_string()));
            }
            None => {
                warn!("Validation of unknown file field {}", name);
                return Err(Error::UnknownField(name.to_string()));
            }
        };

        Ok(FileChain::begin(self, name, record))
    }

    /// Starts the file chain for an explicit record, validated under `name`.
    pub fn file_record(&mut self, name: &str, record: FileRecord) -> FileChain<'_, 'a> {
        FileChain::begin(self, name, record)
    }

    /// Replaces the message of the next rule evaluated, whatever its kind.
    ///
    /// `{field}` is expanded like in default messages.
    pub fn message(&mut self, message: impl Into<String>) -> &mut Self {
        self.pending_message = Some(message.into());
        self
    }

    pub fn required(&mut self) -> &mut Self {
        self.rule(ErrorKind::Required, &[], |v| !text_validators::is_blank(v))
    }

    /// Fails when the value holds more than `max` characters (or elements).
    pub fn max_length(&mut self, max: usize) -> &mut Self {
        self.rule(ErrorKind::MaxLength, &[("max", max.to_string())], |v| {
            text_validators::length(v) <= max
        })
    }

    /// Fails when the value holds fewer than `min` characters (or elements).
    pub fn min_length(&mut self, min: usize) -> &mut Self {
        self.rule(ErrorKind::MinLength, &[("min", min.to_string())], |v| {
            text_validators::length(v) >= min
        })
    }

    /// Requires the value to equal the value of `other`.
    ///
    /// Skipped when `other` already failed, so a bad password does not also
    /// produce a confirmation error.
    pub fn similar_to(&mut self, other: &str) -> &mut Self {
        let other_failed = self.errors.contains_key(other);
        let other_value = self.input.get(other).map(input_value).unwrap_or(Value::Null);
        let args = [("other", crate::messages::field_label(other))];

        self.rule(ErrorKind::Similar, &args, |v| other_failed || *v == other_value)
    }

    pub fn is_email(&mut self) -> &mut Self {
        self.rule(ErrorKind::Email, &[], |v| match v {
            Value::String(s) => text_validators::validate_email(s),
            _ => false,
        })
    }

    /// Accepts numbers and strings such as `"-1.5"` or `"2e10"`.
    pub fn is_numeric(&mut self) -> &mut Self {
        self.rule(ErrorKind::Number, &[], text_validators::is_numeric)
    }

    pub fn is_array(&mut self) -> &mut Self {
        self.rule(ErrorKind::Array, &[], text_validators::is_container)
    }

    pub fn is_alpha(&mut self) -> &mut Self {
        self.text_rule(ErrorKind::Alpha, text_validators::is_alpha)
    }

    pub fn has_caps(&mut self) -> &mut Self {
        self.text_rule(ErrorKind::Caps, text_validators::has_caps)
    }

    pub fn has_numbers(&mut self) -> &mut Self {
        self.text_rule(ErrorKind::NumberRequired, text_validators::has_digit)
    }

    pub fn has_symbols(&mut self) -> &mut Self {
        self.text_rule(ErrorKind::SymbolRequired, text_validators::has_symbol)
    }

    pub fn no_numbers(&mut self) -> &mut Self {
        self.text_rule(ErrorKind::NoNumbers, |t| !text_validators::has_digit(t))
    }

    pub fn no_symbols(&mut self) -> &mut Self {
        self.text_rule(ErrorKind::NoSymbols, |t| !text_validators::has_symbol(t))
    }

    pub fn no_space(&mut self) -> &mut Self {
        self.text_rule(ErrorKind::NoSpace, |t| !text_validators::has_whitespace(t))
    }

    /// Rejects values that contain HTML markup.
    pub fn no_html(&mut self) -> &mut Self {
        self.text_rule(ErrorKind::NoHtml, |t| !text_validators::contains_html(t))
    }

    pub fn no_control_chars(&mut self) -> &mut Self {
        self.text_rule(ErrorKind::ControlChars, |t| !text_validators::has_control_chars(t))
    }

    /// Requires the textual value to match `pattern`.
    pub fn matches(&mut self, pattern: &Regex) -> &mut Self {
        self.rule(ErrorKind::Pattern, &[], |v| {
            text_validators::as_text(v).is_some_and(|t| pattern.is_match(&t))
        })
    }

    /// Runs a caller-supplied check, recording `message` when it returns false.
    pub fn custom(
        &mut self,
        message: impl Into<String>,
        passes: impl FnOnce(&Value) -> bool,
    ) -> &mut Self {
        let custom = self.pending_message.take().unwrap_or_else(|| message.into());
        if let Some(cursor) = self.active_cursor() {
            if !passes(&cursor.value) {
                let rendered = render_template(&custom, &cursor.name, &[]);
                self.record_message("custom", rendered);
            }
        }
        self
    }

    /// Fails when `table` already has a row whose `column` (the field name by
    /// default) equals the current value.
    ///
    /// # Errors
    /// [`Error::Storage`] when the lookup itself fails, [`Error::Config`] when
    /// no checker was injected.
    pub fn is_unique(&mut self, table: &str, column: Option<&str>) -> Result<&mut Self> {
        let custom = self.pending_message.take();
        let Some(cursor) = self.active_cursor() else {
            return Ok(self);
        };

        let checker = self.checker.as_ref().ok_or_else(|| {
            warn!("Uniqueness check on {} without a checker", cursor.name);
            Error::Config("no uniqueness checker configured".to_string())
        })?;

        let column = column.unwrap_or(&cursor.name);
        let exists = checker.exists(table, column, &cursor.value).map_err(|e| {
            warn!("Uniqueness lookup on {}.{} failed: {}", table, column, e);
            Error::Storage(e)
        })?;

        if exists {
            self.record(ErrorKind::Unique, &[], custom);
        }
        Ok(self)
    }

    /// Stores the raw current value as cleaned data.
    ///
    /// This does not look at the error map: storing a field that failed puts
    /// it in both maps. Callers decide whether to store after a failure.
    pub fn store(&mut self) -> &mut Self {
        self.store_with(Value::clone)
    }

    /// Like [`Validator::store`], with every string HTML-escaped.
    pub fn store_safe(&mut self) -> &mut Self {
        self.store_with(text_validators::escape_value)
    }

    /// Like [`Validator::store`], with strings trimmed and NFKC-normalized.
    pub fn store_normalized(&mut self) -> &mut Self {
        self.store_with(text_validators::normalize_value)
    }

    /// True when no field recorded an error.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when the current field already has an error.
    pub fn check_error(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|cursor| self.errors.contains_key(&cursor.name))
    }

    pub fn clean_data(&self) -> &HashMap<String, Value> {
        &self.clean
    }

    /// Cleaned value of `name`, if it was stored.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.clean.get(name)
    }

    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    /// Ends the run, handing back the cleaned data and the error map.
    pub fn into_parts(self) -> (HashMap<String, Value>, HashMap<String, String>) {
        (self.clean, self.errors)
    }

    /// Moves the cursor, dropping a custom message the previous field left unused.
    pub(crate) fn set_cursor(&mut self, name: &str, value: Value) {
        self.pending_message = None;
        self.current = Some(Cursor {
            name: name.to_string(),
            value,
        });
    }

    pub(crate) fn take_pending_message(&mut self) -> Option<String> {
        self.pending_message.take()
    }

    pub(crate) fn set_pending_message(&mut self, message: String) {
        self.pending_message = Some(message);
    }

    pub(crate) fn store_value(&mut self, value: Value) {
        if let Some(cursor) = &self.current {
            self.clean.insert(cursor.name.clone(), value);
        }
    }

    /// Records a failure of `kind` on the current field, using `custom`
    /// instead of the table message when given.
    pub(crate) fn record(&mut self, kind: ErrorKind, args: &[(&str, String)], custom: Option<String>) {
        let Some(cursor) = &self.current else {
            return;
        };

        let message = match custom {
            Some(template) => render_template(&template, &cursor.name, args),
            None => self.messages.render(kind, &cursor.name, args),
        };
        self.record_message(kind.key(), message);
    }

    fn record_message(&mut self, rule: &str, message: String) {
        if let Some(cursor) = &self.current {
            debug!("Field {} failed rule {}", cursor.name, rule);
            self.errors.entry(cursor.name.clone()).or_insert(message);
        }
    }

    /// The cursor, unless it is unset or its field already failed
    fn active_cursor(&self) -> Option<&Cursor> {
        self.current
            .as_ref()
            .filter(|cursor| !self.errors.contains_key(&cursor.name))
    }

    fn rule(
        &mut self,
        kind: ErrorKind,
        args: &[(&str, String)],
        passes: impl FnOnce(&Value) -> bool,
    ) -> &mut Self {
        let custom = self.pending_message.take();
        let failed = self.active_cursor().is_some_and(|cursor| !passes(&cursor.value));
        if failed {
            self.record(kind, args, custom);
        }
        self
    }

    /// A rule over the textual form of the value; lists, maps and null are
    /// checked as the empty string.
    fn text_rule(&mut self, kind: ErrorKind, passes: impl FnOnce(&str) -> bool) -> &mut Self {
        self.rule(kind, &[], |v| {
            passes(&*text_validators::as_text(v).unwrap_or_default())
        })
    }

    fn store_with(&mut self, transform: impl FnOnce(&Value) -> Value) -> &mut Self {
        if let Some(cursor) = &self.current {
            let value = transform(&cursor.value);
            self.store_value(value);
        }
        self
    }
}

fn input_value(input: &Input) -> Value {
    match input {
        Input::Value(value) => value.clone(),
        Input::File(record) => Value::String(record.name.clone()),
    }
}

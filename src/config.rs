//! Message and category overrides loaded from YAML.
//!
//! ```yaml
//! messages:
//!   required: "Please fill in the {field} field."
//! categories:
//!   audio:
//!     extensions: [mp3, ogg]
//!     mime_types: [audio/mpeg, audio/ogg]
//!     max_size: 10485760
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::messages::{ErrorKind, MessageTable};
use crate::validation::{CategoryTable, FileCategory};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Message key (e.g. `min_length`) to message template
    #[serde(default)]
    pub messages: HashMap<String, String>,
    /// Categories added to, or replacing, the defaults
    #[serde(default)]
    pub categories: HashMap<String, FileCategory>,
}

impl ValidatorConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str::<Option<Self>>(yaml)
            .map(Option::unwrap_or_default)
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
            .map_err(|e| Error::Config(format!("{e:#}")))?;
        Self::from_yaml_str(&yaml)
    }

    /// Copies the overrides into the given tables.
    ///
    /// # Errors
    /// [`Error::Config`] on a message key that names no known rule. Nothing is
    /// applied in that case.
    pub fn apply(&self, messages: &mut MessageTable, categories: &mut CategoryTable) -> Result<()> {
        let overrides = self
            .messages
            .iter()
            .map(|(key, message)| {
                ErrorKind::from_key(key)
                    .map(|kind| (kind, message.clone()))
                    .ok_or_else(|| Error::Config(format!("unknown message key `{key}`")))
            })
            .collect::<Result<Vec<_>>>()?;

        messages.merge(overrides);
        for (name, category) in &self.categories {
            categories.insert(
                name.clone(),
                FileCategory::new(&category.extensions, &category.mime_types, category.max_size),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{InputRecord, Validator};
    use serde_json::json;

    const CONFIG: &str = r#"
messages:
  required: "Please fill in {field}."
categories:
  images:
    extensions: [PNG]
    max_size: 2048
  audio:
    extensions: [mp3]
    mime_types: [audio/mpeg]
    max_size: 10485760
"#;

    #[test]
    fn test_parse_and_apply() {
        let config = ValidatorConfig::from_yaml_str(CONFIG).unwrap();
        let mut messages = MessageTable::default();
        let mut categories = CategoryTable::default();

        config.apply(&mut messages, &mut categories).unwrap();

        assert_eq!(messages.get(ErrorKind::Required), "Please fill in {field}.");
        let images = categories.get("images").unwrap();
        assert_eq!(images.extensions, vec!["png"]);
        assert!(images.mime_types.is_empty());
        assert_eq!(images.max_size, 2048);
        assert!(categories.contains("audio"));
        assert!(categories.contains("documents"));
    }

    #[test]
    fn test_unknown_message_key() {
        let config = ValidatorConfig::from_yaml_str("messages:\n  requird: typo\n").unwrap();
        let mut messages = MessageTable::default();
        let result = config.apply(&mut messages, &mut CategoryTable::default());

        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(messages, MessageTable::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(ValidatorConfig::from_yaml_str("messages: [1, 2"), Err(Error::Config(_))));
        assert!(matches!(ValidatorConfig::from_yaml_str("colours: {}"), Err(Error::Config(_))));
        assert_eq!(ValidatorConfig::from_yaml_str("").unwrap(), ValidatorConfig::default());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validation.yaml");
        std::fs::write(&path, CONFIG).unwrap();

        assert!(ValidatorConfig::from_yaml_file(&path).is_ok());
        assert!(matches!(
            ValidatorConfig::from_yaml_file(dir.path().join("missing.yaml")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validator_uses_config() {
        let config = ValidatorConfig::from_yaml_str(CONFIG).unwrap();
        let mut v = Validator::new(InputRecord::from_json(json!({ "city": "" })))
            .with_config(&config)
            .unwrap();

        v.field("city").unwrap().required();
        assert_eq!(v.error("city"), Some("Please fill in city."));
    }
}

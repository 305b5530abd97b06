//! Uniqueness lookups against stored data.
//!
//! The validator only needs to know whether a value already exists in a given
//! table column. [`UniquenessChecker`] is that contract; [`YamlTableStore`] is a
//! small file-backed implementation of it, handy for tests and small apps.
//! Implementations backed by a real database must bind `value` as a query
//! parameter and never interpolate it into the query text.

use anyhow::{anyhow, Context};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::HashMap,
    fs::{create_dir_all, File},
    io::ErrorKind::NotFound,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use crate::error::StorageError;
use crate::validation::validators::text::as_text;

/// Answers "does a row with this value exist?".
pub trait UniquenessChecker {
    /// Returns whether `table` has a row whose `column` equals `value`.
    ///
    /// Any backend fault must be reported as an error, never as `false`.
    fn exists(&self, table: &str, column: &str, value: &Value) -> Result<bool, StorageError>;
}

impl<T: UniquenessChecker + ?Sized> UniquenessChecker for &T {
    fn exists(&self, table: &str, column: &str, value: &Value) -> Result<bool, StorageError> {
        (**self).exists(table, column, value)
    }
}

impl<T: UniquenessChecker + ?Sized> UniquenessChecker for Arc<T> {
    fn exists(&self, table: &str, column: &str, value: &Value) -> Result<bool, StorageError> {
        (**self).exists(table, column, value)
    }
}

/// Adapts a closure into a [`UniquenessChecker`].
pub struct FnChecker<F>(pub F);

impl<F> UniquenessChecker for FnChecker<F>
where
    F: Fn(&str, &str, &Value) -> Result<bool, StorageError>,
{
    fn exists(&self, table: &str, column: &str, value: &Value) -> Result<bool, StorageError> {
        (self.0)(table, column, value)
    }
}

type Row = HashMap<String, Value>;
type Tables = HashMap<String, Vec<Row>>;

/// In-memory tables, optionally persisted as YAML.
///
/// The file maps table names to lists of rows, each row mapping column names
/// to values:
///
/// ```yaml
/// users:
///   - email: alice@example.com
///     username: alice
/// ```
#[derive(Debug, Default)]
pub struct YamlTableStore {
    path: Option<PathBuf>,
    tables: RwLock<Tables>,
}

impl YamlTableStore {
    /// An empty store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the store from `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let tables = match File::open(&path) {
            Ok(file) => serde_yaml::from_reader::<_, Option<Tables>>(file)
                .with_context(|| format!("Failed to parse {}", path.display()))?
                .unwrap_or_default(),
            Err(not_found) if not_found.kind() == NotFound => {
                info!("Table file {} not found, starting empty", path.display());
                Tables::default()
            }
            Err(other) => {
                return Err(anyhow::Error::new(other)
                    .context(format!("Failed to open {}", path.display())))
            }
        };

        Ok(Self {
            path: Some(path),
            tables: RwLock::new(tables),
        })
    }

    /// Builds a non-persisted store from YAML text.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let tables: Option<Tables> = serde_yaml::from_str(yaml).context("Failed to parse tables")?;
        Ok(Self {
            path: None,
            tables: RwLock::new(tables.unwrap_or_default()),
        })
    }

    /// Declares `table` without rows, so lookups against it succeed.
    pub fn create_table(&self, table: &str) -> Result<(), StorageError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        tables.entry(table.to_string()).or_default();
        Ok(())
    }

    /// Appends a row to `table`, creating the table if needed, then saves.
    pub fn insert_row<I, K>(&self, table: &str, row: I) -> Result<(), StorageError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let row = row.into_iter().map(|(k, v)| (k.into(), v)).collect();
        tables.entry(table.to_string()).or_default().push(row);
        self.save(&tables)
    }

    fn save(&self, tables: &Tables) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent_dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent_dir).context("Failed to create directory")?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_yaml::to_writer(file, tables).context("Failed to serialize tables")?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl UniquenessChecker for YamlTableStore {
    fn exists(&self, table: &str, column: &str, value: &Value) -> Result<bool, StorageError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let rows = tables
            .get(table)
            .ok_or_else(|| StorageError(anyhow!("Unknown table: {table}")))?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get(column))
            .any(|stored| values_match(stored, value)))
    }
}

fn poisoned() -> StorageError {
    StorageError(anyhow!("Table store poisoned"))
}

/// Equal values, or scalars with the same textual form (`"42"` and `42`)
fn values_match(stored: &Value, candidate: &Value) -> bool {
    if stored == candidate {
        return true;
    }
    match (as_text(stored), as_text(candidate)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::validation::{InputRecord, Validator};
    use serde_json::json;

    const USERS: &str = r#"
users:
  - email: alice@example.com
    username: alice
    age: 42
  - email: bob@example.com
    username: bob
"#;

    #[test]
    fn test_exists_matches_column_values() {
        let store = YamlTableStore::from_yaml_str(USERS).unwrap();

        assert!(store.exists("users", "email", &json!("alice@example.com")).unwrap());
        assert!(!store.exists("users", "email", &json!("carol@example.com")).unwrap());
        assert!(!store.exists("users", "nickname", &json!("alice")).unwrap());
        assert!(store.exists("users", "age", &json!("42")).unwrap());
    }

    #[test]
    fn test_unknown_table_is_a_storage_error() {
        let store = YamlTableStore::in_memory();
        assert!(store.exists("users", "email", &json!("x")).is_err());

        store.create_table("users").unwrap();
        assert!(!store.exists("users", "email", &json!("x")).unwrap());
    }

    #[test]
    fn test_insert_row_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/tables.yaml");

        let store = YamlTableStore::open(&path).unwrap();
        store
            .insert_row("users", [("email", json!("new@example.com"))])
            .unwrap();
        assert!(path.exists());

        let reloaded = YamlTableStore::open(&path).unwrap();
        assert!(reloaded.exists("users", "email", &json!("new@example.com")).unwrap());
    }

    #[test]
    fn test_open_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.yaml");
        std::fs::write(&path, "users: [unclosed").unwrap();

        assert!(YamlTableStore::open(&path).is_err());
    }

    #[test]
    fn test_poisoned_store_is_a_storage_error() {
        let store = Arc::new(YamlTableStore::from_yaml_str(USERS).unwrap());

        let writer = Arc::clone(&store);
        let crashed = std::thread::spawn(move || {
            let _guard = writer.tables.write().unwrap();
            panic!("writer crashed while holding the lock");
        })
        .join();
        assert!(crashed.is_err());

        assert!(store.exists("users", "email", &json!("alice@example.com")).is_err());
        assert!(store.insert_row("users", [("email", json!("x"))]).is_err());

        let mut v = Validator::new(InputRecord::from_json(json!({ "email": "new@example.com" })))
            .with_checker(Arc::clone(&store));
        let result = v.field("email").unwrap().is_unique("users", None).map(|_| ());
        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(v.is_valid());
    }

    #[test]
    fn test_shared_and_closure_checkers() {
        let store = Arc::new(YamlTableStore::from_yaml_str(USERS).unwrap());
        let shared: &dyn UniquenessChecker = &store;
        assert!(shared.exists("users", "username", &json!("bob")).unwrap());

        let failing = FnChecker(|_: &str, _: &str, _: &Value| -> Result<bool, StorageError> {
            Err(StorageError::msg("down"))
        });
        assert!(failing.exists("users", "email", &json!("x")).is_err());
    }
}

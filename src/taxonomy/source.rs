//! Configuration sources for taxonomy definitions.
//!
//! A source hands back raw YAML records per definition kind; decoding and
//! validation happen in the index builder so every problem can be reported
//! together.
//!
//! # Record Layout
//!
//! Records may be written as a sequence or as an id-keyed mapping:
//!
//! ```yaml
//! # topics.yaml, sequence form
//! - id: fundamentals
//!   display_name: Fundamentals
//!   category: core
//!
//! # skill_levels.yaml, id-keyed form
//! beginner:
//!   display_name: Beginner
//!   rank: 1
//!   average_minutes: 30
//! ```

use super::types::DefinitionKind;
use crate::error::{ExforgeError, Result};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Read contract for taxonomy configuration.
pub trait ConfigSource: Send + Sync {
    /// Raw records of one kind, or a load error.
    fn records(&self, kind: DefinitionKind) -> Result<Vec<Value>>;

    /// Short description for log lines and error messages.
    fn describe(&self) -> String;
}

/// One YAML file per definition kind inside a directory.
///
/// `topics.yaml`, `skill_levels.yaml` and `exercise_types.yaml` must exist;
/// `templates.yaml` is optional because built-in templates are always available.
#[derive(Debug, Clone)]
pub struct YamlDirectorySource {
    dir: PathBuf,
}

impl YamlDirectorySource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, kind: DefinitionKind) -> Option<PathBuf> {
        ["yaml", "yml"]
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", kind.config_key(), ext)))
            .find(|path| path.is_file())
    }
}

impl ConfigSource for YamlDirectorySource {
    fn records(&self, kind: DefinitionKind) -> Result<Vec<Value>> {
        let Some(path) = self.file_for(kind) else {
            if kind == DefinitionKind::Template {
                return Ok(Vec::new());
            }
            return Err(ExforgeError::Source(format!(
                "missing '{}.yaml' in '{}'",
                kind.config_key(),
                self.dir.display()
            )));
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            ExforgeError::Source(format!("failed to read '{}': {}", path.display(), e))
        })?;

        let value: Value = serde_yaml::from_str(&content).map_err(|e| {
            ExforgeError::Source(format!("failed to parse '{}': {}", path.display(), e))
        })?;

        records_from_value(kind, value)
    }

    fn describe(&self) -> String {
        format!("directory '{}'", self.dir.display())
    }
}

/// A single YAML document with `topics`, `skill_levels`, `exercise_types`
/// and `templates` keys. Missing keys yield no records.
#[derive(Debug, Clone)]
pub struct YamlDocumentSource {
    document: Value,
    origin: String,
}

impl YamlDocumentSource {
    /// Parse a document from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(yaml).map_err(|e| {
            ExforgeError::Source(format!("failed to parse taxonomy YAML: {}", e))
        })?;
        Ok(Self {
            document,
            origin: "inline document".to_string(),
        })
    }

    /// Load a document from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExforgeError::Source(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let mut source = Self::from_yaml(&content)?;
        source.origin = format!("file '{}'", path.display());
        Ok(source)
    }
}

impl ConfigSource for YamlDocumentSource {
    fn records(&self, kind: DefinitionKind) -> Result<Vec<Value>> {
        match self.document.get(kind.config_key()) {
            Some(value) => records_from_value(kind, value.clone()),
            None => Ok(Vec::new()),
        }
    }

    fn describe(&self) -> String {
        self.origin.clone()
    }
}

/// Flatten a YAML value into a list of records.
///
/// Accepts a sequence, an id-keyed mapping (the key becomes `id` unless the
/// record sets one), a mapping wrapped in the kind's own key, or null.
pub(crate) fn records_from_value(kind: DefinitionKind, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => Ok(items),
        Value::Mapping(mut map) => {
            let wrapper = Value::String(kind.config_key().to_string());
            if map.len() == 1 && map.contains_key(&wrapper) {
                let inner = map.remove(&wrapper).unwrap_or(Value::Null);
                return records_from_value(kind, inner);
            }
            Ok(map.into_iter().map(|(key, record)| keyed_record(key, record)).collect())
        }
        other => Err(ExforgeError::Source(format!(
            "{} must be a list or an id-keyed mapping, found {}",
            kind.config_key(),
            describe_value(&other)
        ))),
    }
}

fn keyed_record(key: Value, record: Value) -> Value {
    match record {
        Value::Mapping(mut fields) => {
            let id_key = Value::String("id".to_string());
            if !fields.contains_key(&id_key) {
                fields.insert(id_key, key);
            }
            Value::Mapping(fields)
        }
        Value::Null => {
            let mut fields = Mapping::new();
            fields.insert(Value::String("id".to_string()), key);
            Value::Mapping(fields)
        }
        other => other,
    }
}

fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

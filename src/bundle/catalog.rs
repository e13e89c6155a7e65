//! Catalog of exercise definitions loaded from YAML.

use super::types::ExerciseDefinition;
use crate::error::{ConfigurationError, ExforgeError, RecordProblem, Result};
use crate::taxonomy::DefinitionKind;
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exercise definitions in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionCatalog {
    definitions: Vec<ExerciseDefinition>,
}

const REQUIRED_FIELDS: [&str; 4] = ["id", "topic", "level", "exercise_type"];

impl DefinitionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: Vec<ExerciseDefinition>) -> Self {
        Self { definitions }
    }

    /// Parse definitions from one YAML document.
    ///
    /// The document may be a single definition, a list, or a list under an
    /// `exercises` key.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| ExforgeError::Source(format!("failed to parse exercises: {}", e)))?;
        let mut problems = ConfigurationError::default();
        let mut catalog = Self::new();
        catalog.absorb(split_records(value), None, &mut problems);
        problems.into_result()?;
        Ok(catalog)
    }

    /// Load every `.yaml`/`.yml` file in `dir`, in file name order.
    ///
    /// Problems from all files are reported together.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ExforgeError::Source(format!(
                "failed to read exercise directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();
        files.sort();

        let mut problems = ConfigurationError::default();
        let mut catalog = Self::new();

        for path in &files {
            let content = std::fs::read_to_string(path).map_err(|e| {
                ExforgeError::Source(format!("failed to read '{}': {}", path.display(), e))
            })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match serde_yaml::from_str::<Value>(&content) {
                Ok(value) => catalog.absorb(split_records(value), Some(file_name.as_str()), &mut problems),
                Err(e) => problems.push(RecordProblem::new(
                    DefinitionKind::Exercise,
                    catalog.definitions.len(),
                    None,
                    format!("{}: invalid YAML: {}", file_name, e),
                )),
            }
        }

        problems.into_result()?;
        debug!(
            count = catalog.definitions.len(),
            dir = %dir.display(),
            "exercise definitions loaded"
        );
        Ok(catalog)
    }

    fn absorb(&mut self, records: Vec<Value>, file: Option<&str>, problems: &mut ConfigurationError) {
        let mut seen: HashSet<String> = self.definitions.iter().map(|d| d.id.clone()).collect();
        let start = self.definitions.len();
        let located = |reason: String| match file {
            Some(file) => format!("{}: {}", file, reason),
            None => reason,
        };

        for (offset, record) in records.into_iter().enumerate() {
            let position = start + offset;
            let id = record
                .get("id")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            let missing: Vec<&str> = REQUIRED_FIELDS
                .iter()
                .copied()
                .filter(|field| {
                    record
                        .get(*field)
                        .and_then(Value::as_str)
                        .is_none_or(|s| s.trim().is_empty())
                })
                .collect();
            if !missing.is_empty() {
                problems.push(RecordProblem::new(
                    DefinitionKind::Exercise,
                    position,
                    id,
                    located(format!("missing {}", missing.join(", "))),
                ));
                continue;
            }

            let definition: ExerciseDefinition = match serde_yaml::from_value(record) {
                Ok(definition) => definition,
                Err(e) => {
                    problems.push(RecordProblem::new(
                        DefinitionKind::Exercise,
                        position,
                        id,
                        located(format!("malformed record: {}", e)),
                    ));
                    continue;
                }
            };

            if !seen.insert(definition.id.clone()) {
                problems.push(RecordProblem::new(
                    DefinitionKind::Exercise,
                    position,
                    Some(definition.id),
                    located("duplicate id".to_string()),
                ));
                continue;
            }

            self.definitions.push(definition);
        }
    }

    pub fn push(&mut self, definition: ExerciseDefinition) {
        self.definitions.push(definition);
    }

    pub fn definitions(&self) -> &[ExerciseDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ExerciseDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// The first variant matching topic/level/type and the given context.
    ///
    /// With no context (or a blank one), only context-agnostic variants match.
    pub fn find_exact(
        &self,
        topic: &str,
        level: &str,
        exercise_type: &str,
        context: Option<&str>,
    ) -> Option<&ExerciseDefinition> {
        let context = context.map(str::trim).filter(|c| !c.is_empty());
        self.definitions
            .iter()
            .filter(|d| d.matches(topic, level, exercise_type))
            .find(|d| match context {
                Some(context) => d.targets_context(context),
                None => d.context.as_deref().is_none_or(|c| c.trim().is_empty()),
            })
    }

    /// The first registered variant matching topic/level/type, whatever its context.
    pub fn find_variant(
        &self,
        topic: &str,
        level: &str,
        exercise_type: &str,
    ) -> Option<&ExerciseDefinition> {
        self.definitions
            .iter()
            .find(|d| d.matches(topic, level, exercise_type))
    }
}

fn split_records(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items,
        Value::Mapping(mut map) => {
            let wrapper = Value::String("exercises".to_string());
            if map.len() == 1 && map.contains_key(&wrapper) {
                split_records(map.remove(&wrapper).unwrap_or(Value::Null))
            } else {
                vec![Value::Mapping(map)]
            }
        }
        other => vec![other],
    }
}

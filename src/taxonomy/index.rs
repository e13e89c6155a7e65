//! Immutable, id-keyed taxonomy index.
//!
//! An index is built in one pass over every record a source provides. Bad
//! records do not stop the pass: each one becomes a [`RecordProblem`] and the
//! build fails once at the end with all of them.

use super::source::ConfigSource;
use super::types::{
    Definition, DefinitionKind, ExerciseTypeDefinition, SkillLevelDefinition, TopicDefinition,
};
use crate::error::{ConfigurationError, ExforgeError, RecordProblem, Result};
use crate::template::{PromptTemplateDefinition, TemplateCatalog};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};

/// Every definition loaded from one configuration snapshot.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyIndex {
    topics: Vec<TopicDefinition>,
    topic_ids: HashMap<String, usize>,
    levels: Vec<SkillLevelDefinition>,
    level_ids: HashMap<String, usize>,
    exercise_types: Vec<ExerciseTypeDefinition>,
    exercise_type_ids: HashMap<String, usize>,
    templates: TemplateCatalog,
}

impl TaxonomyIndex {
    /// Load every kind from `source` and build an index.
    ///
    /// # Errors
    ///
    /// * `Source` - the source could not provide a kind's records
    /// * `Configuration` - one or more records were malformed (all are listed)
    pub fn load(source: &dyn ConfigSource) -> Result<Self> {
        let topics = source.records(DefinitionKind::Topic)?;
        let levels = source.records(DefinitionKind::SkillLevel)?;
        let types = source.records(DefinitionKind::ExerciseType)?;
        let templates = source.records(DefinitionKind::Template)?;
        Self::from_records(topics, levels, types, templates)
    }

    /// Build an index from raw records of each kind.
    pub fn from_records(
        topics: Vec<Value>,
        levels: Vec<Value>,
        types: Vec<Value>,
        templates: Vec<Value>,
    ) -> Result<Self> {
        let mut problems = ConfigurationError::default();

        let topics: Vec<TopicDefinition> =
            decode_all(DefinitionKind::Topic, topics, &mut problems, |t: &TopicDefinition| {
                t.prerequisites
                    .iter()
                    .filter(|p| p.trim().is_empty())
                    .map(|_| "prerequisite ids must be non-empty".to_string())
                    .collect()
            });
        let levels: Vec<SkillLevelDefinition> = decode_all(
            DefinitionKind::SkillLevel,
            levels,
            &mut problems,
            |_: &SkillLevelDefinition| Vec::new(),
        );
        let types: Vec<ExerciseTypeDefinition> = decode_all(
            DefinitionKind::ExerciseType,
            types,
            &mut problems,
            |t: &ExerciseTypeDefinition| {
                if t.duration_multiplier.is_finite() && t.duration_multiplier > 0.0 {
                    Vec::new()
                } else {
                    vec![format!(
                        "duration_multiplier must be greater than 0 (found {})",
                        t.duration_multiplier
                    )]
                }
            },
        );
        let templates: Vec<PromptTemplateDefinition> = decode_all(
            DefinitionKind::Template,
            templates,
            &mut problems,
            |t: &PromptTemplateDefinition| {
                if t.sections.is_empty() {
                    vec!["template must declare at least one section".to_string()]
                } else {
                    Vec::new()
                }
            },
        );

        problems.into_result()?;

        let mut catalog = TemplateCatalog::with_builtins();
        for template in templates {
            catalog.insert(template);
        }

        Ok(Self {
            topic_ids: id_map(&topics, |t| &t.id),
            topics,
            level_ids: id_map(&levels, |l| &l.id),
            levels,
            exercise_type_ids: id_map(&types, |t| &t.id),
            exercise_types: types,
            templates: catalog,
        })
    }

    pub fn topic(&self, id: &str) -> Option<&TopicDefinition> {
        self.topic_ids.get(id).map(|&i| &self.topics[i])
    }

    pub fn level(&self, id: &str) -> Option<&SkillLevelDefinition> {
        self.level_ids.get(id).map(|&i| &self.levels[i])
    }

    pub fn exercise_type(&self, id: &str) -> Option<&ExerciseTypeDefinition> {
        self.exercise_type_ids
            .get(id)
            .map(|&i| &self.exercise_types[i])
    }

    pub fn template(&self, id: &str) -> Option<&PromptTemplateDefinition> {
        self.templates.get(id)
    }

    /// Look up any definition by kind and id.
    pub fn get(&self, kind: DefinitionKind, id: &str) -> Result<Definition> {
        let found = match kind {
            DefinitionKind::Topic => self.topic(id).cloned().map(Definition::Topic),
            DefinitionKind::SkillLevel => self.level(id).cloned().map(Definition::SkillLevel),
            DefinitionKind::ExerciseType => {
                self.exercise_type(id).cloned().map(Definition::ExerciseType)
            }
            DefinitionKind::Template => self.template(id).cloned().map(Definition::Template),
            DefinitionKind::Exercise => None,
        };
        found.ok_or_else(|| ExforgeError::NotFound {
            kind,
            id: id.to_string(),
        })
    }

    pub fn require_topic(&self, id: &str) -> Result<&TopicDefinition> {
        self.topic(id).ok_or_else(|| not_found(DefinitionKind::Topic, id))
    }

    pub fn require_level(&self, id: &str) -> Result<&SkillLevelDefinition> {
        self.level(id)
            .ok_or_else(|| not_found(DefinitionKind::SkillLevel, id))
    }

    pub fn require_exercise_type(&self, id: &str) -> Result<&ExerciseTypeDefinition> {
        self.exercise_type(id)
            .ok_or_else(|| not_found(DefinitionKind::ExerciseType, id))
    }

    /// Topics in configuration order.
    pub fn topics(&self) -> &[TopicDefinition] {
        &self.topics
    }

    /// Skill levels in configuration order.
    pub fn levels(&self) -> &[SkillLevelDefinition] {
        &self.levels
    }

    pub fn exercise_types(&self) -> &[ExerciseTypeDefinition] {
        &self.exercise_types
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    /// Topics offered at `level_id`, in configuration order.
    pub fn topics_for_level(&self, level_id: &str) -> Result<Vec<&TopicDefinition>> {
        self.require_level(level_id)?;
        Ok(self
            .topics
            .iter()
            .filter(|t| t.offered_at(level_id))
            .collect())
    }

    /// The level with the smallest rank strictly above `level_id`'s.
    pub fn next_level(&self, level_id: &str) -> Result<Option<&SkillLevelDefinition>> {
        let current = self.require_level(level_id)?;
        Ok(self
            .levels
            .iter()
            .filter(|l| l.rank > current.rank)
            .min_by_key(|l| l.rank))
    }

    /// A copy of this index with `topic` added or replaced.
    pub(crate) fn with_topic(&self, topic: TopicDefinition) -> Self {
        let mut next = self.clone();
        match next.topic_ids.get(&topic.id) {
            Some(&i) => next.topics[i] = topic,
            None => {
                next.topic_ids.insert(topic.id.clone(), next.topics.len());
                next.topics.push(topic);
            }
        }
        next
    }

    /// A copy of this index with `template` added or replaced.
    pub(crate) fn with_template(&self, template: PromptTemplateDefinition) -> Self {
        let mut next = self.clone();
        next.templates.insert(template);
        next
    }
}

fn not_found(kind: DefinitionKind, id: &str) -> ExforgeError {
    ExforgeError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn id_map<T>(items: &[T], id: impl Fn(&T) -> &String) -> HashMap<String, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (id(item).clone(), i))
        .collect()
}

/// Display-name field per kind; templates call it `name`.
fn name_fields(kind: DefinitionKind) -> &'static [&'static str] {
    match kind {
        DefinitionKind::Template => &["name"],
        _ => &["display_name", "name"],
    }
}

fn text_field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Decode every record of one kind, collecting problems instead of stopping.
fn decode_all<T, F>(
    kind: DefinitionKind,
    records: Vec<Value>,
    problems: &mut ConfigurationError,
    extra_checks: F,
) -> Vec<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Vec<String>,
{
    let mut decoded = Vec::with_capacity(records.len());
    let mut seen: HashSet<String> = HashSet::new();

    for (position, record) in records.into_iter().enumerate() {
        let id = text_field(&record, &["id"]).map(str::to_string);
        let has_name = text_field(&record, name_fields(kind)).is_some();

        if id.is_none() {
            problems.push(RecordProblem::new(kind, position, None, "missing id"));
        }
        if !has_name {
            problems.push(RecordProblem::new(
                kind,
                position,
                id.clone(),
                "missing display name",
            ));
        }
        let Some(id) = id else { continue };
        if !has_name {
            continue;
        }

        let item: T = match serde_yaml::from_value(record) {
            Ok(item) => item,
            Err(e) => {
                problems.push(RecordProblem::new(
                    kind,
                    position,
                    Some(id),
                    format!("malformed record: {}", e),
                ));
                continue;
            }
        };

        let failures = extra_checks(&item);
        if !failures.is_empty() {
            for reason in failures {
                problems.push(RecordProblem::new(kind, position, Some(id.clone()), reason));
            }
            continue;
        }

        if !seen.insert(id.clone()) {
            problems.push(RecordProblem::new(
                kind,
                position,
                Some(id),
                "duplicate id",
            ));
            continue;
        }

        decoded.push(item);
    }

    decoded
}

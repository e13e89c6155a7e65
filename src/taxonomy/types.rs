//! Taxonomy definition types.

use crate::template::PromptTemplateDefinition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of declarative records the crate loads.
///
/// The first four come from a taxonomy source; exercise definitions are
/// loaded separately by the bundle catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Topic,
    SkillLevel,
    ExerciseType,
    Template,
    Exercise,
}

impl DefinitionKind {
    /// Taxonomy kinds in load order.
    pub const ALL: [DefinitionKind; 4] = [
        DefinitionKind::Topic,
        DefinitionKind::SkillLevel,
        DefinitionKind::ExerciseType,
        DefinitionKind::Template,
    ];

    /// Key used for this kind in configuration files and documents.
    pub fn config_key(&self) -> &'static str {
        match self {
            DefinitionKind::Topic => "topics",
            DefinitionKind::SkillLevel => "skill_levels",
            DefinitionKind::ExerciseType => "exercise_types",
            DefinitionKind::Template => "templates",
            DefinitionKind::Exercise => "exercises",
        }
    }

    /// Parse a kind from its singular CLI name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "topic" => Some(Self::Topic),
            "level" | "skill_level" => Some(Self::SkillLevel),
            "type" | "exercise_type" => Some(Self::ExerciseType),
            "template" => Some(Self::Template),
            "exercise" => Some(Self::Exercise),
            _ => None,
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKind::Topic => write!(f, "topic"),
            DefinitionKind::SkillLevel => write!(f, "skill level"),
            DefinitionKind::ExerciseType => write!(f, "exercise type"),
            DefinitionKind::Template => write!(f, "template"),
            DefinitionKind::Exercise => write!(f, "exercise"),
        }
    }
}

/// A subject topic, e.g. "Fundamentals" or "Error Handling".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDefinition {
    pub id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default)]
    pub category: String,
    /// Topic ids that must be completed before this one.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Skill levels this topic is offered at. Empty means every level.
    #[serde(default)]
    pub levels: Vec<String>,
    /// Directory under the content store holding this topic's artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_path: Option<String>,
}

impl TopicDefinition {
    /// Content store prefix for this topic's artifact references.
    pub fn content_key(&self) -> &str {
        self.content_path.as_deref().unwrap_or(&self.id)
    }

    /// Whether the topic is offered at the given skill level.
    pub fn offered_at(&self, level_id: &str) -> bool {
        self.levels.is_empty() || self.levels.iter().any(|l| l == level_id)
    }
}

/// A learner skill level with its position in the progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLevelDefinition {
    pub id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    /// Progression rank; higher is more advanced.
    pub rank: u32,
    /// Average minutes an exercise at this level takes.
    #[serde(default = "default_average_minutes")]
    pub average_minutes: u32,
}

/// An exercise kind, e.g. "Implementation" or "Debugging".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseTypeDefinition {
    pub id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    /// Scales the level's average duration.
    #[serde(default = "default_duration_multiplier")]
    pub duration_multiplier: f64,
}

fn default_average_minutes() -> u32 {
    30
}

fn default_duration_multiplier() -> f64 {
    1.0
}

impl ExerciseTypeDefinition {
    /// Estimated minutes for this kind of exercise at the given level.
    pub fn estimate_minutes(&self, level: &SkillLevelDefinition) -> u32 {
        let minutes = (level.average_minutes as f64 * self.duration_multiplier).round();
        (minutes as u32).max(1)
    }
}

/// Any definition held by the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Topic(TopicDefinition),
    SkillLevel(SkillLevelDefinition),
    ExerciseType(ExerciseTypeDefinition),
    Template(PromptTemplateDefinition),
}

impl Definition {
    pub fn kind(&self) -> DefinitionKind {
        match self {
            Definition::Topic(_) => DefinitionKind::Topic,
            Definition::SkillLevel(_) => DefinitionKind::SkillLevel,
            Definition::ExerciseType(_) => DefinitionKind::ExerciseType,
            Definition::Template(_) => DefinitionKind::Template,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Definition::Topic(d) => &d.id,
            Definition::SkillLevel(d) => &d.id,
            Definition::ExerciseType(d) => &d.id,
            Definition::Template(d) => &d.id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Definition::Topic(d) => &d.display_name,
            Definition::SkillLevel(d) => &d.display_name,
            Definition::ExerciseType(d) => &d.display_name,
            Definition::Template(d) => &d.name,
        }
    }
}

//! Exercise definition and bundle types.
//!
//! # File Format
//!
//! ```yaml
//! id: fundamentals-implementation-beginner
//! topic: fundamentals
//! level: beginner
//! exercise_type: implementation
//! context: Personal productivity app
//! content:
//!   title: Task Tracker
//!   objectives: [Use structs, Use enums]
//!   problem_statement: Build a small task tracker.
//!   success_criteria: [All tests pass]
//! files:
//!   starter: task_tracker/starter.rs
//!   solution: task_tracker/solution.rs
//!   tests: task_tracker/tests.rs
//!   auxiliary:
//!     data.csv: task_tracker/data.csv
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Narrative content of an exercise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentBlock {
    pub title: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub prerequisites: Vec<String>,
    pub problem_statement: String,
    pub requirements: Vec<String>,
    pub success_criteria: Vec<String>,
    pub extension_challenges: Vec<String>,
    pub pitfalls: Vec<String>,
}

/// Named references into the content store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRefs {
    pub starter: Option<String>,
    pub solution: Option<String>,
    pub tests: Option<String>,
    pub project: Option<String>,
    /// Auxiliary file name -> reference.
    pub auxiliary: BTreeMap<String, String>,
}

/// A logical exercise: metadata, content and file references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    pub id: String,
    pub topic: String,
    pub level: String,
    pub exercise_type: String,
    /// Domain context this variant targets. `None` means context-agnostic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub content: ContentBlock,
    #[serde(default)]
    pub files: FileRefs,
}

impl ExerciseDefinition {
    /// Whether this variant matches the topic/level/type triple.
    pub fn matches(&self, topic: &str, level: &str, exercise_type: &str) -> bool {
        self.topic == topic && self.level == level && self.exercise_type == exercise_type
    }

    /// Whether this variant targets `context` (trimmed, case-insensitive).
    pub fn targets_context(&self, context: &str) -> bool {
        self.context
            .as_deref()
            .is_some_and(|c| c.trim().eq_ignore_ascii_case(context.trim()))
    }

    /// Short label for log lines: `topic/level/type`.
    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.topic, self.level, self.exercise_type)
    }
}

/// A fully materialized exercise, flat for external exporters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseBundle {
    pub title: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub prerequisites: Vec<String>,
    pub problem_statement: String,
    pub requirements: Vec<String>,
    pub success_criteria: Vec<String>,
    pub starter_code: String,
    pub solution_code: String,
    pub test_code: String,
    pub project_descriptor: String,
    pub auxiliary_files: BTreeMap<String, String>,
    pub extension_challenges: Vec<String>,
    pub pitfalls: Vec<String>,
    pub level: String,
    pub topic: String,
    pub exercise_type: String,
    pub context: String,
    pub duration_minutes: u32,
}

/// Why an optional artifact came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactProblem {
    Missing,
    TimedOut,
    Unreadable,
}

impl fmt::Display for ArtifactProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactProblem::Missing => write!(f, "missing"),
            ArtifactProblem::TimedOut => write!(f, "timed out"),
            ArtifactProblem::Unreadable => write!(f, "unreadable"),
        }
    }
}

/// A non-critical artifact that resolved to an empty body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactWarning {
    /// Artifact slot, e.g. `tests` or `auxiliary:data.csv`.
    pub artifact: String,
    pub reference: String,
    pub problem: ArtifactProblem,
}

impl fmt::Display for ArtifactWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} artifact '{}' is {}",
            self.artifact, self.reference, self.problem
        )
    }
}

/// How the definition was chosen for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantMatch {
    Exact,
    /// No variant for the requested context; a context-agnostic match was used.
    ContextFallback { requested: String },
}

/// A resolved bundle and the warnings collected while resolving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBundle {
    pub definition_id: String,
    pub bundle: ExerciseBundle,
    pub warnings: Vec<ArtifactWarning>,
    pub variant: VariantMatch,
}

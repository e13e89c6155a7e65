//! Error types for exforge.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use crate::graph::DependencyIssue;
use crate::taxonomy::DefinitionKind;
use std::fmt;
use thiserror::Error;

/// A single malformed record found while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordProblem {
    /// Which definition kind the record belongs to.
    pub kind: DefinitionKind,
    /// Position of the record in its source (0-based).
    pub position: usize,
    /// The record id, when one could be read.
    pub id: Option<String>,
    /// What is wrong with the record.
    pub reason: String,
}

impl RecordProblem {
    pub fn new(
        kind: DefinitionKind,
        position: usize,
        id: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            position,
            id,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RecordProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(
                f,
                "{} #{} ('{}'): {}",
                self.kind, self.position, id, self.reason
            ),
            None => write!(f, "{} #{}: {}", self.kind, self.position, self.reason),
        }
    }
}

/// Every malformed record found during one configuration load.
///
/// A load either succeeds completely or reports all of its problems at once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigurationError {
    pub problems: Vec<RecordProblem>,
}

impl ConfigurationError {
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn push(&mut self, problem: RecordProblem) {
        self.problems.push(problem);
    }

    /// Fold another load's problems into this one.
    pub fn extend(&mut self, other: ConfigurationError) {
        self.problems.extend(other.problems);
    }

    /// `Ok(())` when nothing was collected, otherwise the aggregate error.
    pub fn into_result(self) -> Result<()> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ExforgeError::Configuration(self))
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} malformed configuration record(s)",
            self.problems.len()
        )?;
        for problem in &self.problems {
            write!(f, "\n  - {}", problem)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationError {}

/// Main error type for exforge operations.
#[derive(Error, Debug, Clone)]
pub enum ExforgeError {
    /// User provided invalid arguments or settings.
    #[error("{0}")]
    UserError(String),

    /// One or more configuration records were malformed.
    #[error("invalid configuration: {0}")]
    Configuration(ConfigurationError),

    /// The configuration source itself could not be read.
    #[error("configuration source failed: {0}")]
    Source(String),

    /// A definition id is not present in the registry.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: DefinitionKind, id: String },

    /// The prerequisite graph is invalid and the caller treats that as fatal.
    #[error("prerequisite graph has {} problem(s): {}", .0.len(), format_issues(.0))]
    Dependency(Vec<DependencyIssue>),

    /// A critical artifact could not be read, so the bundle cannot be materialized.
    #[error("required artifact '{artifact}' could not be resolved from '{reference}': {reason}")]
    MissingRequiredArtifact {
        artifact: String,
        reference: String,
        reason: String,
    },

    /// The content store failed or rejected a reference.
    #[error("content store error: {0}")]
    Content(String),

    /// The bundle lacks content it cannot be shipped without.
    #[error("incomplete exercise bundle: {0}")]
    IncompleteBundle(String),

    /// No exercise definition matches the requested combination.
    #[error("no exercise definition for {0}")]
    NoMatchingExercise(String),

    /// A topic or library generator failed.
    #[error("generator failed: {0}")]
    Generator(String),

    /// No template with this id exists in the catalog.
    #[error("template '{0}' not found")]
    TemplateNotFound(String),

    /// Required template parameters are missing or empty.
    #[error("template validation failed; missing parameters: {}", .0.join(", "))]
    ValidationFailed(Vec<String>),

    /// The generation request itself is malformed.
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),
}

fn format_issues(issues: &[DependencyIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ExforgeError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExforgeError::UserError(_) | ExforgeError::InvalidRequest(_) => {
                exit_codes::USER_ERROR
            }
            ExforgeError::Configuration(_)
            | ExforgeError::Source(_)
            | ExforgeError::Dependency(_) => exit_codes::CONFIG_ERROR,
            ExforgeError::NotFound { .. } | ExforgeError::TemplateNotFound(_) => {
                exit_codes::NOT_FOUND
            }
            ExforgeError::ValidationFailed(_) => exit_codes::VALIDATION_FAILURE,
            ExforgeError::MissingRequiredArtifact { .. }
            | ExforgeError::Content(_)
            | ExforgeError::IncompleteBundle(_)
            | ExforgeError::NoMatchingExercise(_)
            | ExforgeError::Generator(_) => exit_codes::RESOLUTION_FAILURE,
        }
    }
}

impl From<ConfigurationError> for ExforgeError {
    fn from(err: ConfigurationError) -> Self {
        ExforgeError::Configuration(err)
    }
}

/// Result type alias for exforge operations.
pub type Result<T> = std::result::Result<T, ExforgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = ExforgeError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn validation_failed_has_correct_exit_code() {
        let err = ExforgeError::ValidationFailed(vec!["Topic".to_string()]);
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_FAILURE);
    }

    #[test]
    fn missing_artifact_has_correct_exit_code() {
        let err = ExforgeError::MissingRequiredArtifact {
            artifact: "starter".to_string(),
            reference: "a/starter.rs".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(err.exit_code(), exit_codes::RESOLUTION_FAILURE);
    }

    #[test]
    fn configuration_error_lists_every_problem() {
        let mut err = ConfigurationError::default();
        err.push(RecordProblem::new(
            DefinitionKind::Topic,
            0,
            None,
            "missing id",
        ));
        err.push(RecordProblem::new(
            DefinitionKind::SkillLevel,
            2,
            Some("expert".to_string()),
            "missing display name",
        ));

        let msg = ExforgeError::from(err).to_string();
        assert!(msg.contains("2 malformed configuration record(s)"));
        assert!(msg.contains("topic #0: missing id"));
        assert!(msg.contains("skill level #2 ('expert'): missing display name"));
    }

    #[test]
    fn empty_configuration_error_is_ok() {
        assert!(ConfigurationError::default().into_result().is_ok());
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = ExforgeError::ValidationFailed(vec![
            "EstimatedMinutes".to_string(),
            "Context".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "template validation failed; missing parameters: EstimatedMinutes, Context"
        );

        let err = ExforgeError::NotFound {
            kind: DefinitionKind::ExerciseType,
            id: "golf".to_string(),
        };
        assert_eq!(err.to_string(), "exercise type 'golf' not found");
    }
}

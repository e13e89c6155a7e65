//! Generation requests and results.

use crate::bundle::ExerciseBundle;
use crate::error::{ExforgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Persona the prompt should be written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorPersona {
    pub name: String,
    pub style: String,
}

/// What the caller wants generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic_id: String,
    pub level_id: String,
    pub exercise_type_id: String,
    /// Free-form domain context. Empty means the configured default.
    #[serde(default)]
    pub context: String,
    #[serde(default = "default_true")]
    pub include_tests: bool,
    #[serde(default = "default_true")]
    pub include_extensions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor: Option<MentorPersona>,
    /// Prompt template to use instead of the level-based choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// Extra name -> text parameters for custom templates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl GenerationRequest {
    pub fn new(
        topic_id: impl Into<String>,
        level_id: impl Into<String>,
        exercise_type_id: impl Into<String>,
    ) -> Self {
        Self {
            topic_id: topic_id.into(),
            level_id: level_id.into(),
            exercise_type_id: exercise_type_id.into(),
            context: String::new(),
            include_tests: true,
            include_extensions: true,
            mentor: None,
            template_id: None,
            extras: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }

    pub fn with_extensions(mut self, include: bool) -> Self {
        self.include_extensions = include;
        self
    }

    pub fn with_mentor(mut self, name: impl Into<String>, style: impl Into<String>) -> Self {
        self.mentor = Some(MentorPersona {
            name: name.into(),
            style: style.into(),
        });
        self
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(name.into(), value.into());
        self
    }

    /// `topic/level/type` label for logs and events.
    pub fn label(&self) -> String {
        format!(
            "{}/{}/{}",
            self.topic_id, self.level_id, self.exercise_type_id
        )
    }

    /// Reject requests with blank ids.
    pub fn check_shape(&self) -> Result<()> {
        let blank: Vec<&str> = [
            ("topic", &self.topic_id),
            ("level", &self.level_id),
            ("exercise type", &self.exercise_type_id),
        ]
        .into_iter()
        .filter(|(_, id)| id.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if blank.is_empty() {
            Ok(())
        } else {
            Err(ExforgeError::InvalidRequest(format!(
                "{} id must not be empty",
                blank.join(", ")
            )))
        }
    }
}

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Direct,
    Library,
    #[serde(rename = "AI-Prompt")]
    AiPrompt,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Direct => write!(f, "Direct"),
            Provenance::Library => write!(f, "Library"),
            Provenance::AiPrompt => write!(f, "AI-Prompt"),
        }
    }
}

/// A generated exercise, or a prompt wrapped in a stub bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub provenance: Provenance,
    pub bundle: ExerciseBundle,
    /// Rendered prompt text when provenance is AI-Prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Template that produced `prompt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// Everything that degraded along the way.
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_serializes_with_display_names() {
        assert_eq!(serde_json::to_string(&Provenance::Direct).unwrap(), "\"Direct\"");
        assert_eq!(
            serde_json::to_string(&Provenance::AiPrompt).unwrap(),
            "\"AI-Prompt\""
        );
        assert_eq!(Provenance::AiPrompt.to_string(), "AI-Prompt");
    }

    #[test]
    fn test_blank_ids_are_rejected_together() {
        let err = GenerationRequest::new(" ", "beginner", "")
            .check_shape()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid generation request: topic, exercise type id must not be empty"
        );
    }

    #[test]
    fn test_request_defaults_from_yaml() {
        let request: GenerationRequest = serde_yaml::from_str(
            "topic_id: fundamentals\nlevel_id: beginner\nexercise_type_id: implementation\n",
        )
        .unwrap();

        assert!(request.include_tests);
        assert!(request.include_extensions);
        assert_eq!(request.context, "");
        assert_eq!(request.label(), "fundamentals/beginner/implementation");
    }
}

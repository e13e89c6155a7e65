//! Prompt template definitions.
//!
//! # File Format
//!
//! ```yaml
//! templates:
//!   - id: reviewExercise
//!     name: Code review exercise
//!     version: "1.2"
//!     required_parameters: [Topic, Level, Context]
//!     structured_parameters:
//!       Mentor: [Name, Style]
//!     sections:
//!       - title: Context
//!         body: "Write a review exercise on {{Topic}} for a {{Level}} learner."
//!       - title: Mentor
//!         body: "Speak as {{Mentor.Name}} ({{Mentor.Style}})."
//!         when:
//!           present: [Mentor]
//! ```

use super::params::TemplateParams;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parameterized, multi-section prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplateDefinition {
    pub id: String,
    /// Human-readable template name.
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Sections rendered in declared order.
    #[serde(default)]
    pub sections: Vec<TemplateSection>,
    /// Parameters that must be present and non-empty before rendering.
    #[serde(default)]
    pub required_parameters: Vec<String>,
    /// Structured parameters and the sub-fields each must carry to count as present.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub structured_parameters: BTreeMap<String, Vec<String>>,
    /// Whether free-form extra parameters are accepted (custom templates).
    #[serde(default)]
    pub accepts_extras: bool,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl PromptTemplateDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: default_version(),
            sections: Vec::new(),
            required_parameters: Vec::new(),
            structured_parameters: BTreeMap::new(),
            accepts_extras: false,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_section(mut self, section: TemplateSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_parameters
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_structured<I, S>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.structured_parameters
            .insert(name.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn accepting_extras(mut self) -> Self {
        self.accepts_extras = true;
        self
    }

    /// Whether `name` is present under this template's rules.
    ///
    /// A declared structured parameter counts only when every required
    /// sub-field is non-empty; anything else counts when its text is non-empty.
    pub fn is_present(&self, name: &str, params: &TemplateParams) -> bool {
        match self.structured_parameters.get(name) {
            Some(fields) => params.has_complete_structure(name, fields),
            None => params.has_text(name, self.accepts_extras),
        }
    }
}

/// One section of a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSection {
    /// Section title, rendered as a delimiter line when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Literal text with `{{Name}}` / `{{Name.Field}}` placeholders.
    pub body: String,
    /// Inclusion predicate; a section without one is always rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<SectionCondition>,
}

impl TemplateSection {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: body.into(),
            when: None,
        }
    }

    pub fn untitled(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: body.into(),
            when: None,
        }
    }

    pub fn when(mut self, condition: SectionCondition) -> Self {
        self.when = Some(condition);
        self
    }
}

/// Conjunctive inclusion predicate over the parameter set.
///
/// Every listed requirement must hold for the section to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionCondition {
    /// Parameters that must be present.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub present: Vec<String>,
    /// Parameters that must be absent or empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub absent: Vec<String>,
    /// Parameters whose text must be truthy (`true`, `yes`, `1`, `on`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    /// Parameters whose text must equal the given value (case-insensitive).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub equals: BTreeMap<String, String>,
}

impl SectionCondition {
    pub fn present(name: impl Into<String>) -> Self {
        Self {
            present: vec![name.into()],
            ..Default::default()
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            absent: vec![name.into()],
            ..Default::default()
        }
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            flags: vec![name.into()],
            ..Default::default()
        }
    }

    /// Evaluate the predicate for one template and parameter set.
    pub fn holds(&self, template: &PromptTemplateDefinition, params: &TemplateParams) -> bool {
        let accepts_extras = template.accepts_extras;

        self.present
            .iter()
            .all(|name| template.is_present(name, params))
            && self
                .absent
                .iter()
                .all(|name| !template.is_present(name, params))
            && self.flags.iter().all(|name| {
                params
                    .text(name, accepts_extras)
                    .is_some_and(is_truthy)
            })
            && self.equals.iter().all(|(name, expected)| {
                params
                    .text(name, accepts_extras)
                    .is_some_and(|actual| actual.trim().eq_ignore_ascii_case(expected.trim()))
            })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1" | "on"
    )
}

//! Template catalog: validation and multi-section rendering.

use super::builtin;
use super::engine::substitute;
use super::params::TemplateParams;
use super::types::PromptTemplateDefinition;
use crate::error::{ExforgeError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Outcome of checking a parameter set against a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateValidation {
    pub is_valid: bool,
    /// Every missing or empty required parameter, in declared order.
    pub missing_parameter_names: Vec<String>,
}

impl TemplateValidation {
    pub fn pass() -> Self {
        Self {
            is_valid: true,
            missing_parameter_names: Vec::new(),
        }
    }

    pub fn fail(missing_parameter_names: Vec<String>) -> Self {
        Self {
            is_valid: false,
            missing_parameter_names,
        }
    }

    /// Convert into a `Result`, failing with `ValidationFailed`.
    pub fn into_result(self) -> Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(ExforgeError::ValidationFailed(self.missing_parameter_names))
        }
    }
}

/// A rendered prompt together with tokens that could not be substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub template_id: String,
    pub template_version: String,
    pub text: String,
    /// Token names left literal in `text`.
    pub unresolved: Vec<String>,
}

/// Prompt templates keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, PromptTemplateDefinition>,
}

impl TemplateCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the built-in templates.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for template in builtin::builtin_templates() {
            catalog.insert(template);
        }
        catalog
    }

    /// Insert or replace a template, returning the previous one with that id.
    pub fn insert(&mut self, template: PromptTemplateDefinition) -> Option<PromptTemplateDefinition> {
        self.templates.insert(template.id.clone(), template)
    }

    pub fn get(&self, id: &str) -> Option<&PromptTemplateDefinition> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptTemplateDefinition> {
        self.templates.values()
    }

    fn require(&self, id: &str) -> Result<&PromptTemplateDefinition> {
        self.get(id)
            .ok_or_else(|| ExforgeError::TemplateNotFound(id.to_string()))
    }

    /// Check `params` against the template's required parameters.
    ///
    /// All missing names are collected in one pass rather than stopping at
    /// the first.
    pub fn validate(&self, template_id: &str, params: &TemplateParams) -> Result<TemplateValidation> {
        let template = self.require(template_id)?;
        Ok(validate_template(template, params))
    }

    /// Render a template to text.
    ///
    /// # Errors
    ///
    /// * `TemplateNotFound` - no template with this id
    /// * `ValidationFailed` - required parameters are missing or empty
    pub fn render(&self, template_id: &str, params: &TemplateParams) -> Result<String> {
        self.render_report(template_id, params).map(|r| r.text)
    }

    /// Render a template and report unresolved tokens.
    pub fn render_report(&self, template_id: &str, params: &TemplateParams) -> Result<RenderedPrompt> {
        let template = self.require(template_id)?;
        validate_template(template, params).into_result()?;
        Ok(render_template(template, params))
    }
}

/// Validate a parameter set against a single template.
pub fn validate_template(
    template: &PromptTemplateDefinition,
    params: &TemplateParams,
) -> TemplateValidation {
    let missing: Vec<String> = template
        .required_parameters
        .iter()
        .filter(|name| !template.is_present(name, params))
        .cloned()
        .collect();

    if missing.is_empty() {
        TemplateValidation::pass()
    } else {
        TemplateValidation::fail(missing)
    }
}

/// Render without validating. Callers go through [`TemplateCatalog::render`].
fn render_template(template: &PromptTemplateDefinition, params: &TemplateParams) -> RenderedPrompt {
    let mut blocks: Vec<String> = Vec::with_capacity(template.sections.len());
    let mut unresolved: Vec<String> = Vec::new();

    for section in &template.sections {
        if let Some(condition) = &section.when
            && !condition.holds(template, params)
        {
            continue;
        }

        let body = substitute(&section.body, params, template.accepts_extras);
        for token in body.unresolved {
            if !unresolved.contains(&token) {
                unresolved.push(token);
            }
        }

        let body_text = body.text.trim_end();
        let block = match &section.title {
            Some(title) => format!("=== {} ===\n{}", title, body_text),
            None => body_text.to_string(),
        };
        blocks.push(block);
    }

    if !unresolved.is_empty() {
        warn!(
            template = %template.id,
            tokens = %unresolved.join(", "),
            "unresolved placeholders left in rendered prompt"
        );
    }

    let mut text = blocks.join("\n\n");
    text.push('\n');

    RenderedPrompt {
        template_id: template.id.clone(),
        template_version: template.version.clone(),
        text,
        unresolved,
    }
}

//! Prompt template rendering.
//!
//! This module provides:
//!
//! - **Types**: Template definitions, sections and inclusion predicates
//! - **Params**: Text and structured parameter sets
//! - **Engine**: `{{Name}}` placeholder substitution
//! - **Catalog**: Validation and multi-section rendering by template id
//! - **Builtin**: Templates that are always available
//!
//! # Template Syntax
//!
//! ```text
//! === Context ===
//! You are designing a programming exercise for a {{Level}} learner studying {{Topic}}.
//!
//! === Mentor ===
//! Write in the voice of {{Mentor.Name}}.
//! ```
//!
//! Sections whose inclusion predicate is false are dropped entirely.

pub mod builtin;
mod catalog;
mod engine;
mod params;
mod types;

#[cfg(test)]
mod tests;

pub use catalog::{RenderedPrompt, TemplateCatalog, TemplateValidation, validate_template};
pub use engine::{Substitution, placeholders, substitute};
pub use params::{ParamValue, TemplateParams, params};
pub use types::{PromptTemplateDefinition, SectionCondition, TemplateSection};

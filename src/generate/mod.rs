//! Exercise generation with staged fallback.
//!
//! This module provides:
//!
//! - **Request**: What the caller asks for and what comes back
//! - **Strategy**: Per-topic generators and the curated library
//! - **Validity**: The structural check every produced bundle must pass
//! - **Orchestrator**: Runs the stages in order and falls back to a prompt

mod orchestrator;
mod request;
mod strategy;
mod validity;


pub use orchestrator::{
    Curriculum, CurriculumEntry, DEFAULT_CONTEXT, Orchestrator, OrchestratorSettings, PROMPT_FILE,
    SkippedTopic, Stage,
};
pub use request::{GenerationRequest, GenerationResult, MentorPersona, Provenance};
pub use strategy::{
    CatalogTopicGenerator, CuratedLibrary, Generated, GeneratorRegistry, LibraryGenerator,
    TopicGenerator,
};
pub use validity::{ValidityReport, check_structure, has_code};

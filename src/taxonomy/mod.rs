//! Taxonomy definitions and the registry that serves them.
//!
//! Topics, skill levels, exercise types and prompt templates are loaded from a
//! [`ConfigSource`] into an immutable [`TaxonomyIndex`]. The
//! [`TaxonomyRegistry`] shares that index as an `Arc` snapshot and swaps it
//! whole on reload or registration.

mod cache;
mod index;
mod registry;
mod source;
mod types;


pub use cache::SnapshotCache;
pub use index::TaxonomyIndex;
pub use registry::TaxonomyRegistry;
pub use source::{ConfigSource, YamlDirectorySource, YamlDocumentSource};
pub use types::{
    Definition, DefinitionKind, ExerciseTypeDefinition, SkillLevelDefinition, TopicDefinition,
};

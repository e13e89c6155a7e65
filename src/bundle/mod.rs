//! Exercise bundles: definitions, content stores and resolution.
//!
//! This module provides:
//!
//! - **Types**: Exercise definitions, flat bundles and artifact warnings
//! - **Store**: Filesystem, in-memory and prefixed content stores
//! - **Catalog**: Exercise definitions loaded from YAML
//! - **Resolver**: Parallel artifact reads with a total timeout
//!
//! A bundle needs a non-empty starter artifact and problem statement. Every
//! other artifact degrades to an empty body with a recorded warning.

mod catalog;
pub mod resolver;
mod store;
mod types;

#[cfg(test)]
mod tests;

pub use catalog::DefinitionCatalog;
pub use resolver::{BundleResolver, DEFAULT_RESOLVE_TIMEOUT};
pub use store::{ContentStore, FsContentStore, MemoryContentStore, PrefixedStore};
pub use types::{
    ArtifactProblem, ArtifactWarning, ContentBlock, ExerciseBundle, ExerciseDefinition, FileRefs,
    ResolvedBundle, VariantMatch,
};

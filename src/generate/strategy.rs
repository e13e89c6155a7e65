//! Generation strategies: per-topic generators and the curated library.

use super::request::GenerationRequest;
use crate::bundle::{
    BundleResolver, ContentStore, DefinitionCatalog, ExerciseBundle, PrefixedStore,
    ResolvedBundle, VariantMatch,
};
use crate::error::{ExforgeError, Result};
use crate::taxonomy::TaxonomyIndex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A bundle produced by a strategy, with anything that degraded on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generated {
    pub bundle: ExerciseBundle,
    pub warnings: Vec<String>,
}

impl From<ExerciseBundle> for Generated {
    fn from(bundle: ExerciseBundle) -> Self {
        Self {
            bundle,
            warnings: Vec::new(),
        }
    }
}

impl From<ResolvedBundle> for Generated {
    fn from(resolved: ResolvedBundle) -> Self {
        let mut warnings: Vec<String> = Vec::new();
        if let VariantMatch::ContextFallback { requested } = &resolved.variant {
            warnings.push(format!(
                "no '{}' variant of exercise '{}'; used its context-agnostic match",
                requested, resolved.definition_id
            ));
        }
        warnings.extend(resolved.warnings.iter().map(|w| w.to_string()));
        Self {
            bundle: resolved.bundle,
            warnings,
        }
    }
}

/// Generates exercises for one topic.
pub trait TopicGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest, taxonomy: &TaxonomyIndex) -> Result<Generated>;
}

/// Generates exercises from a broader set of curated examples.
pub trait LibraryGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest, taxonomy: &TaxonomyIndex) -> Result<Generated>;
}

/// Topic id -> generator, filled explicitly at startup.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Arc<dyn TopicGenerator>>,
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("topics", &self.topic_ids())
            .finish()
    }
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `generator` for `topic_id`, replacing any previous one.
    pub fn register(&mut self, topic_id: impl Into<String>, generator: Arc<dyn TopicGenerator>) {
        self.generators.insert(topic_id.into(), generator);
    }

    pub fn with(mut self, topic_id: impl Into<String>, generator: Arc<dyn TopicGenerator>) -> Self {
        self.register(topic_id, generator);
        self
    }

    pub fn get(&self, topic_id: &str) -> Option<&Arc<dyn TopicGenerator>> {
        self.generators.get(topic_id)
    }

    pub fn contains(&self, topic_id: &str) -> bool {
        self.generators.contains_key(topic_id)
    }

    /// Registered topic ids, sorted.
    pub fn topic_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

/// Direct generator backed by exercise definitions.
///
/// Artifact references are resolved under the topic's content path. A
/// request whose context has no dedicated variant falls back to the first
/// variant for the same topic, level and type.
#[derive(Clone)]
pub struct CatalogTopicGenerator {
    catalog: Arc<DefinitionCatalog>,
    store: Arc<dyn ContentStore>,
    timeout: Duration,
}

impl CatalogTopicGenerator {
    pub fn new(
        catalog: Arc<DefinitionCatalog>,
        store: Arc<dyn ContentStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            store,
            timeout,
        }
    }

    /// One generator per topic that has at least one definition in `catalog`.
    pub fn registry_for(
        catalog: Arc<DefinitionCatalog>,
        store: Arc<dyn ContentStore>,
        timeout: Duration,
    ) -> GeneratorRegistry {
        let generator: Arc<dyn TopicGenerator> =
            Arc::new(Self::new(Arc::clone(&catalog), store, timeout));
        let mut registry = GeneratorRegistry::new();
        for definition in catalog.definitions() {
            if !registry.contains(&definition.topic) {
                registry.register(definition.topic.clone(), Arc::clone(&generator));
            }
        }
        registry
    }
}

impl TopicGenerator for CatalogTopicGenerator {
    fn generate(&self, request: &GenerationRequest, taxonomy: &TaxonomyIndex) -> Result<Generated> {
        let content_key = taxonomy
            .topic(&request.topic_id)
            .map(|topic| topic.content_key().to_string())
            .unwrap_or_else(|| request.topic_id.clone());
        let store: Arc<dyn ContentStore> =
            Arc::new(PrefixedStore::new(content_key, Arc::clone(&self.store)));
        let resolver = BundleResolver::new(store).with_timeout(self.timeout);

        resolver
            .resolve_from(
                &self.catalog,
                &request.topic_id,
                &request.level_id,
                &request.exercise_type_id,
                Some(request.context.as_str()),
            )
            .map(Generated::from)
    }
}

/// Library generator that only accepts an exact topic/level/type/context match.
///
/// References are resolved against the library store root.
#[derive(Clone)]
pub struct CuratedLibrary {
    catalog: Arc<DefinitionCatalog>,
    resolver: BundleResolver,
}

impl CuratedLibrary {
    pub fn new(
        catalog: Arc<DefinitionCatalog>,
        store: Arc<dyn ContentStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            resolver: BundleResolver::new(store).with_timeout(timeout),
        }
    }
}

impl LibraryGenerator for CuratedLibrary {
    fn generate(&self, request: &GenerationRequest, _taxonomy: &TaxonomyIndex) -> Result<Generated> {
        let definition = self
            .catalog
            .find_exact(
                &request.topic_id,
                &request.level_id,
                &request.exercise_type_id,
                Some(request.context.as_str()),
            )
            .ok_or_else(|| {
                ExforgeError::NoMatchingExercise(format!(
                    "{} in context '{}'",
                    request.label(),
                    request.context
                ))
            })?;

        self.resolver.resolve(definition).map(Generated::from)
    }
}

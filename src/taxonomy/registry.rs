//! Shared, lazily loaded taxonomy registry.

use super::cache::SnapshotCache;
use super::index::TaxonomyIndex;
use super::source::ConfigSource;
use super::types::{Definition, DefinitionKind, SkillLevelDefinition, TopicDefinition};
use crate::error::{ExforgeError, Result};
use crate::template::PromptTemplateDefinition;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Taxonomy registry backed by a [`ConfigSource`].
///
/// The index is loaded on first access. Concurrent first callers share one
/// load. Readers hold an `Arc<TaxonomyIndex>` and are never affected by a
/// later reload or registration.
pub struct TaxonomyRegistry {
    source: Arc<dyn ConfigSource>,
    cache: SnapshotCache<TaxonomyIndex>,
}

impl std::fmt::Debug for TaxonomyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyRegistry")
            .field("source", &self.source.describe())
            .finish_non_exhaustive()
    }
}

impl TaxonomyRegistry {
    /// Registry whose snapshot never expires on its own.
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self::with_ttl(source, None)
    }

    /// Registry whose snapshot is reloaded once `ttl` has elapsed.
    pub fn with_ttl(source: Arc<dyn ConfigSource>, ttl: Option<Duration>) -> Self {
        Self {
            source,
            cache: SnapshotCache::new(ttl),
        }
    }

    fn load_index(&self) -> Result<TaxonomyIndex> {
        debug!(source = %self.source.describe(), "loading taxonomy");
        let index = TaxonomyIndex::load(self.source.as_ref())?;
        info!(
            topics = index.topics().len(),
            levels = index.levels().len(),
            exercise_types = index.exercise_types().len(),
            templates = index.templates().len(),
            "taxonomy loaded"
        );
        Ok(index)
    }

    /// Build a fresh index and swap it in.
    ///
    /// On failure the previous snapshot, if any, stays in place.
    pub fn load_all(&self) -> Result<Arc<TaxonomyIndex>> {
        self.cache.refresh(|| self.load_index())
    }

    /// The current index, loading it if missing or stale.
    pub fn snapshot(&self) -> Result<Arc<TaxonomyIndex>> {
        self.cache.get_or_load(|| self.load_index())
    }

    /// Mark the snapshot stale; the next access reloads it.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn get(&self, kind: DefinitionKind, id: &str) -> Result<Definition> {
        self.snapshot()?.get(kind, id)
    }

    /// Topics offered at a level, in configuration order.
    pub fn topics_for_level(&self, level_id: &str) -> Result<Vec<TopicDefinition>> {
        let index = self.snapshot()?;
        Ok(index
            .topics_for_level(level_id)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// The next level up from `level_id`, or `None` at the top.
    pub fn next_level(&self, level_id: &str) -> Result<Option<SkillLevelDefinition>> {
        let index = self.snapshot()?;
        Ok(index.next_level(level_id)?.cloned())
    }

    /// Add or replace a topic in the current snapshot.
    ///
    /// Prerequisite references are not checked here; run the dependency
    /// graph over the new snapshot for that.
    pub fn register_topic(&self, topic: TopicDefinition) -> Result<Arc<TaxonomyIndex>> {
        if topic.id.trim().is_empty() {
            return Err(ExforgeError::InvalidRequest(
                "topic id must not be empty".to_string(),
            ));
        }
        self.snapshot()?;
        self.cache
            .update(|index| index.with_topic(topic))
            .ok_or_else(|| ExforgeError::Source("taxonomy snapshot unavailable".to_string()))
    }

    /// Add or replace a prompt template in the current snapshot.
    pub fn register_template(
        &self,
        template: PromptTemplateDefinition,
    ) -> Result<Arc<TaxonomyIndex>> {
        if template.id.trim().is_empty() {
            return Err(ExforgeError::InvalidRequest(
                "template id must not be empty".to_string(),
            ));
        }
        if template.sections.is_empty() {
            return Err(ExforgeError::InvalidRequest(format!(
                "template '{}' must declare at least one section",
                template.id
            )));
        }
        self.snapshot()?;
        self.cache
            .update(|index| index.with_template(template))
            .ok_or_else(|| ExforgeError::Source("taxonomy snapshot unavailable".to_string()))
    }
}

//! Wiring from a loaded [`Config`] to the registry and orchestrator.

use crate::bundle::{ContentStore, DefinitionCatalog, FsContentStore};
use crate::config::Config;
use crate::error::Result;
use crate::events::{EventSink, NdjsonEventLog};
use crate::generate::{CatalogTopicGenerator, CuratedLibrary, Orchestrator};
use crate::taxonomy::{ConfigSource, TaxonomyRegistry, YamlDirectorySource};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything a command needs, built once per invocation.
pub struct Runtime {
    pub config: Config,
    pub registry: Arc<TaxonomyRegistry>,
}

impl Runtime {
    pub fn new(config: Config) -> Self {
        let source: Arc<dyn ConfigSource> =
            Arc::new(YamlDirectorySource::new(config.taxonomy_path()));
        let registry = Arc::new(TaxonomyRegistry::with_ttl(source, config.cache_ttl()));
        Self { config, registry }
    }

    /// Build the orchestrator with every configured stage.
    ///
    /// A missing exercises directory leaves the direct stage empty; a broken
    /// one is an error.
    pub fn orchestrator(&self) -> Result<Orchestrator> {
        let timeout = self.config.resolve_timeout();

        let catalog = Arc::new(load_catalog_if_present(&self.config.exercises_path())?);
        let store: Arc<dyn ContentStore> = Arc::new(FsContentStore::new(self.config.content_path()));
        let generators = CatalogTopicGenerator::registry_for(catalog, store, timeout);
        debug!(topics = ?generators.topic_ids(), "direct generators registered");

        let mut orchestrator = Orchestrator::new(Arc::clone(&self.registry))
            .with_generators(generators)
            .with_settings(self.config.orchestrator_settings());

        if let Some(library_dir) = self.config.library_path() {
            let library_catalog = Arc::new(load_catalog_if_present(&library_dir)?);
            let library_store: Arc<dyn ContentStore> = Arc::new(FsContentStore::new(&library_dir));
            orchestrator = orchestrator.with_library(Arc::new(CuratedLibrary::new(
                library_catalog,
                library_store,
                timeout,
            )));
        }

        if let Some(events_path) = self.config.events_path() {
            let sink: Arc<dyn EventSink> = Arc::new(NdjsonEventLog::new(events_path));
            orchestrator = orchestrator.with_events(sink);
        }

        Ok(orchestrator)
    }
}

fn load_catalog_if_present(dir: &Path) -> Result<DefinitionCatalog> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "exercise directory not found; no curated exercises");
        return Ok(DefinitionCatalog::new());
    }
    DefinitionCatalog::load_dir(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{GenerationRequest, Provenance};
    use std::fs;
    use tempfile::TempDir;

    fn write_workspace(root: &Path) {
        let taxonomy = root.join("taxonomy");
        fs::create_dir_all(&taxonomy).unwrap();
        fs::write(
            taxonomy.join("topics.yaml"),
            "- id: fundamentals\n  display_name: Fundamentals\n",
        )
        .unwrap();
        fs::write(
            taxonomy.join("skill_levels.yaml"),
            "- id: beginner\n  display_name: Beginner\n  rank: 1\n",
        )
        .unwrap();
        fs::write(
            taxonomy.join("exercise_types.yaml"),
            "- id: implementation\n  display_name: Implementation\n",
        )
        .unwrap();

        let exercises = root.join("exercises");
        fs::create_dir_all(&exercises).unwrap();
        fs::write(
            exercises.join("fundamentals.yaml"),
            r#"
- id: tracker
  topic: fundamentals
  level: beginner
  exercise_type: implementation
  content:
    title: Task Tracker
    objectives: [Use structs]
    problem_statement: Build a task tracker.
    success_criteria: [Tests pass]
  files:
    starter: tracker/starter.rs
    solution: tracker/solution.rs
"#,
        )
        .unwrap();

        let content = root.join("content").join("fundamentals").join("tracker");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("starter.rs"), "pub struct Task;\n").unwrap();
        fs::write(content.join("solution.rs"), "pub struct Task { pub done: bool }\n").unwrap();
    }

    #[test]
    fn test_runtime_generates_from_disk() {
        let dir = TempDir::new().unwrap();
        write_workspace(dir.path());
        let mut config = Config {
            events_file: Some("events.ndjson".to_string()),
            ..Config::default()
        };
        config.resolve_paths(dir.path());

        let runtime = Runtime::new(config);
        let result = runtime
            .orchestrator()
            .unwrap()
            .generate(&GenerationRequest::new("fundamentals", "beginner", "implementation"))
            .unwrap();

        assert_eq!(result.provenance, Provenance::Direct);
        assert_eq!(result.bundle.starter_code, "pub struct Task;\n");

        let events = crate::events::read_events(dir.path().join("events.ndjson")).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_missing_exercises_dir_falls_through_to_prompt() {
        let dir = TempDir::new().unwrap();
        write_workspace(dir.path());
        fs::remove_dir_all(dir.path().join("exercises")).unwrap();
        let mut config = Config::default();
        config.resolve_paths(dir.path());

        let result = Runtime::new(config)
            .orchestrator()
            .unwrap()
            .generate(&GenerationRequest::new("fundamentals", "beginner", "implementation"))
            .unwrap();

        assert_eq!(result.provenance, Provenance::AiPrompt);
    }
}

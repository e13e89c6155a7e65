//! Tests for exercise definition loading and bundle resolution.

use super::*;
use crate::error::{ExforgeError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

// =========================================================================
// Helper functions
// =========================================================================

fn definition() -> ExerciseDefinition {
    ExerciseDefinition {
        id: "tracker".to_string(),
        topic: "fundamentals".to_string(),
        level: "beginner".to_string(),
        exercise_type: "implementation".to_string(),
        context: Some("Personal productivity app".to_string()),
        duration_minutes: Some(25),
        content: ContentBlock {
            title: "Task Tracker".to_string(),
            objectives: vec!["Model tasks with structs".to_string()],
            problem_statement: "Build a task tracker.".to_string(),
            success_criteria: vec!["All tests pass".to_string()],
            ..ContentBlock::default()
        },
        files: FileRefs {
            starter: Some("tracker/starter.rs".to_string()),
            solution: Some("tracker/solution.rs".to_string()),
            tests: Some("tracker/tests.rs".to_string()),
            project: None,
            auxiliary: BTreeMap::from([("tasks.csv".to_string(), "tracker/tasks.csv".to_string())]),
        },
    }
}

fn full_store() -> MemoryContentStore {
    MemoryContentStore::new()
        .with("tracker/starter.rs", "pub struct Task;\n")
        .with("tracker/solution.rs", "pub struct Task { pub done: bool }\n")
        .with("tracker/tests.rs", "#[test]\nfn works() {}\n")
        .with("tracker/tasks.csv", "id,title\n1,laundry\n")
}

fn resolver(store: impl ContentStore + 'static) -> BundleResolver {
    BundleResolver::new(Arc::new(store))
}

/// Sleeps before answering for references containing "slow".
struct SlowStore {
    inner: MemoryContentStore,
    delay: Duration,
}

impl ContentStore for SlowStore {
    fn read(&self, reference: &str) -> Result<Option<String>> {
        if reference.contains("slow") {
            thread::sleep(self.delay);
        }
        self.inner.read(reference)
    }
}

/// Fails every read of a reference containing "locked".
struct FlakyStore {
    inner: MemoryContentStore,
}

impl ContentStore for FlakyStore {
    fn read(&self, reference: &str) -> Result<Option<String>> {
        if reference.contains("locked") {
            return Err(ExforgeError::Content("permission denied".to_string()));
        }
        self.inner.read(reference)
    }
}

/// Panics on every read of a reference containing "crash".
struct CrashingStore {
    inner: MemoryContentStore,
}

impl ContentStore for CrashingStore {
    fn read(&self, reference: &str) -> Result<Option<String>> {
        if reference.contains("crash") {
            panic!("store crashed reading {}", reference);
        }
        self.inner.read(reference)
    }
}

// =========================================================================
// Resolution
// =========================================================================

#[test]
fn test_resolves_complete_bundle() {
    let resolved = resolver(full_store()).resolve(&definition()).unwrap();

    assert!(resolved.warnings.is_empty());
    assert_eq!(resolved.variant, VariantMatch::Exact);
    let bundle = resolved.bundle;
    assert_eq!(bundle.title, "Task Tracker");
    assert_eq!(bundle.starter_code, "pub struct Task;\n");
    assert!(bundle.test_code.contains("fn works"));
    assert_eq!(bundle.auxiliary_files["tasks.csv"], "id,title\n1,laundry\n");
    assert_eq!(bundle.duration_minutes, 25);
    assert_eq!(bundle.context, "Personal productivity app");
}

#[test]
fn test_missing_starter_is_fatal() {
    let store = MemoryContentStore::new().with("tracker/solution.rs", "fn main() {}");
    let err = resolver(store).resolve(&definition()).unwrap_err();

    match err {
        ExforgeError::MissingRequiredArtifact {
            artifact,
            reference,
            reason,
        } => {
            assert_eq!(artifact, "starter");
            assert_eq!(reference, "tracker/starter.rs");
            assert_eq!(reason, "not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_undeclared_starter_is_fatal() {
    let mut def = definition();
    def.files.starter = None;

    let err = resolver(full_store()).resolve(&def).unwrap_err();
    assert!(matches!(err, ExforgeError::MissingRequiredArtifact { .. }));
}

#[test]
fn test_empty_starter_is_fatal() {
    let store = full_store().with("tracker/starter.rs", "   \n");
    let err = resolver(store).resolve(&definition()).unwrap_err();
    assert!(matches!(
        err,
        ExforgeError::MissingRequiredArtifact { ref reason, .. } if reason == "empty"
    ));
}

#[test]
fn test_missing_tests_only_degrades() {
    let store = MemoryContentStore::new()
        .with("tracker/starter.rs", "pub struct Task;\n")
        .with("tracker/solution.rs", "pub struct Task { pub done: bool }\n")
        .with("tracker/tasks.csv", "id,title\n");

    let resolved = resolver(store).resolve(&definition()).unwrap();

    assert_eq!(resolved.bundle.test_code, "");
    assert_eq!(
        resolved.warnings,
        vec![ArtifactWarning {
            artifact: "tests".to_string(),
            reference: "tracker/tests.rs".to_string(),
            problem: ArtifactProblem::Missing,
        }]
    );
}

#[test]
fn test_empty_problem_statement_is_incomplete() {
    let mut def = definition();
    def.content.problem_statement = "  ".to_string();

    let err = resolver(full_store()).resolve(&def).unwrap_err();
    assert!(matches!(err, ExforgeError::IncompleteBundle(_)));
}

#[test]
fn test_resolution_is_repeatable() {
    let resolver = resolver(full_store());
    let first = resolver.resolve(&definition()).unwrap();
    let second = resolver.resolve(&definition()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unreadable_optional_artifact_degrades() {
    let mut def = definition();
    def.files.project = Some("tracker/locked/Cargo.toml".to_string());

    let resolved = resolver(FlakyStore {
        inner: full_store(),
    })
    .resolve(&def)
    .unwrap();

    assert_eq!(resolved.bundle.project_descriptor, "");
    assert_eq!(resolved.warnings.len(), 1);
    assert_eq!(resolved.warnings[0].problem, ArtifactProblem::Unreadable);
}

#[test]
fn test_crashed_optional_read_is_unreadable_not_timed_out() {
    let mut def = definition();
    def.files.tests = Some("tracker/crash_tests.rs".to_string());

    let started = Instant::now();
    let resolved = resolver(CrashingStore {
        inner: full_store(),
    })
    .with_timeout(Duration::from_secs(5))
    .resolve(&def)
    .unwrap();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(resolved.bundle.test_code, "");
    assert_eq!(resolved.bundle.starter_code, "pub struct Task;\n");
    assert_eq!(resolved.warnings.len(), 1);
    assert_eq!(resolved.warnings[0].problem, ArtifactProblem::Unreadable);
}

#[test]
fn test_crashed_starter_read_is_fatal_and_unreadable() {
    let mut def = definition();
    def.files.starter = Some("tracker/crash_starter.rs".to_string());

    let err = resolver(CrashingStore {
        inner: full_store(),
    })
    .resolve(&def)
    .unwrap_err();

    assert!(matches!(
        err,
        ExforgeError::MissingRequiredArtifact { ref reason, .. }
            if reason.contains("stopped without answering")
    ));
}

#[test]
fn test_blank_context_picks_agnostic_variant_exactly() {
    let mut agnostic = definition();
    agnostic.context = None;
    let catalog = DefinitionCatalog::from_definitions(vec![agnostic]);

    let resolved = resolver(full_store())
        .resolve_from(&catalog, "fundamentals", "beginner", "implementation", Some("  "))
        .unwrap();

    assert_eq!(resolved.variant, VariantMatch::Exact);
}

#[test]
fn test_slow_optional_artifact_times_out_alone() {
    let mut def = definition();
    def.files.tests = Some("tracker/slow_tests.rs".to_string());
    let store = SlowStore {
        inner: full_store().with("tracker/slow_tests.rs", "#[test]\nfn late() {}\n"),
        delay: Duration::from_millis(800),
    };
    let resolver = resolver(store).with_timeout(Duration::from_millis(100));

    let started = Instant::now();
    let resolved = resolver.resolve(&def).unwrap();

    assert!(started.elapsed() < Duration::from_millis(700));
    assert_eq!(resolved.bundle.test_code, "");
    assert_eq!(resolved.bundle.starter_code, "pub struct Task;\n");
    assert_eq!(resolved.warnings.len(), 1);
    assert_eq!(resolved.warnings[0].problem, ArtifactProblem::TimedOut);
}

#[test]
fn test_slow_starter_times_out_fatally() {
    let mut def = definition();
    def.files.starter = Some("tracker/slow_starter.rs".to_string());
    let store = SlowStore {
        inner: full_store().with("tracker/slow_starter.rs", "pub struct Task;\n"),
        delay: Duration::from_millis(800),
    };

    let err = resolver(store)
        .with_timeout(Duration::from_millis(100))
        .resolve(&def)
        .unwrap_err();

    assert!(matches!(
        err,
        ExforgeError::MissingRequiredArtifact { ref reason, .. } if reason.starts_with("timed out")
    ));
}

#[test]
fn test_reads_run_in_parallel() {
    let mut def = definition();
    def.files.starter = Some("a/slow_starter.rs".to_string());
    def.files.solution = Some("a/slow_solution.rs".to_string());
    def.files.tests = Some("a/slow_tests.rs".to_string());
    def.files.auxiliary.clear();
    let store = SlowStore {
        inner: MemoryContentStore::new()
            .with("a/slow_starter.rs", "fn a() {}")
            .with("a/slow_solution.rs", "fn b() {}")
            .with("a/slow_tests.rs", "fn c() {}"),
        delay: Duration::from_millis(200),
    };

    let started = Instant::now();
    let resolved = resolver(store)
        .with_timeout(Duration::from_secs(5))
        .resolve(&def)
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(550));
    assert!(resolved.warnings.is_empty());
}

// =========================================================================
// Variant selection
// =========================================================================

#[test]
fn test_context_fallback_uses_first_agnostic_match() {
    let mut other = definition();
    other.id = "tracker-finance".to_string();
    other.context = Some("Finance".to_string());
    let catalog = DefinitionCatalog::from_definitions(vec![definition(), other]);

    let resolved = resolver(full_store())
        .resolve_from(
            &catalog,
            "fundamentals",
            "beginner",
            "implementation",
            Some("Space exploration"),
        )
        .unwrap();

    assert_eq!(resolved.definition_id, "tracker");
    assert_eq!(
        resolved.variant,
        VariantMatch::ContextFallback {
            requested: "Space exploration".to_string()
        }
    );
}

#[test]
fn test_exact_context_match_preferred() {
    let mut other = definition();
    other.id = "tracker-finance".to_string();
    other.context = Some("Finance".to_string());
    let catalog = DefinitionCatalog::from_definitions(vec![definition(), other]);

    let resolved = resolver(full_store())
        .resolve_from(
            &catalog,
            "fundamentals",
            "beginner",
            "implementation",
            Some("  finance "),
        )
        .unwrap();

    assert_eq!(resolved.definition_id, "tracker-finance");
    assert_eq!(resolved.variant, VariantMatch::Exact);
}

#[test]
fn test_no_variant_at_all() {
    let catalog = DefinitionCatalog::from_definitions(vec![definition()]);
    let err = resolver(full_store())
        .resolve_from(&catalog, "fundamentals", "advanced", "performance", None)
        .unwrap_err();
    assert!(matches!(err, ExforgeError::NoMatchingExercise(_)));
}

// =========================================================================
// Catalog loading
// =========================================================================

#[test]
fn test_catalog_from_yaml_list() {
    let yaml = r#"
exercises:
  - id: tracker
    topic: fundamentals
    level: beginner
    exercise_type: implementation
    content:
      title: Task Tracker
      problem_statement: Build it.
    files:
      starter: tracker/starter.rs
  - id: tracker-generic
    topic: fundamentals
    level: beginner
    exercise_type: implementation
    context: ""
"#;
    let catalog = DefinitionCatalog::from_yaml(yaml).unwrap();

    assert_eq!(catalog.len(), 2);
    assert_eq!(
        catalog.get("tracker").unwrap().files.starter.as_deref(),
        Some("tracker/starter.rs")
    );
    assert_eq!(
        catalog
            .find_exact("fundamentals", "beginner", "implementation", None)
            .unwrap()
            .id,
        "tracker"
    );
}

#[test]
fn test_catalog_reports_all_problems() {
    let yaml = r#"
- id: one
  topic: fundamentals
  level: beginner
- id: two
  topic: fundamentals
  level: beginner
  exercise_type: implementation
  duration_minutes: soon
- id: three
  topic: fundamentals
  level: beginner
  exercise_type: implementation
- id: three
  topic: fundamentals
  level: beginner
  exercise_type: implementation
"#;
    let err = DefinitionCatalog::from_yaml(yaml).unwrap_err();
    let ExforgeError::Configuration(config) = err else {
        panic!("expected configuration error, got {:?}", err);
    };
    let reasons: Vec<String> = config.problems.iter().map(|p| p.to_string()).collect();

    assert_eq!(reasons.len(), 3, "{:#?}", reasons);
    assert_eq!(reasons[0], "exercise #0 ('one'): missing exercise_type");
    assert!(reasons[1].starts_with("exercise #1 ('two'): malformed record"));
    assert_eq!(reasons[2], "exercise #3 ('three'): duplicate id");
}

#[test]
fn test_catalog_load_dir_reads_files_in_order() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("b.yaml"),
        "id: second\ntopic: t\nlevel: l\nexercise_type: x\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("a.yml"),
        "- id: first\n  topic: t\n  level: l\n  exercise_type: x\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let catalog = DefinitionCatalog::load_dir(dir.path()).unwrap();

    let ids: Vec<&str> = catalog.definitions().iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second"]);
    assert_eq!(catalog.find_variant("t", "l", "x").unwrap().id, "first");
}

#[test]
fn test_catalog_load_dir_names_file_in_problem() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("broken.yaml"), "id: lonely\n").unwrap();

    let err = DefinitionCatalog::load_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains("broken.yaml: missing topic, level, exercise_type"));
}

#[test]
fn test_fs_store_backs_resolution() {
    let dir = TempDir::new().unwrap();
    let topic_dir = dir.path().join("fundamentals");
    std::fs::create_dir_all(&topic_dir).unwrap();
    std::fs::write(topic_dir.join("starter.rs"), "fn main() {}\n").unwrap();

    let mut def = definition();
    def.files = FileRefs {
        starter: Some("starter.rs".to_string()),
        tests: Some("tests.rs".to_string()),
        ..FileRefs::default()
    };
    let store = PrefixedStore::new("fundamentals", Arc::new(FsContentStore::new(dir.path())));

    let resolved = resolver(store).resolve(&def).unwrap();

    assert_eq!(resolved.bundle.starter_code, "fn main() {}\n");
    assert_eq!(resolved.warnings.len(), 1);
    assert_eq!(resolved.warnings[0].artifact, "tests");
}

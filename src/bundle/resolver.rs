//! Materializes exercise definitions into bundles.
//!
//! Every referenced artifact is read on its own worker thread. Results are
//! collected until all reads finish or the resolver's timeout elapses; an
//! artifact that has not answered by then is treated as timed out, and one
//! whose worker died is unreadable. A slow read only affects its own field.

use super::catalog::DefinitionCatalog;
use super::store::ContentStore;
use super::types::{
    ArtifactProblem, ArtifactWarning, ExerciseBundle, ExerciseDefinition, ResolvedBundle,
    VariantMatch,
};
use crate::error::{ExforgeError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default bound on total artifact resolution time.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

pub const STARTER: &str = "starter";
pub const SOLUTION: &str = "solution";
pub const TESTS: &str = "tests";
pub const PROJECT: &str = "project";

/// One artifact to read.
#[derive(Debug, Clone)]
struct ArtifactRead {
    artifact: String,
    reference: String,
    required: bool,
}

/// Outcome of one read. `None` in the results table means it never answered.
type ReadOutcome = Result<Option<String>>;

/// Resolves definitions against a content store.
#[derive(Clone)]
pub struct BundleResolver {
    store: Arc<dyn ContentStore>,
    timeout: Duration,
}

impl BundleResolver {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pick a variant from `catalog` and resolve it.
    ///
    /// When `context` is given but no variant targets it, the first variant
    /// matching topic/level/type is used instead and the fallback is logged.
    ///
    /// # Errors
    ///
    /// * `NoMatchingExercise` - nothing matches topic/level/type
    /// * anything [`BundleResolver::resolve`] returns
    pub fn resolve_from(
        &self,
        catalog: &DefinitionCatalog,
        topic: &str,
        level: &str,
        exercise_type: &str,
        context: Option<&str>,
    ) -> Result<ResolvedBundle> {
        if let Some(definition) = catalog.find_exact(topic, level, exercise_type, context) {
            return self.resolve(definition);
        }

        let definition = catalog
            .find_variant(topic, level, exercise_type)
            .ok_or_else(|| {
                ExforgeError::NoMatchingExercise(format!("{}/{}/{}", topic, level, exercise_type))
            })?;

        let requested = context.unwrap_or_default().trim().to_string();
        warn!(
            exercise = %definition.id,
            requested_context = %requested,
            "no variant for requested context; using context-agnostic match"
        );
        let mut resolved = self.resolve(definition)?;
        resolved.variant = VariantMatch::ContextFallback { requested };
        Ok(resolved)
    }

    /// Materialize one definition.
    ///
    /// # Errors
    ///
    /// * `IncompleteBundle` - empty problem statement
    /// * `MissingRequiredArtifact` - starter undeclared, missing, empty,
    ///   unreadable or timed out
    pub fn resolve(&self, definition: &ExerciseDefinition) -> Result<ResolvedBundle> {
        if definition.content.problem_statement.trim().is_empty() {
            return Err(ExforgeError::IncompleteBundle(format!(
                "exercise '{}' has an empty problem statement",
                definition.id
            )));
        }
        let Some(starter_ref) = definition.files.starter.as_deref() else {
            return Err(ExforgeError::MissingRequiredArtifact {
                artifact: STARTER.to_string(),
                reference: String::new(),
                reason: "no reference declared".to_string(),
            });
        };

        let reads = plan_reads(definition, starter_ref);
        let outcomes = self.read_all(&reads);

        let mut bodies: BTreeMap<String, String> = BTreeMap::new();
        let mut warnings: Vec<ArtifactWarning> = Vec::new();

        for (read, outcome) in reads.iter().zip(outcomes) {
            let problem = match outcome {
                Some(Ok(Some(body))) if !(read.required && body.trim().is_empty()) => {
                    bodies.insert(read.artifact.clone(), body);
                    continue;
                }
                Some(Ok(Some(_))) => (ArtifactProblem::Missing, "empty".to_string()),
                Some(Ok(None)) => (ArtifactProblem::Missing, "not found".to_string()),
                Some(Err(e)) => (ArtifactProblem::Unreadable, e.to_string()),
                None => (
                    ArtifactProblem::TimedOut,
                    format!("timed out after {}ms", self.timeout.as_millis()),
                ),
            };

            if read.required {
                return Err(ExforgeError::MissingRequiredArtifact {
                    artifact: read.artifact.clone(),
                    reference: read.reference.clone(),
                    reason: problem.1,
                });
            }

            let warning = ArtifactWarning {
                artifact: read.artifact.clone(),
                reference: read.reference.clone(),
                problem: problem.0,
            };
            warn!(exercise = %definition.id, detail = %problem.1, "{}", warning);
            warnings.push(warning);
        }

        let mut take = |artifact: &str| bodies.remove(artifact).unwrap_or_default();
        let starter_code = take(STARTER);
        let solution_code = take(SOLUTION);
        let test_code = take(TESTS);
        let project_descriptor = take(PROJECT);
        let auxiliary_files: BTreeMap<String, String> = definition
            .files
            .auxiliary
            .keys()
            .map(|name| (name.clone(), take(auxiliary_slot(name).as_str())))
            .collect();

        let content = &definition.content;
        let bundle = ExerciseBundle {
            title: content.title.clone(),
            description: content.description.clone(),
            objectives: content.objectives.clone(),
            prerequisites: content.prerequisites.clone(),
            problem_statement: content.problem_statement.clone(),
            requirements: content.requirements.clone(),
            success_criteria: content.success_criteria.clone(),
            starter_code,
            solution_code,
            test_code,
            project_descriptor,
            auxiliary_files,
            extension_challenges: content.extension_challenges.clone(),
            pitfalls: content.pitfalls.clone(),
            level: definition.level.clone(),
            topic: definition.topic.clone(),
            exercise_type: definition.exercise_type.clone(),
            context: definition.context.clone().unwrap_or_default(),
            duration_minutes: definition.duration_minutes.unwrap_or(0),
        };

        debug!(
            exercise = %definition.id,
            warnings = warnings.len(),
            "bundle resolved"
        );

        Ok(ResolvedBundle {
            definition_id: definition.id.clone(),
            bundle,
            warnings,
            variant: VariantMatch::Exact,
        })
    }

    /// Read every artifact in parallel, waiting at most `self.timeout` in total.
    ///
    /// The returned table lines up with `reads`.
    fn read_all(&self, reads: &[ArtifactRead]) -> Vec<Option<ReadOutcome>> {
        let (tx, rx) = mpsc::channel::<(usize, ReadOutcome)>();

        for (slot, read) in reads.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let tx = tx.clone();
            let reference = read.reference.clone();
            thread::spawn(move || {
                let outcome = store.read(&reference);
                // The receiver is gone once the deadline passed.
                let _ = tx.send((slot, outcome));
            });
        }
        drop(tx);

        let mut outcomes: Vec<Option<ReadOutcome>> = (0..reads.len()).map(|_| None).collect();
        let deadline = Instant::now() + self.timeout;
        let mut pending = reads.len();

        while pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((slot, outcome)) => {
                    outcomes[slot] = Some(outcome);
                    pending -= 1;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                // Every worker hung up; the silent ones panicked.
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    for outcome in outcomes.iter_mut().filter(|o| o.is_none()) {
                        *outcome = Some(Err(ExforgeError::Content(
                            "read worker stopped without answering".to_string(),
                        )));
                    }
                    break;
                }
            }
        }

        outcomes
    }
}

fn auxiliary_slot(name: &str) -> String {
    format!("auxiliary:{}", name)
}

fn plan_reads(definition: &ExerciseDefinition, starter_ref: &str) -> Vec<ArtifactRead> {
    let files = &definition.files;
    let mut reads = vec![ArtifactRead {
        artifact: STARTER.to_string(),
        reference: starter_ref.to_string(),
        required: true,
    }];

    let optional = [
        (SOLUTION, &files.solution),
        (TESTS, &files.tests),
        (PROJECT, &files.project),
    ];
    for (artifact, reference) in optional {
        if let Some(reference) = reference {
            reads.push(ArtifactRead {
                artifact: artifact.to_string(),
                reference: reference.clone(),
                required: false,
            });
        }
    }

    for (name, reference) in &files.auxiliary {
        reads.push(ArtifactRead {
            artifact: auxiliary_slot(name),
            reference: reference.clone(),
            required: false,
        });
    }

    reads
}

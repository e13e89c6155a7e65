//! Fixed-priority fallback driver.
//!
//! Stages run in order: the topic's registered generator, the curated
//! library, then prompt synthesis. The first two must produce a bundle that
//! passes [`check_structure`]; prompt synthesis always produces a result.

use super::request::{GenerationRequest, GenerationResult, Provenance};
use super::strategy::{Generated, GeneratorRegistry, LibraryGenerator};
use super::validity::check_structure;
use crate::bundle::ExerciseBundle;
use crate::error::{ExforgeError, Result};
use crate::events::{Event, EventAction, EventSink};
use crate::graph::DependencyGraph;
use crate::taxonomy::{TaxonomyIndex, TaxonomyRegistry};
use crate::template::builtin::{
    ADVANCED_EXERCISE_GENERATION, EXERCISE_GENERATION, MENTOR_FIELDS, MENTOR_PARAM,
};
use crate::template::{TemplateCatalog, TemplateParams};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Auxiliary file name carrying the prompt in a stub bundle.
pub const PROMPT_FILE: &str = "PROMPT.txt";

/// Context used when a request leaves it empty.
pub const DEFAULT_CONTEXT: &str = "general software development";

/// Generation stages in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Direct,
    Library,
    PromptSynthesis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Direct => "direct",
            Stage::Library => "library",
            Stage::PromptSynthesis => "prompt_synthesis",
        }
    }

    fn provenance(&self) -> Provenance {
        match self {
            Stage::Direct => Provenance::Direct,
            Stage::Library => Provenance::Library,
            Stage::PromptSynthesis => Provenance::AiPrompt,
        }
    }
}

/// Tunables for template choice and request defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Levels with at least this rank use the advanced template.
    pub advanced_rank_threshold: u32,
    pub standard_template: String,
    pub advanced_template: String,
    pub default_context: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            advanced_rank_threshold: 3,
            standard_template: EXERCISE_GENERATION.to_string(),
            advanced_template: ADVANCED_EXERCISE_GENERATION.to_string(),
            default_context: DEFAULT_CONTEXT.to_string(),
        }
    }
}

/// Display values resolved from the taxonomy for one request.
#[derive(Debug, Clone)]
struct Labels {
    topic: String,
    level: String,
    exercise_type: String,
    category: Option<String>,
    prerequisites: Vec<String>,
    rank: Option<u32>,
    minutes: Option<u32>,
}

impl Labels {
    fn resolve(request: &GenerationRequest, index: &TaxonomyIndex) -> Self {
        let topic = index.topic(&request.topic_id);
        let level = index.level(&request.level_id);
        let exercise_type = index.exercise_type(&request.exercise_type_id);

        let prerequisites = topic
            .map(|t| {
                t.prerequisites
                    .iter()
                    .map(|id| {
                        index
                            .topic(id)
                            .map(|p| p.display_name.clone())
                            .unwrap_or_else(|| id.clone())
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            topic: topic
                .map(|t| t.display_name.clone())
                .unwrap_or_else(|| request.topic_id.clone()),
            level: level
                .map(|l| l.display_name.clone())
                .unwrap_or_else(|| request.level_id.clone()),
            exercise_type: exercise_type
                .map(|t| t.display_name.clone())
                .unwrap_or_else(|| request.exercise_type_id.clone()),
            category: topic
                .map(|t| t.category.clone())
                .filter(|c| !c.trim().is_empty()),
            prerequisites,
            rank: level.map(|l| l.rank),
            minutes: match (level, exercise_type) {
                (Some(level), Some(exercise_type)) => Some(exercise_type.estimate_minutes(level)),
                _ => None,
            },
        }
    }
}

/// One generated curriculum topic.
#[derive(Debug, Clone, Serialize)]
pub struct CurriculumEntry {
    pub topic_id: String,
    pub result: GenerationResult,
}

/// A topic left out because its prerequisites are not met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTopic {
    pub topic_id: String,
    pub missing_prerequisites: Vec<String>,
}

/// Exercises for every topic at a level a learner can take next.
#[derive(Debug, Clone, Serialize)]
pub struct Curriculum {
    pub level_id: String,
    pub exercise_type_id: String,
    pub entries: Vec<CurriculumEntry>,
    pub skipped: Vec<SkippedTopic>,
}

/// Drives the generation stages for each request.
pub struct Orchestrator {
    registry: Arc<TaxonomyRegistry>,
    generators: GeneratorRegistry,
    library: Option<Arc<dyn LibraryGenerator>>,
    events: Option<Arc<dyn EventSink>>,
    settings: OrchestratorSettings,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("generators", &self.generators)
            .field("library", &self.library.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(registry: Arc<TaxonomyRegistry>) -> Self {
        Self {
            registry,
            generators: GeneratorRegistry::new(),
            library: None,
            events: None,
            settings: OrchestratorSettings::default(),
        }
    }

    pub fn with_generators(mut self, generators: GeneratorRegistry) -> Self {
        self.generators = generators;
        self
    }

    pub fn with_library(mut self, library: Arc<dyn LibraryGenerator>) -> Self {
        self.library = Some(library);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Produce an exercise or, failing that, a prompt for one.
    ///
    /// # Errors
    ///
    /// * `InvalidRequest` - a blank id, or an id the taxonomy does not know
    ///
    /// Every other failure, a panicking generator included, advances to the
    /// next stage. If the taxonomy cannot be loaded at all, generation
    /// continues with the raw ids.
    ///
    /// Stages match on the request's own context, so a blank context selects
    /// context-agnostic exercises. The default context only fills the prompt
    /// and the bundle metadata.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        request.check_shape()?;

        let mut warnings: Vec<String> = Vec::new();
        let index = match self.registry.snapshot() {
            Ok(index) => {
                check_known(request, &index)?;
                index
            }
            Err(e) => {
                warn!(error = %e, "taxonomy unavailable; generating from raw ids");
                warnings.push(format!("taxonomy unavailable: {}", e));
                Arc::new(TaxonomyIndex::default())
            }
        };

        let request = trimmed(request);
        let described = self.with_default_context(&request);
        let labels = Labels::resolve(&request, &index);
        let label = request.label();

        for stage in [Stage::Direct, Stage::Library] {
            self.emit(EventAction::StageAttempt, &label, json!({"stage": stage.as_str()}));

            let reason = match self.attempt(stage, &request, &index) {
                Ok(generated) => {
                    let report = check_structure(&generated.bundle);
                    if report.passed {
                        info!(request = %label, stage = stage.as_str(), "exercise generated");
                        self.emit(
                            EventAction::StageSuccess,
                            &label,
                            json!({"stage": stage.as_str()}),
                        );
                        warnings.extend(generated.warnings);
                        return Ok(finish(
                            generated.bundle,
                            stage.provenance(),
                            &described,
                            &labels,
                            warnings,
                        ));
                    }
                    format!("structurally invalid: {}", report.summary())
                }
                Err(reason) => reason,
            };

            debug!(request = %label, stage = stage.as_str(), %reason, "stage advanced");
            self.emit(
                EventAction::StageAdvance,
                &label,
                json!({"stage": stage.as_str(), "reason": reason}),
            );
        }

        self.emit(
            EventAction::StageAttempt,
            &label,
            json!({"stage": Stage::PromptSynthesis.as_str()}),
        );
        let result = self.synthesize(&described, &index, &labels, warnings);
        self.emit(
            EventAction::StageSuccess,
            &label,
            json!({
                "stage": Stage::PromptSynthesis.as_str(),
                "template": result.template_id,
            }),
        );
        info!(request = %label, "prompt synthesized");
        Ok(result)
    }

    /// Generate an exercise for each topic at `level_id` the learner can take.
    ///
    /// Topics are walked prerequisite-first. A topic is generated when its
    /// prerequisites are all in `completed` or earlier in this curriculum;
    /// otherwise it is reported as skipped. Topics already in `completed`
    /// are left out.
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown level
    /// * `Dependency` - the prerequisite graph has dangling references or cycles
    pub fn assemble_curriculum(
        &self,
        level_id: &str,
        exercise_type_id: &str,
        completed: &HashSet<String>,
        context: &str,
    ) -> Result<Curriculum> {
        let index = self.registry.snapshot()?;
        let offered: HashSet<&str> = index
            .topics_for_level(level_id)?
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();

        let graph = DependencyGraph::from_index(&index);
        let order = graph.learning_order()?;

        let mut satisfied = completed.clone();
        let mut entries: Vec<CurriculumEntry> = Vec::new();
        let mut skipped: Vec<SkippedTopic> = Vec::new();

        for topic_id in order
            .iter()
            .filter(|id| offered.contains(id.as_str()) && !completed.contains(*id))
        {
            if !graph.are_prerequisites_satisfied(topic_id, &satisfied) {
                skipped.push(SkippedTopic {
                    topic_id: topic_id.clone(),
                    missing_prerequisites: graph.missing_prerequisites(topic_id, &satisfied)?,
                });
                continue;
            }

            let request = GenerationRequest::new(topic_id.clone(), level_id, exercise_type_id)
                .with_context(context);
            let result = self.generate(&request)?;
            entries.push(CurriculumEntry {
                topic_id: topic_id.clone(),
                result,
            });
            satisfied.insert(topic_id.clone());
        }

        self.emit(
            EventAction::Curriculum,
            &format!("{}/{}", level_id, exercise_type_id),
            json!({
                "generated": entries.iter().map(|e| e.topic_id.as_str()).collect::<Vec<_>>(),
                "skipped": skipped.iter().map(|s| s.topic_id.as_str()).collect::<Vec<_>>(),
            }),
        );

        Ok(Curriculum {
            level_id: level_id.to_string(),
            exercise_type_id: exercise_type_id.to_string(),
            entries,
            skipped,
        })
    }

    /// A copy of `request` with a blank context replaced by the default.
    fn with_default_context(&self, request: &GenerationRequest) -> GenerationRequest {
        let mut request = request.clone();
        if request.context.is_empty() {
            request.context = self.settings.default_context.clone();
        }
        request
    }

    fn attempt(
        &self,
        stage: Stage,
        request: &GenerationRequest,
        index: &TaxonomyIndex,
    ) -> std::result::Result<Generated, String> {
        match stage {
            Stage::Direct => {
                let generator = self.generators.get(&request.topic_id).ok_or_else(|| {
                    format!("no generator registered for topic '{}'", request.topic_id)
                })?;
                guarded(stage, || generator.generate(request, index))
            }
            Stage::Library => {
                let library = self
                    .library
                    .as_ref()
                    .ok_or_else(|| "no curated library configured".to_string())?;
                guarded(stage, || library.generate(request, index))
            }
            Stage::PromptSynthesis => Err("prompt synthesis is not a bundle stage".to_string()),
        }
    }

    /// Template for a request: the override, else by level rank.
    fn choose_template(&self, request: &GenerationRequest, labels: &Labels) -> String {
        if let Some(id) = request.template_id.as_deref().map(str::trim)
            && !id.is_empty()
        {
            return id.to_string();
        }
        match labels.rank {
            Some(rank) if rank >= self.settings.advanced_rank_threshold => {
                self.settings.advanced_template.clone()
            }
            _ => self.settings.standard_template.clone(),
        }
    }

    /// Render a prompt and wrap it in a stub bundle. Never fails.
    fn synthesize(
        &self,
        request: &GenerationRequest,
        index: &TaxonomyIndex,
        labels: &Labels,
        mut warnings: Vec<String>,
    ) -> GenerationResult {
        let builtins;
        let catalog = if index.templates().is_empty() {
            builtins = TemplateCatalog::with_builtins();
            &builtins
        } else {
            index.templates()
        };

        let params = prompt_params(request, labels);
        let chosen = self.choose_template(request, labels);
        let mut candidates = vec![chosen];
        for fallback in [self.settings.standard_template.as_str(), EXERCISE_GENERATION] {
            if !candidates.iter().any(|c| c == fallback) {
                candidates.push(fallback.to_string());
            }
        }

        let label = request.label();
        let mut rendered: Option<(String, String)> = None;
        for template_id in &candidates {
            match catalog.render_report(template_id, &params) {
                Ok(report) => {
                    for token in &report.unresolved {
                        warnings.push(format!(
                            "template '{}' left placeholder '{{{{{}}}}}' unresolved",
                            template_id, token
                        ));
                    }
                    rendered = Some((template_id.clone(), report.text));
                    break;
                }
                Err(e) => {
                    warn!(template = %template_id, error = %e, "template failed; trying next");
                    warnings.push(format!("template '{}' failed: {}", template_id, e));
                    self.emit(
                        EventAction::TemplateFallback,
                        &label,
                        json!({"template": template_id, "error": e.to_string()}),
                    );
                }
            }
        }

        let (template_id, prompt) = match rendered {
            Some((id, text)) => (Some(id), text),
            None => {
                warnings.push("every template failed; using plain-text prompt".to_string());
                (None, plain_prompt(request, labels))
            }
        };

        let bundle = stub_bundle(request, labels, &prompt);
        let mut result = finish(bundle, Provenance::AiPrompt, request, labels, warnings);
        result.prompt = Some(prompt);
        result.template_id = template_id;
        result
    }

    fn emit(&self, action: EventAction, request_label: &str, details: serde_json::Value) {
        let Some(sink) = &self.events else {
            return;
        };
        let event = Event::new(action)
            .with_request(request_label)
            .with_details(details);
        if let Err(e) = sink.record(&event) {
            warn!(error = %e, action = %action, "failed to record event");
        }
    }
}

/// A copy of `request` with its context trimmed.
fn trimmed(request: &GenerationRequest) -> GenerationRequest {
    let mut request = request.clone();
    request.context = request.context.trim().to_string();
    request
}

/// Run a stage's producer, turning an error or a panic into an advance reason.
fn guarded(
    stage: Stage,
    produce: impl FnOnce() -> Result<Generated>,
) -> std::result::Result<Generated, String> {
    match panic::catch_unwind(AssertUnwindSafe(produce)) {
        Ok(outcome) => outcome.map_err(|e| e.to_string()),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "no panic message".to_string());
            warn!(stage = stage.as_str(), %message, "generator panicked");
            Err(format!("generator panicked: {}", message))
        }
    }
}

fn check_known(request: &GenerationRequest, index: &TaxonomyIndex) -> Result<()> {
    let mut unknown: Vec<String> = Vec::new();
    if index.topic(&request.topic_id).is_none() {
        unknown.push(format!("topic '{}'", request.topic_id));
    }
    if index.level(&request.level_id).is_none() {
        unknown.push(format!("skill level '{}'", request.level_id));
    }
    if index.exercise_type(&request.exercise_type_id).is_none() {
        unknown.push(format!("exercise type '{}'", request.exercise_type_id));
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ExforgeError::InvalidRequest(format!(
            "unknown {}",
            unknown.join(", ")
        )))
    }
}

fn flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Template parameters for a request, keyed by the built-in placeholder names.
fn prompt_params(request: &GenerationRequest, labels: &Labels) -> TemplateParams {
    let mut params = TemplateParams::new()
        .with("Level", labels.level.clone())
        .with("Topic", labels.topic.clone())
        .with("ExerciseType", labels.exercise_type.clone())
        .with("Context", request.context.clone())
        .with("IncludeTests", flag(request.include_tests))
        .with("IncludeExtensions", flag(request.include_extensions));

    if let Some(minutes) = labels.minutes {
        params.set("EstimatedMinutes", minutes.to_string());
    }
    if let Some(category) = &labels.category {
        params.set("TopicCategory", category.clone());
    }
    if !labels.prerequisites.is_empty() {
        params.set("Prerequisites", labels.prerequisites.join(", "));
    }
    if let Some(mentor) = &request.mentor {
        params.set_structured(
            MENTOR_PARAM,
            [
                (MENTOR_FIELDS[0], mentor.name.clone()),
                (MENTOR_FIELDS[1], mentor.style.clone()),
            ],
        );
    }
    for (name, value) in &request.extras {
        params.set_extra(name.clone(), value.clone());
    }

    params
}

/// Last-resort prompt when no template renders.
fn plain_prompt(request: &GenerationRequest, labels: &Labels) -> String {
    let mut text = format!(
        "Design a {} programming exercise about {} for a {} learner.\nDomain context: {}.\n",
        labels.exercise_type, labels.topic, labels.level, request.context
    );
    text.push_str(
        "Provide a title, learning objectives, a problem statement, starter code, \
         a reference solution, unit tests and success criteria.\n",
    );
    text
}

fn stub_bundle(request: &GenerationRequest, labels: &Labels, prompt: &str) -> ExerciseBundle {
    ExerciseBundle {
        title: format!("{} exercise: {}", labels.exercise_type, labels.topic),
        description: format!(
            "Prompt for a {} exercise for a {} learner, set in: {}.",
            labels.exercise_type, labels.level, request.context
        ),
        prerequisites: labels.prerequisites.clone(),
        problem_statement: format!(
            "This exercise has not been written yet. Send the prompt in {} to a generative model to produce it.",
            PROMPT_FILE
        ),
        auxiliary_files: BTreeMap::from([(PROMPT_FILE.to_string(), prompt.to_string())]),
        ..ExerciseBundle::default()
    }
}

/// Apply request flags and fill metadata the producer left blank.
fn finish(
    mut bundle: ExerciseBundle,
    provenance: Provenance,
    request: &GenerationRequest,
    labels: &Labels,
    warnings: Vec<String>,
) -> GenerationResult {
    if !request.include_tests {
        bundle.test_code.clear();
    }
    if !request.include_extensions {
        bundle.extension_challenges.clear();
    }

    for (field, value) in [
        (&mut bundle.topic, &request.topic_id),
        (&mut bundle.level, &request.level_id),
        (&mut bundle.exercise_type, &request.exercise_type_id),
        (&mut bundle.context, &request.context),
    ] {
        if field.trim().is_empty() {
            field.clone_from(value);
        }
    }
    if bundle.duration_minutes == 0 {
        bundle.duration_minutes = labels.minutes.unwrap_or(0);
    }

    GenerationResult {
        provenance,
        bundle,
        prompt: None,
        template_id: None,
        warnings,
    }
}

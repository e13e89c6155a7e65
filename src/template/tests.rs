//! Tests for template validation and rendering.

use super::builtin::{ADVANCED_EXERCISE_GENERATION, CUSTOM_EXERCISE, EXERCISE_GENERATION};
use super::*;
use crate::error::ExforgeError;

// =========================================================================
// Helper functions
// =========================================================================

fn full_params() -> TemplateParams {
    params([
        ("Level", "Advanced"),
        ("Topic", "Fundamentals"),
        ("ExerciseType", "Performance"),
        ("Context", "Stock trading dashboard"),
        ("EstimatedMinutes", "90"),
    ])
}

fn mentor_template() -> PromptTemplateDefinition {
    PromptTemplateDefinition::new("mentored", "Mentored")
        .with_required(["Topic", "Mentor"])
        .with_structured("Mentor", ["Name", "Style"])
        .with_section(TemplateSection::new(
            "Intro",
            "{{Mentor.Name}} teaches {{Topic}}.",
        ))
}

// =========================================================================
// Validation
// =========================================================================

#[test]
fn test_validate_all_present() {
    let catalog = TemplateCatalog::with_builtins();
    let result = catalog
        .validate(ADVANCED_EXERCISE_GENERATION, &full_params())
        .unwrap();
    assert!(result.is_valid);
    assert!(result.missing_parameter_names.is_empty());
}

#[test]
fn test_validate_reports_estimated_minutes_missing() {
    let catalog = TemplateCatalog::with_builtins();
    let mut p = full_params();
    p.remove("EstimatedMinutes");

    let result = catalog.validate(ADVANCED_EXERCISE_GENERATION, &p).unwrap();

    assert!(!result.is_valid);
    assert!(
        result
            .missing_parameter_names
            .contains(&"EstimatedMinutes".to_string())
    );
}

#[test]
fn test_validate_lists_every_missing_parameter() {
    let catalog = TemplateCatalog::with_builtins();
    let p = params([("Topic", "Fundamentals"), ("Context", "")]);

    let result = catalog.validate(ADVANCED_EXERCISE_GENERATION, &p).unwrap();

    assert!(!result.is_valid);
    assert_eq!(
        result.missing_parameter_names,
        vec!["Level", "ExerciseType", "Context", "EstimatedMinutes"]
    );
}

#[test]
fn test_validate_unknown_template() {
    let catalog = TemplateCatalog::with_builtins();
    let err = catalog.validate("nope", &full_params()).unwrap_err();
    assert!(matches!(err, ExforgeError::TemplateNotFound(id) if id == "nope"));
}

#[test]
fn test_structured_parameter_requires_sub_fields() {
    let mut catalog = TemplateCatalog::new();
    catalog.insert(mentor_template());

    let incomplete = TemplateParams::new()
        .with("Topic", "Traits")
        .with_structured("Mentor", [("Name", "Ada"), ("Style", "")]);
    let result = catalog.validate("mentored", &incomplete).unwrap();
    assert_eq!(result.missing_parameter_names, vec!["Mentor"]);

    let as_text = TemplateParams::new()
        .with("Topic", "Traits")
        .with("Mentor", "Ada");
    let result = catalog.validate("mentored", &as_text).unwrap();
    assert_eq!(result.missing_parameter_names, vec!["Mentor"]);

    let complete = TemplateParams::new()
        .with("Topic", "Traits")
        .with_structured("Mentor", [("Name", "Ada"), ("Style", "gentle")]);
    assert!(catalog.validate("mentored", &complete).unwrap().is_valid);
}

// =========================================================================
// Rendering
// =========================================================================

#[test]
fn test_render_is_deterministic() {
    let catalog = TemplateCatalog::with_builtins();
    let p = full_params()
        .with("IncludeTests", "true")
        .with_structured("Mentor", [("Name", "Ada"), ("Style", "Socratic")]);

    let first = catalog.render(ADVANCED_EXERCISE_GENERATION, &p).unwrap();
    let second = catalog.render(ADVANCED_EXERCISE_GENERATION, &p).unwrap();

    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn test_render_substitutes_request_values() {
    let catalog = TemplateCatalog::with_builtins();
    let text = catalog
        .render(ADVANCED_EXERCISE_GENERATION, &full_params())
        .unwrap();

    assert!(text.contains("Advanced learner studying Fundamentals"));
    assert!(text.contains("Exercise kind: Performance."));
    assert!(text.contains("Domain context: Stock trading dashboard."));
    assert!(text.contains("about 90 minutes"));
    assert!(!text.contains("{{Level}}"));
}

#[test]
fn test_render_sections_in_declared_order() {
    let catalog = TemplateCatalog::with_builtins();
    let text = catalog.render(EXERCISE_GENERATION, &full_params()).unwrap();

    let order = [
        "=== Context ===",
        "=== Reasoning ===",
        "=== Task ===",
        "=== Output Structure ===",
        "=== Self Review ===",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|heading| text.find(heading).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_false_predicate_omits_section_entirely() {
    let catalog = TemplateCatalog::with_builtins();
    let text = catalog
        .render(EXERCISE_GENERATION, &full_params().with("IncludeTests", "false"))
        .unwrap();

    assert!(!text.contains("=== Tests ==="));
    assert!(!text.contains("=== Mentor ==="));
    assert!(!text.contains("{{Mentor.Name}}"));
    assert!(!text.contains("\n\n\n"));
}

#[test]
fn test_true_predicate_includes_section() {
    let catalog = TemplateCatalog::with_builtins();
    let p = full_params()
        .with("IncludeTests", "yes")
        .with("IncludeExtensions", "1")
        .with_structured("Mentor", [("Name", "Ada"), ("Style", "Socratic")]);
    let text = catalog.render(EXERCISE_GENERATION, &p).unwrap();

    assert!(text.contains("=== Tests ==="));
    assert!(text.contains("=== Extensions ==="));
    assert!(text.contains("Write in the voice of Ada. Teaching style: Socratic."));
}

#[test]
fn test_render_fails_validation() {
    let catalog = TemplateCatalog::with_builtins();
    let err = catalog
        .render(ADVANCED_EXERCISE_GENERATION, &params([("Topic", "x")]))
        .unwrap_err();

    match err {
        ExforgeError::ValidationFailed(missing) => {
            assert_eq!(
                missing,
                vec!["Level", "ExerciseType", "Context", "EstimatedMinutes"]
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_render_unknown_template() {
    let catalog = TemplateCatalog::with_builtins();
    let err = catalog.render("missing", &full_params()).unwrap_err();
    assert!(matches!(err, ExforgeError::TemplateNotFound(_)));
}

#[test]
fn test_unresolved_token_is_left_and_reported() {
    let mut catalog = TemplateCatalog::new();
    catalog.insert(
        PromptTemplateDefinition::new("loose", "Loose")
            .with_required(["Topic"])
            .with_section(TemplateSection::untitled("{{Topic}} for {{Audience}}")),
    );

    let report = catalog
        .render_report("loose", &params([("Topic", "Macros")]))
        .unwrap();

    assert_eq!(report.text, "Macros for {{Audience}}\n");
    assert_eq!(report.unresolved, vec!["Audience"]);
}

#[test]
fn test_custom_template_uses_extras() {
    let mut catalog = TemplateCatalog::new();
    catalog.insert(
        PromptTemplateDefinition::new("mine", "Mine")
            .accepting_extras()
            .with_required(["Topic", "Tone"])
            .with_section(TemplateSection::untitled("{{Topic}} in a {{Tone}} tone")),
    );
    let p = params([("Topic", "Async")]).with_extra("Tone", "playful");

    assert!(catalog.validate("mine", &p).unwrap().is_valid);
    assert_eq!(catalog.render("mine", &p).unwrap(), "Async in a playful tone\n");
}

#[test]
fn test_extras_ignored_by_fixed_templates() {
    let catalog = TemplateCatalog::with_builtins();
    let mut p = full_params();
    p.remove("Context");
    let p = p.with_extra("Context", "smuggled");

    let result = catalog.validate(EXERCISE_GENERATION, &p).unwrap();
    assert_eq!(result.missing_parameter_names, vec!["Context"]);
}

#[test]
fn test_builtin_custom_template_renders_instructions() {
    let catalog = TemplateCatalog::with_builtins();
    let p = params([
        ("Level", "Beginner"),
        ("Topic", "Ownership"),
        ("ExerciseType", "Implementation"),
        ("Context", "Recipe book"),
    ])
    .with_extra("Instructions", "Ask for a borrow-checker puzzle.");

    let text = catalog.render(CUSTOM_EXERCISE, &p).unwrap();
    assert!(text.contains("Ask for a borrow-checker puzzle."));
}

#[test]
fn test_equals_predicate() {
    let mut catalog = TemplateCatalog::new();
    let mut condition = SectionCondition::default();
    condition
        .equals
        .insert("Level".to_string(), "advanced".to_string());
    catalog.insert(
        PromptTemplateDefinition::new("eq", "Eq")
            .with_section(TemplateSection::untitled("always"))
            .with_section(TemplateSection::untitled("only advanced").when(condition)),
    );

    let advanced = catalog.render("eq", &params([("Level", "Advanced")])).unwrap();
    assert_eq!(advanced, "always\n\nonly advanced\n");

    let beginner = catalog.render("eq", &params([("Level", "Beginner")])).unwrap();
    assert_eq!(beginner, "always\n");
}

#[test]
fn test_absent_predicate() {
    let mut catalog = TemplateCatalog::new();
    catalog.insert(
        PromptTemplateDefinition::new("abs", "Abs")
            .with_section(
                TemplateSection::untitled("no context given")
                    .when(SectionCondition::absent("Context")),
            ),
    );

    assert_eq!(
        catalog.render("abs", &TemplateParams::new()).unwrap(),
        "no context given\n"
    );
    assert_eq!(
        catalog.render("abs", &params([("Context", "x")])).unwrap(),
        "\n"
    );
}

#[test]
fn test_definition_from_yaml() {
    let yaml = r#"
id: reviewExercise
name: Code review exercise
version: "1.2"
required_parameters: [Topic]
structured_parameters:
  Mentor: [Name, Style]
sections:
  - title: Context
    body: "Review {{Topic}}."
  - body: "Mentor {{Mentor.Name}}"
    when:
      present: [Mentor]
"#;
    let template: PromptTemplateDefinition = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(template.version, "1.2");
    assert_eq!(template.sections.len(), 2);
    assert_eq!(
        template.sections[1].when.as_ref().unwrap().present,
        vec!["Mentor"]
    );
    assert!(!template.accepts_extras);
}

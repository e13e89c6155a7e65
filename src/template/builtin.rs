//! Built-in prompt templates.
//!
//! These are always available; configuration templates with the same id
//! replace them.

use super::types::{PromptTemplateDefinition, SectionCondition, TemplateSection};

/// Standard exercise prompt.
pub const EXERCISE_GENERATION: &str = "exerciseGeneration";

/// Exercise prompt for higher skill levels; also requires a time budget.
pub const ADVANCED_EXERCISE_GENERATION: &str = "advancedExerciseGeneration";

/// User-authored instructions layered over the standard framing.
pub const CUSTOM_EXERCISE: &str = "customExercise";

/// Name of the structured mentor persona parameter.
pub const MENTOR_PARAM: &str = "Mentor";

/// Sub-fields a mentor persona must carry.
pub const MENTOR_FIELDS: [&str; 2] = ["Name", "Style"];

/// All built-in templates.
pub fn builtin_templates() -> Vec<PromptTemplateDefinition> {
    vec![
        exercise_generation(),
        advanced_exercise_generation(),
        custom_exercise(),
    ]
}

const CONTEXT_FRAMING: &str = "\
You are designing a programming exercise for a {{Level}} learner studying {{Topic}}.
Exercise kind: {{ExerciseType}}.
Domain context: {{Context}}.";

const MENTOR_FRAMING: &str = "\
Write in the voice of {{Mentor.Name}}. Teaching style: {{Mentor.Style}}.";

const PREREQUISITES: &str = "\
The learner has already completed: {{Prerequisites}}.
Build on these topics without re-teaching them.";

const REASONING_SCAFFOLD: &str = "\
Before writing anything, reason through these steps:
1. Which {{Topic}} concepts matter most at the {{Level}} level?
2. Which realistic task in the \"{{Context}}\" domain exercises those concepts?
3. Which mistakes do learners at this level usually make, and how will the exercise surface them?
4. How will a learner know they have succeeded?";

const TASK_SPECIFICATION: &str = "\
Produce one {{ExerciseType}} exercise on {{Topic}} set in the \"{{Context}}\" domain.
The starter code must compile and leave the core logic for the learner.
The reference solution must be complete and idiomatic.";

const ADVANCED_TASK_SPECIFICATION: &str = "\
Produce one {{ExerciseType}} exercise on {{Topic}} set in the \"{{Context}}\" domain.
Scope the work so a {{Level}} learner finishes in about {{EstimatedMinutes}} minutes.
Require trade-off analysis: the learner must justify at least one design decision.
The starter code must compile and leave the core logic for the learner.
The reference solution must be complete, idiomatic, and production quality.";

const TESTS_REQUEST: &str = "\
Include a unit test suite that exercises the success criteria and at least two edge cases.";

const EXTENSIONS_REQUEST: &str = "\
Include two or three extension challenges for learners who finish early.";

const OUTPUT_STRUCTURE: &str = "\
Respond with exactly these sections, in this order:
TITLE
DESCRIPTION
LEARNING OBJECTIVES (bulleted)
PREREQUISITES (bulleted)
PROBLEM STATEMENT
TECHNICAL REQUIREMENTS (bulleted)
SUCCESS CRITERIA (bulleted)
STARTER CODE (fenced code block)
SOLUTION CODE (fenced code block)
TESTS (fenced code block, or \"none\")
EXTENSION CHALLENGES (bulleted, or \"none\")
COMMON PITFALLS (bulleted)";

const SELF_REVIEW: &str = "\
Before answering, review your draft:
- Does the starter code leave real work for the learner?
- Does the solution satisfy every success criterion?
- Is the difficulty right for a {{Level}} learner?
- Is every section present and non-empty?
Revise the draft until every answer is yes.";

fn shared_tail(template: PromptTemplateDefinition) -> PromptTemplateDefinition {
    template
        .with_section(
            TemplateSection::new("Tests", TESTS_REQUEST).when(SectionCondition::flag("IncludeTests")),
        )
        .with_section(
            TemplateSection::new("Extensions", EXTENSIONS_REQUEST)
                .when(SectionCondition::flag("IncludeExtensions")),
        )
        .with_section(TemplateSection::new("Output Structure", OUTPUT_STRUCTURE))
        .with_section(TemplateSection::new("Self Review", SELF_REVIEW))
}

fn framing(template: PromptTemplateDefinition) -> PromptTemplateDefinition {
    template
        .with_section(TemplateSection::new("Context", CONTEXT_FRAMING))
        .with_section(
            TemplateSection::new("Mentor", MENTOR_FRAMING)
                .when(SectionCondition::present(MENTOR_PARAM)),
        )
        .with_section(
            TemplateSection::new("Prerequisites", PREREQUISITES)
                .when(SectionCondition::present("Prerequisites")),
        )
}

fn exercise_generation() -> PromptTemplateDefinition {
    let template = PromptTemplateDefinition::new(EXERCISE_GENERATION, "Exercise generation")
        .with_version("1.0")
        .with_required(["Level", "Topic", "ExerciseType", "Context"])
        .with_structured(MENTOR_PARAM, MENTOR_FIELDS);

    shared_tail(
        framing(template)
            .with_section(TemplateSection::new("Reasoning", REASONING_SCAFFOLD))
            .with_section(TemplateSection::new("Task", TASK_SPECIFICATION)),
    )
}

fn advanced_exercise_generation() -> PromptTemplateDefinition {
    let template = PromptTemplateDefinition::new(
        ADVANCED_EXERCISE_GENERATION,
        "Advanced exercise generation",
    )
    .with_version("1.1")
    .with_required(["Level", "Topic", "ExerciseType", "Context", "EstimatedMinutes"])
    .with_structured(MENTOR_PARAM, MENTOR_FIELDS);

    shared_tail(
        framing(template)
            .with_section(TemplateSection::new("Reasoning", REASONING_SCAFFOLD))
            .with_section(TemplateSection::new("Task", ADVANCED_TASK_SPECIFICATION)),
    )
}

fn custom_exercise() -> PromptTemplateDefinition {
    let template = PromptTemplateDefinition::new(CUSTOM_EXERCISE, "Custom exercise")
        .with_version("1.0")
        .with_required(["Level", "Topic", "Instructions"])
        .with_structured(MENTOR_PARAM, MENTOR_FIELDS)
        .accepting_extras();

    shared_tail(
        framing(template)
            .with_section(TemplateSection::new("Reasoning", REASONING_SCAFFOLD))
            .with_section(TemplateSection::new("Task", "{{Instructions}}")),
    )
}

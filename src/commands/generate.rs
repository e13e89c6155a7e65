//! Implementation of the `exforge generate` and `exforge curriculum` commands.

use super::runtime::Runtime;
use crate::cli::{CurriculumArgs, GenerateArgs};
use crate::error::{ExforgeError, Result};
use crate::generate::{Curriculum, GenerationRequest, GenerationResult, PROMPT_FILE, Provenance};
use serde::Serialize;
use std::collections::HashSet;

const RULE: &str =
    "================================================================================";

/// Build a generation request from command-line arguments.
pub fn request_from_args(args: &GenerateArgs) -> GenerationRequest {
    let mut request =
        GenerationRequest::new(args.topic.trim(), args.level.trim(), args.exercise_type.trim())
            .with_context(args.context.as_str())
            .with_tests(!args.no_tests)
            .with_extensions(!args.no_extensions);

    if let Some(template) = &args.template {
        request = request.with_template(template.as_str());
    }
    if let (Some(name), Some(style)) = (&args.mentor_name, &args.mentor_style) {
        request = request.with_mentor(name.as_str(), style.as_str());
    }
    for (name, value) in &args.extras {
        request = request.with_extra(name.as_str(), value.as_str());
    }
    request
}

/// Execute the `exforge generate` command.
pub fn cmd_generate(runtime: &Runtime, args: GenerateArgs) -> Result<()> {
    let request = request_from_args(&args);
    let result = runtime.orchestrator()?.generate(&request)?;

    if args.json {
        println!("{}", to_json(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

/// Execute the `exforge curriculum` command.
pub fn cmd_curriculum(runtime: &Runtime, args: CurriculumArgs) -> Result<()> {
    let completed: HashSet<String> = args
        .completed
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    let curriculum = runtime.orchestrator()?.assemble_curriculum(
        args.level.trim(),
        args.exercise_type.trim(),
        &completed,
        &args.context,
    )?;

    if args.json {
        println!("{}", to_json(&curriculum)?);
    } else {
        print_curriculum(&curriculum);
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ExforgeError::UserError(format!("failed to serialize output to JSON: {}", e)))
}

fn print_list(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}:", heading);
    for item in items {
        println!("  - {}", item);
    }
}

fn print_code(heading: &str, body: &str) {
    if body.trim().is_empty() {
        return;
    }
    println!();
    println!("--- {} ---", heading);
    print!("{}", body);
    if !body.ends_with('\n') {
        println!();
    }
}

fn print_result(result: &GenerationResult) {
    let bundle = &result.bundle;

    println!("{}", RULE);
    println!("{} [{}]", bundle.title, result.provenance);
    println!("{}", RULE);
    println!();
    println!("Topic:      {}", bundle.topic);
    println!("Level:      {}", bundle.level);
    println!("Type:       {}", bundle.exercise_type);
    println!("Context:    {}", bundle.context);
    if bundle.duration_minutes > 0 {
        println!("Duration:   ~{} min", bundle.duration_minutes);
    }
    if let Some(template_id) = &result.template_id {
        println!("Template:   {}", template_id);
    }

    print_list("Warnings", &result.warnings);

    if result.provenance == Provenance::AiPrompt {
        println!();
        println!("{}", bundle.problem_statement);
        if let Some(prompt) = &result.prompt {
            print_code(PROMPT_FILE, prompt);
        }
        return;
    }

    if !bundle.description.trim().is_empty() {
        println!();
        println!("{}", bundle.description);
    }
    print_list("Objectives", &bundle.objectives);
    print_list("Prerequisites", &bundle.prerequisites);
    println!();
    println!("Problem:");
    println!("{}", bundle.problem_statement);
    print_list("Requirements", &bundle.requirements);
    print_list("Success Criteria", &bundle.success_criteria);
    print_code("starter", &bundle.starter_code);
    print_code("solution", &bundle.solution_code);
    print_code("tests", &bundle.test_code);
    print_code("project", &bundle.project_descriptor);
    for (name, body) in &bundle.auxiliary_files {
        print_code(name, body);
    }
    print_list("Extension Challenges", &bundle.extension_challenges);
    print_list("Common Pitfalls", &bundle.pitfalls);
}

fn print_curriculum(curriculum: &Curriculum) {
    println!(
        "Curriculum: {} / {} ({} exercise(s), {} skipped)",
        curriculum.level_id,
        curriculum.exercise_type_id,
        curriculum.entries.len(),
        curriculum.skipped.len()
    );
    println!();

    for (position, entry) in curriculum.entries.iter().enumerate() {
        println!(
            "  {:>2}. {:<24} {:<10} {}",
            position + 1,
            entry.topic_id,
            entry.result.provenance.to_string(),
            entry.result.bundle.title
        );
    }

    if !curriculum.skipped.is_empty() {
        println!();
        println!("Skipped:");
        for skipped in &curriculum.skipped {
            println!(
                "  - {} (needs {})",
                skipped.topic_id,
                skipped.missing_prerequisites.join(", ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    #[test]
    fn test_request_from_args() {
        let cli = Cli::try_parse_from([
            "exforge",
            "generate",
            "-t",
            " fundamentals ",
            "-l",
            "advanced",
            "-k",
            "performance",
            "--no-extensions",
            "--mentor-name",
            "Ada",
            "--mentor-style",
            "Socratic",
            "--template",
            "customExercise",
            "--extra",
            "Instructions=Parse logs",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("Expected Generate command");
        };

        let request = request_from_args(&args);

        assert_eq!(request.topic_id, "fundamentals");
        assert!(request.include_tests);
        assert!(!request.include_extensions);
        assert_eq!(request.template_id.as_deref(), Some("customExercise"));
        assert_eq!(request.mentor.as_ref().map(|m| m.style.as_str()), Some("Socratic"));
        assert_eq!(
            request.extras.get("Instructions").map(String::as_str),
            Some("Parse logs")
        );
    }
}

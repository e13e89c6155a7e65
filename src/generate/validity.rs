//! Structural validity check shared by every generation stage.
//!
//! A bundle passes when it has a title, at least one learning objective, a
//! problem statement, starter and solution code, at least one success
//! criterion, and code bodies that contain at least one line that is neither
//! blank nor a pure comment.

use crate::bundle::ExerciseBundle;
use regex::Regex;
use std::sync::LazyLock;

/// Lines that are only a comment in the languages exercises are written in.
///
/// `#` counts only when followed by whitespace or end of line so Rust
/// attributes such as `#[test]` are still code.
static COMMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?://|/\*|\*/|\*(?:\s|$)|#(?:\s|$)|--(?:\s|$)|<!--)")
        .expect("Invalid comment-line regex")
});

/// Result of the structural check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityReport {
    pub passed: bool,
    /// One entry per failed rule.
    pub problems: Vec<String>,
}

impl ValidityReport {
    pub fn pass() -> Self {
        Self {
            passed: true,
            problems: Vec::new(),
        }
    }

    pub fn fail(problems: Vec<String>) -> Self {
        Self {
            passed: false,
            problems,
        }
    }

    /// Problems joined for a log line.
    pub fn summary(&self) -> String {
        self.problems.join("; ")
    }
}

/// Whether `body` has at least one line of actual code.
pub fn has_code(body: &str) -> bool {
    body.lines()
        .any(|line| !line.trim().is_empty() && !COMMENT_LINE.is_match(line))
}

/// Check a bundle against every structural rule, collecting all failures.
pub fn check_structure(bundle: &ExerciseBundle) -> ValidityReport {
    let mut problems = Vec::new();

    if bundle.title.trim().is_empty() {
        problems.push("title is empty".to_string());
    }
    if !bundle.objectives.iter().any(|o| !o.trim().is_empty()) {
        problems.push("no learning objectives".to_string());
    }
    if bundle.problem_statement.trim().is_empty() {
        problems.push("problem statement is empty".to_string());
    }
    for (name, body) in [
        ("starter", &bundle.starter_code),
        ("solution", &bundle.solution_code),
    ] {
        if body.trim().is_empty() {
            problems.push(format!("{} code is empty", name));
        } else if !has_code(body) {
            problems.push(format!("{} code has only comments", name));
        }
    }
    if !bundle.success_criteria.iter().any(|c| !c.trim().is_empty()) {
        problems.push("no success criteria".to_string());
    }

    if problems.is_empty() {
        ValidityReport::pass()
    } else {
        ValidityReport::fail(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_bundle() -> ExerciseBundle {
        ExerciseBundle {
            title: "Task Tracker".to_string(),
            objectives: vec!["Use structs".to_string()],
            problem_statement: "Build a task tracker.".to_string(),
            starter_code: "pub struct Task;\n".to_string(),
            solution_code: "pub struct Task { done: bool }\n".to_string(),
            success_criteria: vec!["Tests pass".to_string()],
            ..ExerciseBundle::default()
        }
    }

    #[test]
    fn test_valid_bundle_passes() {
        assert!(check_structure(&valid_bundle()).passed);
    }

    #[test]
    fn test_all_failures_are_listed() {
        let report = check_structure(&ExerciseBundle::default());
        assert!(!report.passed);
        assert_eq!(
            report.problems,
            vec![
                "title is empty",
                "no learning objectives",
                "problem statement is empty",
                "starter code is empty",
                "solution code is empty",
                "no success criteria",
            ]
        );
    }

    #[test]
    fn test_comment_only_code_fails() {
        let mut bundle = valid_bundle();
        bundle.solution_code = "// TODO\n\n/* later */\n# python style\n".to_string();

        let report = check_structure(&bundle);
        assert_eq!(report.problems, vec!["solution code has only comments"]);
    }

    #[test]
    fn test_attributes_count_as_code() {
        assert!(has_code("#[test]\n"));
        assert!(has_code("// header\nfn main() {}\n"));
        assert!(!has_code("   \n\t\n"));
        assert!(!has_code("-- sql comment\n"));
    }

    #[test]
    fn test_blank_objectives_do_not_count() {
        let mut bundle = valid_bundle();
        bundle.objectives = vec!["  ".to_string()];
        assert_eq!(
            check_structure(&bundle).problems,
            vec!["no learning objectives"]
        );
    }
}

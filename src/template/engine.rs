//! Placeholder substitution for template section bodies.
//!
//! # Syntax
//!
//! - `{{Name}}` - Substitutes the text parameter `Name`
//! - `{{Name.Field}}` - Substitutes one field of the structured parameter `Name`
//! - Whitespace inside the braces is ignored: `{{ Name }}`
//!
//! Single braces are ordinary text, so code samples embedded in a section
//! survive rendering untouched.
//!
//! # Unresolved tokens
//!
//! The engine is lenient: a token with no matching parameter is left in the
//! output verbatim and reported back to the caller, who decides whether to
//! log it. Rendering never fails on a missing value.

use super::params::TemplateParams;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Placeholder pattern: a name, optionally followed by one `.Field`.
static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)\s*\}\}")
        .expect("Invalid placeholder regex")
});

/// Output of substituting one piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Substitution {
    /// Text with every resolvable token replaced.
    pub text: String,
    /// Token names that had no value, in order of first appearance.
    pub unresolved: Vec<String>,
}

/// Substitute every placeholder in `text` from `params`.
///
/// # Examples
///
/// ```
/// use exforge::template::{params, substitute};
///
/// let p = params([("Topic", "Iterators"), ("Level", "Beginner")]);
/// let out = substitute("{{Level}} exercise on {{Topic}}", &p, false);
/// assert_eq!(out.text, "Beginner exercise on Iterators");
/// assert!(out.unresolved.is_empty());
/// ```
pub fn substitute(text: &str, params: &TemplateParams, include_extras: bool) -> Substitution {
    let mut unresolved: Vec<String> = Vec::new();

    let rendered = TOKEN_REGEX.replace_all(text, |caps: &Captures<'_>| {
        let token = &caps[1];
        match params.lookup(token, include_extras) {
            Some(value) => value.to_string(),
            None => {
                if !unresolved.iter().any(|t| t == token) {
                    unresolved.push(token.to_string());
                }
                caps[0].to_string()
            }
        }
    });

    Substitution {
        text: rendered.into_owned(),
        unresolved,
    }
}

/// Token names referenced by `text`, in order of first appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in TOKEN_REGEX.captures_iter(text) {
        let token = &caps[1];
        if !names.iter().any(|n| n == token) {
            names.push(token.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::params::params;

    #[test]
    fn test_simple_substitution() {
        let p = params([("Name", "Alice"), ("Greeting", "Hello")]);
        let out = substitute("{{Greeting}}, {{Name}}!", &p, false);
        assert_eq!(out.text, "Hello, Alice!");
        assert!(out.unresolved.is_empty());
    }

    #[test]
    fn test_no_placeholders() {
        let out = substitute("Just plain text", &TemplateParams::new(), false);
        assert_eq!(out.text, "Just plain text");
    }

    #[test]
    fn test_empty_text() {
        let out = substitute("", &TemplateParams::new(), false);
        assert_eq!(out.text, "");
    }

    #[test]
    fn test_unresolved_token_left_literal() {
        let p = params([("Topic", "Lifetimes")]);
        let out = substitute("{{Topic}} for {{Audience}}", &p, false);
        assert_eq!(out.text, "Lifetimes for {{Audience}}");
        assert_eq!(out.unresolved, vec!["Audience"]);
    }

    #[test]
    fn test_unresolved_reported_once() {
        let out = substitute("{{X}} {{X}} {{ X }}", &TemplateParams::new(), false);
        assert_eq!(out.unresolved, vec!["X"]);
        assert_eq!(out.text, "{{X}} {{X}} {{ X }}");
    }

    #[test]
    fn test_whitespace_in_token() {
        let p = params([("Name", "Alice")]);
        let out = substitute("Hello {{ Name }}!", &p, false);
        assert_eq!(out.text, "Hello Alice!");
    }

    #[test]
    fn test_single_braces_are_text() {
        let p = params([("Body", "x")]);
        let out = substitute("fn main() { let v = {{Body}}; }", &p, false);
        assert_eq!(out.text, "fn main() { let v = x; }");
    }

    #[test]
    fn test_braces_in_value_not_reexpanded() {
        let p = params([("Code", "{{Topic}}"), ("Topic", "nope")]);
        let out = substitute("Code: {{Code}}", &p, false);
        assert_eq!(out.text, "Code: {{Topic}}");
    }

    #[test]
    fn test_structured_field_token() {
        let p = TemplateParams::new()
            .with_structured("Mentor", [("Name", "Grace"), ("Style", "direct")]);
        let out = substitute("{{Mentor.Name}} is {{Mentor.Style}}", &p, false);
        assert_eq!(out.text, "Grace is direct");
    }

    #[test]
    fn test_extras_require_opt_in() {
        let p = TemplateParams::new().with_extra("Tone", "calm");
        assert_eq!(substitute("{{Tone}}", &p, true).text, "calm");
        assert_eq!(substitute("{{Tone}}", &p, false).unresolved, vec!["Tone"]);
    }

    #[test]
    fn test_empty_value_substitution() {
        let p = params([("Empty", "")]);
        let out = substitute("before{{Empty}}after", &p, false);
        assert_eq!(out.text, "beforeafter");
        assert!(out.unresolved.is_empty());
    }

    #[test]
    fn test_unicode_in_template_and_values() {
        let p = params([("Emoji", "🎉"), ("Text", "日本語")]);
        let out = substitute("Hello {{Emoji}} {{Text}}!", &p, false);
        assert_eq!(out.text, "Hello 🎉 日本語!");
    }

    #[test]
    fn test_placeholders_in_order() {
        let names = placeholders("{{B}} {{A}} {{B}} {{Mentor.Name}} {not}");
        assert_eq!(names, vec!["B", "A", "Mentor.Name"]);
    }
}

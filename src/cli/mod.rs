//! CLI argument parsing for exforge.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// exforge: configuration-driven programming exercise assembly.
///
/// Exercises are assembled from a YAML taxonomy (topics, skill levels,
/// exercise types) and curated exercise definitions. When no curated
/// exercise fits, a structured prompt for a generative model is produced
/// instead.
#[derive(Parser, Debug)]
#[command(name = "exforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ./exforge.yaml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (repeat for more).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands for exforge.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one exercise.
    ///
    /// Tries the topic's curated exercises, then the library, then falls
    /// back to a prompt for a generative model.
    Generate(GenerateArgs),

    /// Generate exercises for every topic a learner can take at a level.
    Curriculum(CurriculumArgs),

    /// Render a prompt template with explicit parameters.
    Render(RenderArgs),

    /// Check parameters against a template without rendering it.
    CheckTemplate(RenderArgs),

    /// Validate the topic prerequisite graph and print a learning order.
    Graph,

    /// List topics, optionally only those offered at a level.
    Topics(TopicsArgs),

    /// Show the level after the given one.
    NextLevel(NextLevelArgs),

    /// List available prompt templates.
    Templates,
}

/// Arguments for the `generate` command.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Topic id (e.g., fundamentals).
    #[arg(short, long)]
    pub topic: String,

    /// Skill level id (e.g., beginner).
    #[arg(short, long)]
    pub level: String,

    /// Exercise type id (e.g., implementation).
    #[arg(short = 'k', long = "type")]
    pub exercise_type: String,

    /// Domain context the exercise is set in.
    #[arg(short, long, default_value = "")]
    pub context: String,

    /// Leave out the test suite.
    #[arg(long)]
    pub no_tests: bool,

    /// Leave out extension challenges.
    #[arg(long)]
    pub no_extensions: bool,

    /// Prompt template to use instead of the level-based choice.
    #[arg(long)]
    pub template: Option<String>,

    /// Mentor persona name for the prompt.
    #[arg(long, requires = "mentor_style")]
    pub mentor_name: Option<String>,

    /// Mentor persona teaching style.
    #[arg(long, requires = "mentor_name")]
    pub mentor_style: Option<String>,

    /// Extra template parameter (repeatable).
    #[arg(long = "extra", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub extras: Vec<(String, String)>,

    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `curriculum` command.
#[derive(Parser, Debug)]
pub struct CurriculumArgs {
    /// Skill level id.
    #[arg(short, long)]
    pub level: String,

    /// Exercise type id.
    #[arg(short = 'k', long = "type")]
    pub exercise_type: String,

    /// Topic ids the learner has already completed.
    #[arg(long, value_delimiter = ',')]
    pub completed: Vec<String>,

    /// Domain context the exercises are set in.
    #[arg(short, long, default_value = "")]
    pub context: String,

    /// Print the full curriculum as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `render` and `check-template` commands.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Template id.
    pub template_id: String,

    /// Text parameter (repeatable).
    #[arg(short, long = "param", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Structured parameter field, e.g. Mentor.Name=Ada (repeatable).
    #[arg(long = "field", value_name = "NAME.FIELD=VALUE", value_parser = parse_key_val)]
    pub fields: Vec<(String, String)>,

    /// Extra parameter for templates that accept them (repeatable).
    #[arg(long = "extra", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub extras: Vec<(String, String)>,
}

/// Arguments for the `topics` command.
#[derive(Parser, Debug)]
pub struct TopicsArgs {
    /// Only topics offered at this level.
    #[arg(short, long)]
    pub level: Option<String>,
}

/// Arguments for the `next-level` command.
#[derive(Parser, Debug)]
pub struct NextLevelArgs {
    /// Current skill level id.
    pub level: String,
}

/// Parse `NAME=VALUE`; the value may itself contain `=`.
fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{}'", s));
    }
    Ok((name.to_string(), value.to_string()))
}

//! Command implementations for exforge.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command shares one [`Runtime`] built from the
//! loaded config.

mod generate;
mod runtime;
mod taxonomy;
mod templates;

pub use runtime::Runtime;

use crate::cli::Command;
use crate::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(runtime: &Runtime, command: Command) -> Result<()> {
    match command {
        Command::Generate(args) => generate::cmd_generate(runtime, args),
        Command::Curriculum(args) => generate::cmd_curriculum(runtime, args),
        Command::Render(args) => templates::cmd_render(runtime, args),
        Command::CheckTemplate(args) => templates::cmd_check_template(runtime, args),
        Command::Graph => taxonomy::cmd_graph(runtime),
        Command::Topics(args) => taxonomy::cmd_topics(runtime, args),
        Command::NextLevel(args) => taxonomy::cmd_next_level(runtime, args),
        Command::Templates => templates::cmd_templates(runtime),
    }
}

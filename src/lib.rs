//! exforge: configuration-driven programming exercise assembly.
//!
//! Exercises are described by a YAML taxonomy of topics, skill levels and
//! exercise types. A request is served by the first of three stages that
//! produces a structurally valid bundle: the topic's curated exercises, a
//! curated library, or a synthesized prompt for a generative model.

pub mod bundle;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod generate;
pub mod graph;
pub mod logging;
pub mod taxonomy;
pub mod template;

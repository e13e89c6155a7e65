//! Configuration types and defaults for exforge.
//!
//! This module defines enums, constants, and default value functions
//! used by the Config struct.

use crate::generate::DEFAULT_CONTEXT;
use crate::template::builtin::{ADVANCED_EXERCISE_GENERATION, EXERCISE_GENERATION};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "exforge.yaml";

/// Minimum severity written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    /// Default: degradations and fallbacks only.
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse a log level from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    /// The next more verbose level, saturating at `Trace`.
    pub fn louder(self) -> Self {
        match self {
            Self::Error => Self::Warn,
            Self::Warn => Self::Info,
            Self::Info => Self::Debug,
            Self::Debug | Self::Trace => Self::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

pub(crate) fn default_taxonomy_dir() -> String {
    "taxonomy".to_string()
}
pub(crate) fn default_exercises_dir() -> String {
    "exercises".to_string()
}
pub(crate) fn default_content_root() -> String {
    "content".to_string()
}
pub(crate) fn default_resolve_timeout_ms() -> u64 {
    5_000
}
pub(crate) fn default_advanced_rank_threshold() -> u32 {
    3
}
pub(crate) fn default_standard_template() -> String {
    EXERCISE_GENERATION.to_string()
}
pub(crate) fn default_advanced_template() -> String {
    ADVANCED_EXERCISE_GENERATION.to_string()
}
pub(crate) fn default_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for exforge.
///
/// This struct represents the contents of `exforge.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
/// Relative paths are resolved against the directory holding the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Sources
    // =========================================================================
    /// Directory holding `topics.yaml`, `skill_levels.yaml`,
    /// `exercise_types.yaml` and optionally `templates.yaml`.
    #[serde(default = "default_taxonomy_dir")]
    pub taxonomy_dir: String,

    /// Directory of exercise definition files used by the direct generators.
    #[serde(default = "default_exercises_dir")]
    pub exercises_dir: String,

    /// Directory of curated library definitions. Unset disables the library stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_dir: Option<String>,

    /// Root of the content store that artifact references resolve against.
    #[serde(default = "default_content_root")]
    pub content_root: String,

    /// NDJSON file for diagnostic events. Unset disables event recording.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_file: Option<String>,

    // =========================================================================
    // Resolution
    // =========================================================================
    /// Upper bound on reading all artifacts of one bundle.
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,

    /// Seconds before a loaded taxonomy is considered stale. Unset means never.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_seconds: Option<u64>,

    // =========================================================================
    // Prompt synthesis
    // =========================================================================
    /// Levels with at least this rank get the advanced template.
    #[serde(default = "default_advanced_rank_threshold")]
    pub advanced_rank_threshold: u32,

    #[serde(default = "default_standard_template")]
    pub standard_template: String,

    #[serde(default = "default_advanced_template")]
    pub advanced_template: String,

    /// Context used when a request leaves it blank.
    #[serde(default = "default_context")]
    pub default_context: String,

    // =========================================================================
    // Logging
    // =========================================================================
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            taxonomy_dir: default_taxonomy_dir(),
            exercises_dir: default_exercises_dir(),
            library_dir: None,
            content_root: default_content_root(),
            events_file: None,
            resolve_timeout_ms: default_resolve_timeout_ms(),
            cache_ttl_seconds: None,
            advanced_rank_threshold: default_advanced_rank_threshold(),
            standard_template: default_standard_template(),
            advanced_template: default_advanced_template(),
            default_context: default_context(),
            log_level: LogLevel::default(),
        }
    }
}

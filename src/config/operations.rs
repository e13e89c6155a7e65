//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::CONFIG_FILE_NAME;
use crate::error::{ExforgeError, Result};
use crate::generate::OrchestratorSettings;
use std::path::{Path, PathBuf};
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Relative paths in the file are resolved against the file's directory.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(ExforgeError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ExforgeError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_yaml(&content)?;
        let base = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        config.resolve_paths(base);
        Ok(config)
    }

    /// Load the explicit config file, or `exforge.yaml` in `cwd` if present.
    ///
    /// An explicit path must exist. Without one, a missing default file
    /// yields the defaults resolved against `cwd`.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default_path = cwd.join(CONFIG_FILE_NAME);
        if default_path.is_file() {
            return Self::load(default_path);
        }

        let mut config = Self::default();
        config.resolve_paths(cwd);
        Ok(config)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| ExforgeError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ExforgeError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `resolve_timeout_ms` must be positive
    /// - `advanced_rank_threshold` must be positive
    /// - `cache_ttl_seconds`, when set, must be positive
    /// - template ids and `default_context` must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.resolve_timeout_ms == 0 {
            return Err(ExforgeError::UserError(
                "config validation failed: resolve_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.advanced_rank_threshold == 0 {
            return Err(ExforgeError::UserError(
                "config validation failed: advanced_rank_threshold must be greater than 0"
                    .to_string(),
            ));
        }

        if self.cache_ttl_seconds == Some(0) {
            return Err(ExforgeError::UserError(
                "config validation failed: cache_ttl_seconds must be greater than 0 (omit it to never expire)"
                    .to_string(),
            ));
        }

        for (field, value) in [
            ("standard_template", &self.standard_template),
            ("advanced_template", &self.advanced_template),
            ("default_context", &self.default_context),
            ("taxonomy_dir", &self.taxonomy_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ExforgeError::UserError(format!(
                    "config validation failed: {} must not be empty",
                    field
                )));
            }
        }

        Ok(())
    }

    /// Make every relative path absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |value: &str| -> String {
            if Path::new(value).is_absolute() {
                value.to_string()
            } else {
                base.join(value).to_string_lossy().into_owned()
            }
        };

        self.taxonomy_dir = join(&self.taxonomy_dir);
        self.exercises_dir = join(&self.exercises_dir);
        self.content_root = join(&self.content_root);
        self.library_dir = self.library_dir.as_deref().map(join);
        self.events_file = self.events_file.as_deref().map(join);
    }

    pub fn taxonomy_path(&self) -> PathBuf {
        PathBuf::from(&self.taxonomy_dir)
    }

    pub fn exercises_path(&self) -> PathBuf {
        PathBuf::from(&self.exercises_dir)
    }

    pub fn content_path(&self) -> PathBuf {
        PathBuf::from(&self.content_root)
    }

    pub fn library_path(&self) -> Option<PathBuf> {
        self.library_dir.as_ref().map(PathBuf::from)
    }

    pub fn events_path(&self) -> Option<PathBuf> {
        self.events_file.as_ref().map(PathBuf::from)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_seconds.map(Duration::from_secs)
    }

    /// Prompt synthesis settings for the orchestrator.
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            advanced_rank_threshold: self.advanced_rank_threshold,
            standard_template: self.standard_template.clone(),
            advanced_template: self.advanced_template.clone(),
            default_context: self.default_context.clone(),
        }
    }
}

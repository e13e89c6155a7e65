//! Diagnostic events for generation runs.
//!
//! The orchestrator emits one event per stage attempt and per stage outcome.
//! Events can be appended to an NDJSON file (one JSON object per line) or
//! kept in memory.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: What happened (stage_attempt, stage_success, stage_advance, ...)
//! - `actor`: The owner string (e.g., `user@HOST`)
//! - `request`: Optional `topic/level/type` label of the request
//! - `details`: Freeform object with action-specific details
//!
//! # Usage
//!
//! ```no_run
//! use exforge::events::{Event, EventAction, EventSink, NdjsonEventLog};
//! use serde_json::json;
//!
//! let log = NdjsonEventLog::new("events.ndjson");
//! let event = Event::new(EventAction::StageAttempt)
//!     .with_request("fundamentals/beginner/implementation")
//!     .with_details(json!({"stage": "direct"}));
//! log.record(&event)?;
//! # Ok::<(), exforge::error::ExforgeError>(())
//! ```

use crate::error::{ExforgeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// A generation stage was started
    StageAttempt,
    /// A stage produced the result
    StageSuccess,
    /// A stage failed and the next one runs
    StageAdvance,
    /// Prompt synthesis fell back to another template
    TemplateFallback,
    /// A curriculum was assembled
    Curriculum,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::StageAttempt => write!(f, "stage_attempt"),
            EventAction::StageSuccess => write!(f, "stage_success"),
            EventAction::StageAdvance => write!(f, "stage_advance"),
            EventAction::TemplateFallback => write!(f, "template_fallback"),
            EventAction::Curriculum => write!(f, "curriculum"),
        }
    }
}

/// A diagnostic event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    pub action: EventAction,

    /// Who ran the process (e.g., `user@HOST`).
    pub actor: String,

    /// `topic/level/type` label of the request, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            request: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_request(mut self, label: impl Into<String>) -> Self {
        self.request = Some(label.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ExforgeError::UserError(format!("failed to serialize event to JSON: {}", e)))
    }
}

/// Get the actor string for event metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Destination for diagnostic events.
///
/// Callers log sink failures and carry on; an event that cannot be recorded
/// never fails a generation.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &Event) -> Result<()>;
}

/// Append-only NDJSON event file.
#[derive(Debug, Clone)]
pub struct NdjsonEventLog {
    path: PathBuf,
}

impl NdjsonEventLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for NdjsonEventLog {
    /// Append the event as one line, creating the file and its directory if needed.
    fn record(&self, event: &Event) -> Result<()> {
        let json_line = event.to_ndjson_line()?;

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir).map_err(|e| {
                ExforgeError::UserError(format!(
                    "failed to create events directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ExforgeError::UserError(format!(
                    "failed to open events file '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", json_line).map_err(|e| {
            ExforgeError::UserError(format!(
                "failed to write event to '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<Event>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event recorded so far, in order.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn actions(&self) -> Vec<EventAction> {
        self.events().iter().map(|e| e.action).collect()
    }
}

impl EventSink for MemoryEventLog {
    fn record(&self, event: &Event) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| ExforgeError::UserError("event log lock poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}

/// Read every event from an NDJSON file.
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<Event>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        ExforgeError::UserError(format!(
            "failed to read events file '{}': {}",
            path.display(),
            e
        ))
    })?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| {
                ExforgeError::UserError(format!("malformed event line in '{}': {}", path.display(), e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_event_serializes_to_single_line() {
        let event = Event::new(EventAction::StageAttempt)
            .with_request("fundamentals/beginner/implementation")
            .with_details(json!({"stage": "direct"}));

        let line = event.to_ndjson_line().unwrap();

        assert!(!line.contains('\n'));
        assert!(line.contains("\"action\":\"stage_attempt\""));
        assert!(line.contains("\"request\":\"fundamentals/beginner/implementation\""));
    }

    #[test]
    fn test_event_without_request_omits_field() {
        let line = Event::new(EventAction::Curriculum).to_ndjson_line().unwrap();
        assert!(!line.contains("\"request\""));
    }

    #[test]
    fn test_actor_has_user_at_host_shape() {
        let event = Event::new(EventAction::StageSuccess);
        assert!(event.actor.contains('@'));
    }

    #[test]
    fn test_ndjson_log_appends_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("events.ndjson");
        let log = NdjsonEventLog::new(&path);

        log.record(&Event::new(EventAction::StageAttempt)).unwrap();
        log.record(
            &Event::new(EventAction::StageAdvance).with_details(json!({"stage": "library"})),
        )
        .unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, EventAction::StageAttempt);
        assert_eq!(events[1].details["stage"], "library");
    }

    #[test]
    fn test_memory_log_keeps_order() {
        let log = MemoryEventLog::new();
        log.record(&Event::new(EventAction::StageAttempt)).unwrap();
        log.record(&Event::new(EventAction::StageSuccess)).unwrap();

        assert_eq!(
            log.actions(),
            vec![EventAction::StageAttempt, EventAction::StageSuccess]
        );
    }

    #[test]
    fn test_action_display_matches_serde_name() {
        for action in [
            EventAction::StageAttempt,
            EventAction::StageSuccess,
            EventAction::StageAdvance,
            EventAction::TemplateFallback,
            EventAction::Curriculum,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action));
        }
    }
}

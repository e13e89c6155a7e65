//! Dependency edge and issue types.

use serde::Serialize;
use std::fmt;

/// A prerequisite edge: `topic_id` requires `prerequisite_id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DependencyEdge {
    pub topic_id: String,
    pub prerequisite_id: String,
}

impl DependencyEdge {
    pub fn new(topic_id: impl Into<String>, prerequisite_id: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            prerequisite_id: prerequisite_id.into(),
        }
    }
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.topic_id, self.prerequisite_id)
    }
}

/// Why an edge is a problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IssueReason {
    /// The prerequisite id names no known topic.
    DanglingReference,
    /// Following the edge closes a cycle. `path` starts and ends at the same topic.
    CycleDetected { path: Vec<String> },
}

/// One problem found in the prerequisite graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyIssue {
    pub edge: DependencyEdge,
    #[serde(flatten)]
    pub reason: IssueReason,
}

impl DependencyIssue {
    pub fn is_cycle(&self) -> bool {
        matches!(self.reason, IssueReason::CycleDetected { .. })
    }
}

impl fmt::Display for DependencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            IssueReason::DanglingReference => write!(
                f,
                "topic '{}' requires unknown topic '{}'",
                self.edge.topic_id, self.edge.prerequisite_id
            ),
            IssueReason::CycleDetected { path } => {
                write!(f, "prerequisite cycle: {}", path.join(" -> "))
            }
        }
    }
}

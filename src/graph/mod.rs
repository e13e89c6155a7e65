//! Prerequisite dependency graph over topics.
//!
//! The graph is built from each topic's prerequisite list. Validation never
//! fails: it returns a list of [`DependencyIssue`]s and the caller decides
//! whether that list is fatal.
//!
//! Traversal runs over topic ids in sorted order so the same taxonomy always
//! produces the same report.

mod types;


pub use types::{DependencyEdge, DependencyIssue, IssueReason};

use crate::error::{ExforgeError, Result};
use crate::taxonomy::{DefinitionKind, TaxonomyIndex, TopicDefinition};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Directed graph: topic id -> prerequisite ids in declared order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    prerequisites: BTreeMap<String, Vec<String>>,
    /// Topic ids in configuration order.
    order: Vec<String>,
}

impl DependencyGraph {
    pub fn from_topics<'a, I>(topics: I) -> Self
    where
        I: IntoIterator<Item = &'a TopicDefinition>,
    {
        let mut graph = Self::default();
        for topic in topics {
            if graph
                .prerequisites
                .insert(topic.id.clone(), topic.prerequisites.clone())
                .is_none()
            {
                graph.order.push(topic.id.clone());
            }
        }
        graph
    }

    pub fn from_index(index: &TaxonomyIndex) -> Self {
        Self::from_topics(index.topics())
    }

    pub fn contains(&self, topic_id: &str) -> bool {
        self.prerequisites.contains_key(topic_id)
    }

    /// Every edge, sorted by topic id then declared prerequisite order.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.prerequisites
            .iter()
            .flat_map(|(topic, prereqs)| {
                prereqs
                    .iter()
                    .map(move |prereq| DependencyEdge::new(topic.clone(), prereq.clone()))
            })
            .collect()
    }

    /// Check every edge for dangling references and cycles.
    ///
    /// Dangling references come first, then cycles. Each cycle is reported
    /// once, on the edge that closes it.
    pub fn validate_all(&self) -> Vec<DependencyIssue> {
        let mut issues: Vec<DependencyIssue> = self
            .edges()
            .into_iter()
            .filter(|edge| !self.contains(&edge.prerequisite_id))
            .map(|edge| DependencyIssue {
                edge,
                reason: IssueReason::DanglingReference,
            })
            .collect();

        let mut marks: HashMap<&str, Mark> = self
            .prerequisites
            .keys()
            .map(|id| (id.as_str(), Mark::Unvisited))
            .collect();

        for id in self.prerequisites.keys() {
            if marks.get(id.as_str()) == Some(&Mark::Unvisited) {
                self.visit(id, &mut marks, &mut issues);
            }
        }

        issues
    }

    /// Depth-first walk from `root` with an explicit stack.
    ///
    /// Each frame is a topic on the current path and the position of its
    /// next prerequisite.
    fn visit<'a>(
        &'a self,
        root: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        issues: &mut Vec<DependencyIssue>,
    ) {
        marks.insert(root, Mark::InProgress);
        let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let id = frame.0;
            let Some(prereq) = self.prerequisites.get(id).and_then(|p| p.get(frame.1)) else {
                stack.pop();
                marks.insert(id, Mark::Done);
                continue;
            };
            frame.1 += 1;

            match marks.get(prereq.as_str()) {
                Some(Mark::Unvisited) => {
                    marks.insert(prereq.as_str(), Mark::InProgress);
                    stack.push((prereq.as_str(), 0));
                }
                Some(Mark::InProgress) => {
                    let start = stack
                        .iter()
                        .position(|(p, _)| *p == prereq.as_str())
                        .unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|(p, _)| p.to_string()).collect();
                    cycle.push(prereq.clone());
                    issues.push(DependencyIssue {
                        edge: DependencyEdge::new(id, prereq.clone()),
                        reason: IssueReason::CycleDetected { path: cycle },
                    });
                }
                // Done, or dangling (already reported).
                _ => {}
            }
        }
    }

    /// True iff every declared prerequisite of `topic_id` is in `completed`.
    ///
    /// Unknown topic ids are never satisfied.
    pub fn are_prerequisites_satisfied(&self, topic_id: &str, completed: &HashSet<String>) -> bool {
        match self.prerequisites.get(topic_id) {
            Some(prereqs) => prereqs.iter().all(|p| completed.contains(p)),
            None => false,
        }
    }

    /// Declared prerequisites of `topic_id` that are not in `completed`.
    pub fn missing_prerequisites(
        &self,
        topic_id: &str,
        completed: &HashSet<String>,
    ) -> Result<Vec<String>> {
        let prereqs = self
            .prerequisites
            .get(topic_id)
            .ok_or_else(|| ExforgeError::NotFound {
                kind: DefinitionKind::Topic,
                id: topic_id.to_string(),
            })?;
        Ok(prereqs
            .iter()
            .filter(|p| !completed.contains(*p))
            .cloned()
            .collect())
    }

    /// Topic ids with every prerequisite ahead of the topics that need it.
    ///
    /// Ties follow configuration order.
    ///
    /// # Errors
    ///
    /// * `Dependency` - the graph has dangling references or cycles
    pub fn learning_order(&self) -> Result<Vec<String>> {
        let issues = self.validate_all();
        if !issues.is_empty() {
            return Err(ExforgeError::Dependency(issues));
        }

        let mut placed: HashSet<&str> = HashSet::new();
        let mut order: Vec<String> = Vec::with_capacity(self.order.len());
        for id in &self.order {
            self.place(id, &mut placed, &mut order);
        }
        Ok(order)
    }

    // Only called on an acyclic graph with no dangling references.
    fn place<'a>(&'a self, root: &'a str, placed: &mut HashSet<&'a str>, order: &mut Vec<String>) {
        if !placed.insert(root) {
            return;
        }
        let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];
        while let Some(frame) = stack.last_mut() {
            let id = frame.0;
            match self.prerequisites.get(id).and_then(|p| p.get(frame.1)) {
                Some(prereq) => {
                    frame.1 += 1;
                    if placed.insert(prereq.as_str()) {
                        stack.push((prereq.as_str(), 0));
                    }
                }
                None => {
                    stack.pop();
                    order.push(id.to_string());
                }
            }
        }
    }
}

//! Access to the host's job dependency graph.
//!
//! The walker never owns the graph. It asks a [`GraphAccessor`] to resolve a
//! job by name and to list a job's direct upstream (prerequisite) jobs.
//! [`InMemoryGraph`] is the accessor used by the CLI and by tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{WalkError, WalkResult};
use crate::model::JobNode;

/// Lookup interface over the host's dependency graph.
///
/// Implementations must return upstream jobs in a stable order; the walk
/// order is derived from it.
pub trait GraphAccessor: Send + Sync {
    /// Resolve a job by its full name.
    fn resolve(&self, name: &str) -> WalkResult<JobNode>;

    /// Direct upstream jobs of `node`, in the host's declared order.
    fn upstream_of(&self, node: &JobNode) -> WalkResult<Vec<JobNode>>;
}

/// Dependency graph held in memory.
///
/// Upstream edges are stored per dependent in insertion order, so repeated
/// walks over the same graph always produce the same sequence.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraph {
    nodes: HashMap<String, JobNode>,
    /// `dependent -> [dependency, ...]`
    upstream: HashMap<String, Vec<String>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job. Re-registering an existing name replaces its snapshot
    /// but keeps its edges.
    pub fn add_node(&mut self, node: JobNode) {
        self.upstream.entry(node.name.clone()).or_default();
        self.nodes.insert(node.name.clone(), node);
    }

    /// Record that `dependent` requires `dependency`.
    ///
    /// Both jobs must already be registered. Adding the same edge twice is a
    /// no-op.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> WalkResult<()> {
        for name in [dependent, dependency] {
            if !self.nodes.contains_key(name) {
                return Err(WalkError::NodeNotFound {
                    node: name.to_string(),
                });
            }
        }
        let edges = self.upstream.entry(dependent.to_string()).or_default();
        if !edges.iter().any(|existing| existing == dependency) {
            edges.push(dependency.to_string());
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Build a graph from a parsed [`GraphDocument`].
    ///
    /// All jobs are registered before any edge, so entries may reference jobs
    /// declared later in the document.
    pub fn from_document(document: GraphDocument) -> WalkResult<Self> {
        let mut graph = Self::new();
        let mut edges = Vec::new();
        for entry in document.jobs {
            for dependency in &entry.upstream {
                edges.push((entry.job.name.clone(), dependency.clone()));
            }
            graph.add_node(entry.job);
        }
        for (dependent, dependency) in edges {
            graph.add_dependency(&dependent, &dependency)?;
        }
        Ok(graph)
    }
}

impl GraphAccessor for InMemoryGraph {
    fn resolve(&self, name: &str) -> WalkResult<JobNode> {
        self.nodes
            .get(name)
            .cloned()
            .ok_or_else(|| WalkError::NodeNotFound {
                node: name.to_string(),
            })
    }

    fn upstream_of(&self, node: &JobNode) -> WalkResult<Vec<JobNode>> {
        self.upstream
            .get(&node.name)
            .into_iter()
            .flatten()
            .map(|name| self.resolve(name))
            .collect()
    }
}

/// Serialized form of a dependency graph (JSON or TOML).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

/// One job in a [`GraphDocument`] together with its upstream job names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    #[serde(flatten)]
    pub job: JobNode,
    #[serde(default)]
    pub upstream: Vec<String>,
}

impl GraphDocument {
    pub fn from_json(text: &str) -> WalkResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_unknown_job_fails() {
        let graph = InMemoryGraph::new();
        let err = graph.resolve("ghost").unwrap_err();
        assert!(matches!(err, WalkError::NodeNotFound { node } if node == "ghost"));
    }

    #[test]
    fn test_upstream_keeps_insertion_order() {
        let mut graph = InMemoryGraph::new();
        for name in ["b", "a", "top"] {
            graph.add_node(JobNode::new(name));
        }
        graph.add_dependency("top", "b").unwrap();
        graph.add_dependency("top", "a").unwrap();
        graph.add_dependency("top", "b").unwrap();

        let top = graph.resolve("top").unwrap();
        let names: Vec<String> = graph
            .upstream_of(&top)
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_add_dependency_requires_both_nodes() {
        let mut graph = InMemoryGraph::new();
        graph.add_node(JobNode::new("a"));
        let result = graph.add_dependency("a", "missing");
        assert!(matches!(result, Err(WalkError::NodeNotFound { .. })));
    }

    #[test]
    fn test_from_document_allows_forward_references() {
        let document = GraphDocument::from_json(
            r#"{
                "jobs": [
                    { "name": "parent", "upstream": ["child"] },
                    { "name": "child", "history": { "last_successful": 4 } }
                ]
            }"#,
        )
        .unwrap();
        let graph = InMemoryGraph::from_document(document).unwrap();
        assert_eq!(graph.len(), 2);

        let parent = graph.resolve("parent").unwrap();
        let upstream = graph.upstream_of(&parent).unwrap();
        assert_eq!(upstream.len(), 1);
        assert_eq!(upstream[0].history.last_successful, Some(4));
    }

    #[test]
    fn test_from_document_rejects_dangling_upstream() {
        let document =
            GraphDocument::from_json(r#"{ "jobs": [ { "name": "a", "upstream": ["nope"] } ] }"#)
                .unwrap();
        let result = InMemoryGraph::from_document(document);
        assert!(matches!(result, Err(WalkError::NodeNotFound { node }) if node == "nope"));
    }
}

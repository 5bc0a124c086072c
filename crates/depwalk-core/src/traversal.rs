//! Dependency-order linearization of a job and its upstream jobs.
//!
//! The walk is a post-order depth-first traversal: every upstream job is
//! visited (in accessor order) before the job itself is appended. The root is
//! therefore always the last element and every job appears after all of its
//! transitive prerequisites.

use std::collections::HashSet;

use crate::error::{WalkError, WalkResult};
use crate::graph::GraphAccessor;
use crate::model::JobNode;

/// Insertion-ordered, duplicate-free sequence of jobs.
///
/// The vector carries the order, the set answers membership by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedNodes {
    nodes: Vec<JobNode>,
    names: HashSet<String>,
}

impl OrderedNodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `node` unless a job with the same name is already present.
    /// Returns `true` when the node was added.
    pub fn push(&mut self, node: JobNode) -> bool {
        if self.names.contains(&node.name) {
            return false;
        }
        self.names.insert(node.name.clone());
        self.nodes.push(node);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Index of the job called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        if !self.contains(name) {
            return None;
        }
        self.nodes.iter().position(|n| n.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JobNode> {
        self.nodes.iter()
    }

    /// Job names in order.
    pub fn names(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.name.clone()).collect()
    }

    /// The last job of the sequence (the walk root).
    pub fn last(&self) -> Option<&JobNode> {
        self.nodes.last()
    }

    pub fn into_vec(self) -> Vec<JobNode> {
        self.nodes
    }
}

impl<'a> IntoIterator for &'a OrderedNodes {
    type Item = &'a JobNode;
    type IntoIter = std::slice::Iter<'a, JobNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Traversal engine over a [`GraphAccessor`].
///
/// Holds no state between calls; every [`traverse`](Traversal::traverse)
/// builds a fresh sequence, so one engine can serve concurrent walks.
pub struct Traversal<'g> {
    graph: &'g dyn GraphAccessor,
}

impl<'g> Traversal<'g> {
    pub fn new(graph: &'g dyn GraphAccessor) -> Self {
        Self { graph }
    }

    /// Resolve `root` and return it together with all of its transitive
    /// upstream jobs, prerequisites first.
    ///
    /// Fails with [`WalkError::NodeNotFound`] if `root` or any upstream
    /// reference cannot be resolved, and with [`WalkError::CycleDetected`] if
    /// a job is reached again while it is still being expanded.
    pub fn traverse(&self, root: &str) -> WalkResult<OrderedNodes> {
        let root = self.graph.resolve(root)?;
        let mut ordered = OrderedNodes::new();
        let mut path = Vec::new();
        self.visit(root, &mut ordered, &mut path)?;
        tracing::debug!(
            root = %ordered.last().map(|n| n.name.as_str()).unwrap_or_default(),
            jobs = ordered.len(),
            "dependency order computed"
        );
        Ok(ordered)
    }

    fn visit(
        &self,
        node: JobNode,
        ordered: &mut OrderedNodes,
        path: &mut Vec<String>,
    ) -> WalkResult<()> {
        if ordered.contains(&node.name) {
            return Ok(());
        }
        if let Some(start) = path.iter().position(|name| *name == node.name) {
            let mut cycle = path[start..].to_vec();
            cycle.push(node.name);
            return Err(WalkError::CycleDetected { path: cycle });
        }

        path.push(node.name.clone());
        for upstream in self.graph.upstream_of(&node)? {
            self.visit(upstream, ordered, path)?;
        }
        path.pop();

        ordered.push(node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryGraph;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> InMemoryGraph {
        let mut g = InMemoryGraph::new();
        for name in nodes {
            g.add_node(JobNode::new(*name));
        }
        for (dependent, dependency) in edges {
            g.add_dependency(dependent, dependency).unwrap();
        }
        g
    }

    /// parent_a needs child_a; parent_b needs child_a and child_b;
    /// grand needs parent_a and parent_b.
    fn diamond() -> InMemoryGraph {
        graph(
            &["child_a", "child_b", "parent_a", "parent_b", "grand"],
            &[
                ("parent_a", "child_a"),
                ("parent_b", "child_a"),
                ("parent_b", "child_b"),
                ("grand", "parent_a"),
                ("grand", "parent_b"),
            ],
        )
    }

    #[test]
    fn test_diamond_order_is_canonical() {
        let g = diamond();
        let order = Traversal::new(&g).traverse("grand").unwrap();
        assert_eq!(
            order.names(),
            vec!["child_a", "parent_a", "child_b", "parent_b", "grand"]
        );
    }

    #[test]
    fn test_job_without_upstream_is_singleton() {
        let g = diamond();
        let order = Traversal::new(&g).traverse("child_a").unwrap();
        assert_eq!(order.names(), vec!["child_a"]);
    }

    #[test]
    fn test_upstream_precedes_dependents() {
        let g = diamond();
        let order = Traversal::new(&g).traverse("grand").unwrap();
        for node in &order {
            let index = order.position(&node.name).unwrap();
            for upstream in g.upstream_of(node).unwrap() {
                let up_index = order.position(&upstream.name).unwrap();
                assert!(up_index < index, "{} must precede {}", upstream.name, node.name);
            }
        }
    }

    #[test]
    fn test_traverse_is_repeatable() {
        let g = diamond();
        let engine = Traversal::new(&g);
        assert_eq!(
            engine.traverse("grand").unwrap(),
            engine.traverse("grand").unwrap()
        );
    }

    #[test]
    fn test_unreachable_jobs_are_excluded() {
        let g = diamond();
        let order = Traversal::new(&g).traverse("parent_a").unwrap();
        assert_eq!(order.names(), vec!["child_a", "parent_a"]);
        assert!(!order.contains("child_b"));
    }

    #[test]
    fn test_unknown_root_fails() {
        let g = diamond();
        let err = Traversal::new(&g).traverse("nobody").unwrap_err();
        assert!(matches!(err, WalkError::NodeNotFound { node } if node == "nobody"));
    }

    #[test]
    fn test_cycle_fails_fast_with_path() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "b")]);
        let err = Traversal::new(&g).traverse("a").unwrap_err();
        match err {
            WalkError::CycleDetected { path } => assert_eq!(path, vec!["b", "c", "b"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let g = graph(&["solo"], &[("solo", "solo")]);
        let err = Traversal::new(&g).traverse("solo").unwrap_err();
        assert!(matches!(err, WalkError::CycleDetected { .. }));
    }

    /// Host graph whose edges are stored by name and resolved lazily, so an
    /// upstream reference can point at a job the host no longer knows.
    struct LazyGraph {
        jobs: Vec<&'static str>,
        edges: Vec<(&'static str, &'static str)>,
    }

    impl GraphAccessor for LazyGraph {
        fn resolve(&self, name: &str) -> WalkResult<JobNode> {
            if self.jobs.iter().any(|job| *job == name) {
                Ok(JobNode::new(name))
            } else {
                Err(WalkError::NodeNotFound {
                    node: name.to_string(),
                })
            }
        }

        fn upstream_of(&self, node: &JobNode) -> WalkResult<Vec<JobNode>> {
            self.edges
                .iter()
                .filter(|(dependent, _)| *dependent == node.name)
                .map(|(_, dependency)| self.resolve(dependency))
                .collect()
        }
    }

    fn dangling() -> LazyGraph {
        LazyGraph {
            jobs: vec!["lib", "app"],
            edges: vec![("app", "lib"), ("lib", "deleted_job")],
        }
    }

    #[test]
    fn test_unresolvable_upstream_fails_traversal() {
        let g = dangling();
        let err = Traversal::new(&g).traverse("app").unwrap_err();
        assert!(matches!(err, WalkError::NodeNotFound { node } if node == "deleted_job"));
    }

    #[test]
    fn test_unresolvable_upstream_stops_walk_before_scheduling() {
        use crate::fakes::RecordingObserver;
        use crate::walker::{WalkExecution, WalkStep};
        use std::sync::Arc;

        let observer = Arc::new(RecordingObserver::new());
        let exec = WalkExecution::new(WalkStep::new("app"), Arc::new(dangling()), observer.clone());

        let err = exec.plan().unwrap_err();
        assert!(matches!(err, WalkError::NodeNotFound { node } if node == "deleted_job"));
        assert!(observer
            .messages()
            .iter()
            .all(|m| !m.starts_with("Scheduling project")));
    }

    #[test]
    fn test_ordered_nodes_rejects_duplicates() {
        let mut ordered = OrderedNodes::new();
        assert!(ordered.push(JobNode::new("x")));
        assert!(!ordered.push(JobNode::new("x")));
        assert_eq!(ordered.len(), 1);
    }
}

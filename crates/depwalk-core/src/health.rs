//! Health gate over a walk's job sequence.
//!
//! A job that has never been built successfully is only reported. A job
//! whose last unsuccessful build is newer than its last successful one has
//! "recently failed" and, when enforcement is on, blocks the walk.

use serde::{Deserialize, Serialize};

use crate::error::{WalkError, WalkResult};
use crate::model::JobNode;
use crate::observer::ProgressObserver;
use crate::traversal::OrderedNodes;

/// Health classification of a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeHealth {
    Healthy,
    /// No successful build on record and no failure either.
    NeverBuilt,
    /// Latest unsuccessful build is newer than the latest successful one.
    RecentlyFailed,
}

impl NodeHealth {
    pub fn of(node: &JobNode) -> Self {
        if node.history.recently_failed() {
            NodeHealth::RecentlyFailed
        } else if node.history.never_built() {
            NodeHealth::NeverBuilt
        } else {
            NodeHealth::Healthy
        }
    }
}

/// Per-job health entry, in walk order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthEntry {
    pub job: String,
    pub health: NodeHealth,
    pub last_successful: Option<u64>,
    pub last_unsuccessful: Option<u64>,
}

/// Health of every job in a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub entries: Vec<HealthEntry>,
}

impl HealthReport {
    /// Classify every job of `sequence` without emitting anything.
    pub fn inspect(sequence: &OrderedNodes) -> Self {
        let entries = sequence
            .iter()
            .map(|node| HealthEntry {
                job: node.name.clone(),
                health: NodeHealth::of(node),
                last_successful: node.history.last_successful,
                last_unsuccessful: node.history.last_unsuccessful,
            })
            .collect();
        Self { entries }
    }

    /// Jobs that recently failed, in walk order.
    pub fn offending(&self) -> Vec<String> {
        self.with_health(NodeHealth::RecentlyFailed)
    }

    /// Jobs without any successful build, in walk order.
    ///
    /// A job that failed and never succeeded shows up here and in
    /// [`offending`](Self::offending).
    pub fn never_built(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.last_successful.is_none())
            .map(|e| e.job.clone())
            .collect()
    }

    pub fn is_healthy(&self) -> bool {
        self.offending().is_empty()
    }

    fn with_health(&self, health: NodeHealth) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.health == health)
            .map(|e| e.job.clone())
            .collect()
    }
}

/// Opt-in gate that rejects a walk when an upstream job recently failed.
pub struct HealthGate;

impl HealthGate {
    /// Inspect `sequence`, report findings to `observer`, and fail with
    /// [`WalkError::UnhealthyDependency`] if `enforce` is set and any job
    /// recently failed.
    ///
    /// With `enforce == false` the findings are still reported but the gate
    /// always passes.
    pub fn check(
        sequence: &OrderedNodes,
        enforce: bool,
        observer: &dyn ProgressObserver,
    ) -> WalkResult<HealthReport> {
        let report = HealthReport::inspect(sequence);

        for entry in &report.entries {
            if entry.last_successful.is_none() {
                observer.on_message(&format!(
                    "Project {} has never been successfully built.",
                    entry.job
                ));
            }
            if entry.health == NodeHealth::RecentlyFailed {
                tracing::warn!(
                    job = %entry.job,
                    last_successful = ?entry.last_successful,
                    last_unsuccessful = ?entry.last_unsuccessful,
                    "job recently failed"
                );
                observer.on_message(&format!("Project {} has recently failed.", entry.job));
            }
        }

        let offending = report.offending();
        crate::obs::emit_health_checked(sequence.len(), offending.len(), enforce);
        if enforce && !offending.is_empty() {
            return Err(WalkError::UnhealthyDependency { nodes: offending });
        }
        Ok(report)
    }
}

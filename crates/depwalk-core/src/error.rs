//! Error types for dependency walking and script generation.

use thiserror::Error;

/// Errors raised while planning or submitting a walk.
///
/// Every variant is produced before anything is handed to a
/// [`ScriptExecutor`](crate::executor::ScriptExecutor), so a caller can treat
/// `Err` as "nothing was started".
#[derive(Debug, Error)]
pub enum WalkError {
    /// A job name could not be resolved through the graph accessor.
    #[error("job not found in dependency graph: {node}")]
    NodeNotFound { node: String },

    /// A job was reached again while it was still being expanded.
    #[error("dependency cycle detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    /// Health enforcement was on and at least one job recently failed.
    #[error("not all the projects have latest build successful: {}", nodes.join(", "))]
    UnhealthyDependency { nodes: Vec<String> },

    /// The walk step was configured with unusable values.
    #[error("invalid walk step: {0}")]
    InvalidStep(String),

    /// The executor refused the assembled script.
    #[error("script submission failed: {0}")]
    Submission(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias.
pub type WalkResult<T> = std::result::Result<T, WalkError>;

/// Failures reported by a script executor after submission.
///
/// These never flow back through [`WalkError`]; they reach the host through
/// [`CompletionCallback::on_failure`](crate::executor::CompletionCallback::on_failure).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("failed to spawn script interpreter: {0}")]
    Spawn(String),

    #[error("script timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("script execution aborted")]
    Aborted,

    #[error("script execution failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_displays_path() {
        let err = WalkError::CycleDetected {
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> a");
    }

    #[test]
    fn test_unhealthy_error_names_offenders() {
        let err = WalkError::UnhealthyDependency {
            nodes: vec!["child_a".to_string(), "parent_b".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("child_a"));
        assert!(msg.contains("parent_b"));
    }

    #[test]
    fn test_node_not_found_displays_name() {
        let err = WalkError::NodeNotFound {
            node: "missing".to_string(),
        };
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_timeout_error_display() {
        let err = ExecutionError::Timeout { secs: 30 };
        assert!(err.to_string().contains("30"));
    }
}

//! Progress reporting hooks.

use crate::model::JobNode;

/// Receives human-readable progress while a walk is planned.
///
/// Hosts typically forward these lines to the console of the invoking build.
pub trait ProgressObserver: Send + Sync {
    /// A job has been queued into the action script.
    fn on_node_queued(&self, node: &JobNode) {
        self.on_message(&format!("Scheduling project: {}", node.name));
    }

    /// Free-form progress line (health notes, the generated script, ...).
    fn on_message(&self, message: &str);
}

/// Observer that forwards every line to `tracing` at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_node_queued(&self, node: &JobNode) {
        tracing::info!(job = %node.name, "Scheduling project: {}", node.name);
    }

    fn on_message(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Observer that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_message(&self, _message: &str) {}
}

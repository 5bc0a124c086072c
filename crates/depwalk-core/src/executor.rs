//! Hand-off boundary between the walker and the host's script executor.
//!
//! Submission is fire-and-continue: [`ScriptExecutor::submit`] returns as
//! soon as the script is accepted, and the outcome arrives later through the
//! [`CompletionCallback`] passed alongside it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{ExecutionError, WalkResult};
use crate::script::ActionScript;

/// Result of running a submitted script to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub execution_id: Uuid,
    /// Exit code of the interpreter (0 = success).
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub success: bool,
    pub started_at: DateTime<Utc>,
}

impl ExecutionOutcome {
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }
}

/// Receives the asynchronous result of a submitted script.
pub trait CompletionCallback: Send + Sync {
    /// The interpreter ran the script; `outcome.success` tells how it went.
    fn on_complete(&self, outcome: ExecutionOutcome);

    /// The script could not be run to completion.
    fn on_failure(&self, error: ExecutionError);
}

/// Host-provided interpreter for assembled action scripts.
///
/// Inject a real implementation (see the `depwalk-exec` crate) or a recording
/// fake for tests.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Accept `script` for execution and return without waiting for it.
    async fn submit(
        &self,
        script: ActionScript,
        callback: Arc<dyn CompletionCallback>,
    ) -> WalkResult<ExecutionHandle>;
}

/// Handle to a submitted script.
///
/// Executors that run on a background task must watch the handle's cancel
/// signal and answer it with [`ExecutionError::Aborted`] through the
/// callback, so every submission ends in exactly one callback.
#[derive(Debug)]
pub struct ExecutionHandle {
    pub execution_id: Uuid,
    pub script_digest: String,
    task: Option<JoinHandle<()>>,
    cancel: Option<Arc<Notify>>,
}

impl ExecutionHandle {
    /// Handle for an execution that runs on a background task. `cancel` is
    /// notified by [`abort`](Self::abort).
    pub fn spawned(
        execution_id: Uuid,
        script_digest: String,
        task: JoinHandle<()>,
        cancel: Arc<Notify>,
    ) -> Self {
        Self {
            execution_id,
            script_digest,
            task: Some(task),
            cancel: Some(cancel),
        }
    }

    /// Handle for an execution the executor already finished (or tracks
    /// elsewhere).
    pub fn detached(execution_id: Uuid, script_digest: String) -> Self {
        Self {
            execution_id,
            script_digest,
            task: None,
            cancel: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the background task to finish. The outcome itself is
    /// delivered to the callback, not returned here.
    pub async fn wait(self) {
        if let Some(task) = self.task {
            if let Err(e) = task.await {
                tracing::error!(execution_id = %self.execution_id, error = %e, "execution task panicked");
            }
        }
    }

    /// Ask the executor to stop the script. The executor reports
    /// [`ExecutionError::Aborted`] to the callback; a request that arrives
    /// after completion is ignored.
    pub fn abort(&self) {
        if let Some(cancel) = &self.cancel {
            tracing::debug!(execution_id = %self.execution_id, "abort requested");
            cancel.notify_one();
        }
    }
}

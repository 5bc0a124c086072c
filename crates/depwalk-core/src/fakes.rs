//! In-memory fakes for the host-facing traits (testing only)
//!
//! Provides `RecordingObserver`, `RecordingExecutor` and `RecordingCallback`
//! that satisfy the trait contracts without spawning anything.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{ExecutionError, WalkResult};
use crate::executor::{CompletionCallback, ExecutionHandle, ExecutionOutcome, ScriptExecutor};
use crate::observer::ProgressObserver;
use crate::script::ActionScript;

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

/// Observer that keeps every progress line.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    messages: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// RecordingCallback
// ---------------------------------------------------------------------------

/// Callback that keeps every outcome and failure it receives.
#[derive(Debug, Default)]
pub struct RecordingCallback {
    completed: Mutex<Vec<ExecutionOutcome>>,
    failed: Mutex<Vec<ExecutionError>>,
}

impl RecordingCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> Vec<ExecutionOutcome> {
        self.completed.lock().unwrap().clone()
    }

    pub fn failed(&self) -> Vec<ExecutionError> {
        self.failed.lock().unwrap().clone()
    }
}

impl CompletionCallback for RecordingCallback {
    fn on_complete(&self, outcome: ExecutionOutcome) {
        self.completed.lock().unwrap().push(outcome);
    }

    fn on_failure(&self, error: ExecutionError) {
        self.failed.lock().unwrap().push(error);
    }
}

// ---------------------------------------------------------------------------
// RecordingExecutor
// ---------------------------------------------------------------------------

/// Executor that stores submitted scripts and reports immediate success.
///
/// Set `fail_with` to report a failure through the callback instead.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    submitted: Mutex<Vec<ActionScript>>,
    fail_with: Option<ExecutionError>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: ExecutionError) -> Self {
        Self {
            submitted: Mutex::default(),
            fail_with: Some(error),
        }
    }

    pub fn submitted(&self) -> Vec<ActionScript> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptExecutor for RecordingExecutor {
    async fn submit(
        &self,
        script: ActionScript,
        callback: Arc<dyn CompletionCallback>,
    ) -> WalkResult<ExecutionHandle> {
        let execution_id = Uuid::new_v4();
        let digest = script.digest();
        let stdout = script.text().to_string();
        self.submitted.lock().unwrap().push(script);

        match &self.fail_with {
            Some(error) => callback.on_failure(error.clone()),
            None => callback.on_complete(ExecutionOutcome {
                execution_id,
                exit_code: 0,
                stdout,
                stderr: String::new(),
                duration_ms: 0,
                success: true,
                started_at: Utc::now(),
            }),
        }
        Ok(ExecutionHandle::detached(execution_id, digest))
    }
}

//! Script execution through a host shell.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use depwalk_core::{
    ActionScript, CompletionCallback, ExecutionError, ExecutionHandle, ExecutionOutcome,
    ScriptExecutor, WalkError, WalkResult,
};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How scripts are handed to the interpreter.
///
/// The script text is passed as the final argument, i.e. the default runs
/// `sh -c "<script>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Interpreter executable.
    pub program: String,

    /// Arguments placed before the script text.
    pub args: Vec<String>,

    /// Timeout in seconds (0 = wait forever).
    pub timeout_secs: u64,

    /// Working directory for the interpreter; inherits the caller's if unset.
    pub working_dir: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "sh".to_string(),
            args: vec!["-c".to_string()],
            timeout_secs: 0,
            working_dir: None,
        }
    }
}

impl ShellConfig {
    /// Custom interpreter invocation.
    pub fn custom(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Executor that runs each submitted script in a fresh interpreter process
/// on the tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    config: ShellConfig,
}

impl ShellExecutor {
    pub fn new(config: ShellConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Run `script` to completion and return its outcome.
    ///
    /// A non-zero exit is an outcome, not an error; errors are reserved for
    /// spawn failures and timeouts.
    pub async fn run(
        config: &ShellConfig,
        execution_id: Uuid,
        script: &str,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        let child = command
            .spawn()
            .map_err(|e| ExecutionError::Spawn(format!("{}: {}", config.program, e)))?;

        let output = if config.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| ExecutionError::Timeout {
                secs: config.timeout_secs,
            })?
        } else {
            child.wait_with_output().await
        }
        .map_err(|e| ExecutionError::Failed(e.to_string()))?;

        Ok(ExecutionOutcome {
            execution_id,
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            success: output.status.success(),
            started_at,
        })
    }
}

#[async_trait]
impl ScriptExecutor for ShellExecutor {
    async fn submit(
        &self,
        script: ActionScript,
        callback: Arc<dyn CompletionCallback>,
    ) -> WalkResult<ExecutionHandle> {
        if self.config.program.trim().is_empty() {
            return Err(WalkError::Submission(
                "shell program must not be empty".to_string(),
            ));
        }

        let execution_id = Uuid::new_v4();
        let digest = script.digest();
        let config = self.config.clone();

        info!(
            execution_id = %execution_id,
            program = %config.program,
            jobs = script.jobs().len(),
            "Submitting action script"
        );

        let cancel = Arc::new(Notify::new());
        let signal = Arc::clone(&cancel);

        let task = tokio::spawn(async move {
            // Dropping the run future drops the child; kill_on_drop kills it.
            let result = tokio::select! {
                result = ShellExecutor::run(&config, execution_id, script.text()) => result,
                _ = signal.notified() => Err(ExecutionError::Aborted),
            };
            match result {
                Ok(outcome) => {
                    info!(
                        execution_id = %execution_id,
                        exit_code = outcome.exit_code,
                        duration_ms = outcome.duration_ms,
                        "Action script finished"
                    );
                    callback.on_complete(outcome);
                }
                Err(ExecutionError::Aborted) => {
                    warn!(execution_id = %execution_id, "Action script aborted");
                    callback.on_failure(ExecutionError::Aborted);
                }
                Err(e) => {
                    error!(execution_id = %execution_id, error = %e, "Action script failed");
                    callback.on_failure(e);
                }
            }
        });

        Ok(ExecutionHandle::spawned(execution_id, digest, task, cancel))
    }
}

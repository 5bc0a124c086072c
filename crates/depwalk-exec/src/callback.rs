//! Completion callbacks for hosts that want to observe or await a script.

use depwalk_core::{CompletionCallback, ExecutionError, ExecutionOutcome};
use tokio::sync::mpsc;

/// Result delivered to a [`ChannelCallback`] receiver.
pub type ExecutionResult = Result<ExecutionOutcome, ExecutionError>;

/// Forwards the execution result into a channel.
///
/// Lets an async host await completion without polling the handle.
#[derive(Debug, Clone)]
pub struct ChannelCallback {
    tx: mpsc::UnboundedSender<ExecutionResult>,
}

impl ChannelCallback {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ExecutionResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, result: ExecutionResult) {
        if self.tx.send(result).is_err() {
            tracing::debug!("execution result dropped: receiver closed");
        }
    }
}

impl CompletionCallback for ChannelCallback {
    fn on_complete(&self, outcome: ExecutionOutcome) {
        self.send(Ok(outcome));
    }

    fn on_failure(&self, error: ExecutionError) {
        self.send(Err(error));
    }
}

/// Logs the result and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCallback;

impl CompletionCallback for LoggingCallback {
    fn on_complete(&self, outcome: ExecutionOutcome) {
        if outcome.passed() {
            tracing::info!(execution_id = %outcome.execution_id, "Dependency walker actions completed");
        } else {
            tracing::warn!(
                execution_id = %outcome.execution_id,
                exit_code = outcome.exit_code,
                "Dependency walker actions failed"
            );
        }
    }

    fn on_failure(&self, error: ExecutionError) {
        tracing::error!(error = %error, "Dependency walker actions could not run");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_channel_callback_forwards_results() {
        let (callback, mut rx) = ChannelCallback::new();
        callback.on_failure(ExecutionError::Aborted);
        callback.on_complete(ExecutionOutcome {
            execution_id: Uuid::new_v4(),
            exit_code: 0,
            stdout: "ok".to_string(),
            stderr: String::new(),
            duration_ms: 1,
            success: true,
            started_at: Utc::now(),
        });

        assert_eq!(rx.recv().await, Some(Err(ExecutionError::Aborted)));
        let outcome = rx.recv().await.unwrap().unwrap();
        assert_eq!(outcome.stdout, "ok");
    }

    #[test]
    fn test_channel_callback_survives_closed_receiver() {
        let (callback, rx) = ChannelCallback::new();
        drop(rx);
        callback.on_failure(ExecutionError::Aborted);
    }
}

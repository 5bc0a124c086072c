//! The `walk` step: plan a dependency walk and submit its action script.
//!
//! A walk resolves the requested job, lists it after all of its transitive
//! upstream jobs, optionally checks their health, renders the job action for
//! each of them and hands the resulting script to a [`ScriptExecutor`].
//! Everything up to submission is synchronous and all-or-nothing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{WalkError, WalkResult};
use crate::executor::{CompletionCallback, ExecutionHandle, ScriptExecutor};
use crate::graph::GraphAccessor;
use crate::health::{HealthGate, HealthReport};
use crate::observer::ProgressObserver;
use crate::script::{ActionScript, ScriptAssembler, ScriptFrame};
use crate::template::ActionTemplate;
use crate::traversal::{OrderedNodes, Traversal};

/// Name under which hosts expose the step.
pub const STEP_NAME: &str = "walk";

/// Configuration of a single walk invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkStep {
    /// Full name of the job to walk from.
    pub job: String,
    /// Action rendered for every job in the walk.
    #[serde(default)]
    pub job_action: ActionTemplate,
    /// Abort when an upstream job's latest build failed.
    #[serde(default)]
    pub fail_on_unstable: bool,
    #[serde(default)]
    pub frame: ScriptFrame,
}

impl WalkStep {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            job_action: ActionTemplate::default(),
            fail_on_unstable: false,
            frame: ScriptFrame::none(),
        }
    }

    pub fn with_job_action(mut self, job_action: impl Into<ActionTemplate>) -> Self {
        self.job_action = job_action.into();
        self
    }

    pub fn with_fail_on_unstable(mut self, fail_on_unstable: bool) -> Self {
        self.fail_on_unstable = fail_on_unstable;
        self
    }

    pub fn with_frame(mut self, frame: ScriptFrame) -> Self {
        self.frame = frame;
        self
    }

    pub fn validate(&self) -> WalkResult<()> {
        if self.job.trim().is_empty() {
            return Err(WalkError::InvalidStep("job name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Everything a walk produces before submission.
#[derive(Debug, Clone)]
pub struct WalkPlan {
    pub nodes: OrderedNodes,
    pub health: HealthReport,
    pub script: ActionScript,
}

/// State of the step after [`WalkExecution::start`].
#[derive(Debug)]
pub enum StepState {
    /// The script was submitted; completion is reported to the callback.
    Pending(ExecutionHandle),
}

impl StepState {
    /// Always `false`: the step finishes when the submitted script does.
    pub fn is_complete(&self) -> bool {
        false
    }

    pub fn handle(&self) -> &ExecutionHandle {
        match self {
            StepState::Pending(handle) => handle,
        }
    }

    pub fn into_handle(self) -> ExecutionHandle {
        match self {
            StepState::Pending(handle) => handle,
        }
    }
}

/// One run of a [`WalkStep`] against a host graph.
pub struct WalkExecution {
    step: WalkStep,
    graph: Arc<dyn GraphAccessor>,
    observer: Arc<dyn ProgressObserver>,
}

impl WalkExecution {
    pub fn new(
        step: WalkStep,
        graph: Arc<dyn GraphAccessor>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            step,
            graph,
            observer,
        }
    }

    pub fn step(&self) -> &WalkStep {
        &self.step
    }

    /// Compute the job order, run the health gate and assemble the script.
    pub fn plan(&self) -> WalkResult<WalkPlan> {
        self.step.validate()?;

        let nodes = Traversal::new(self.graph.as_ref()).traverse(&self.step.job)?;
        let health = HealthGate::check(
            &nodes,
            self.step.fail_on_unstable,
            self.observer.as_ref(),
        )?;
        let script = ScriptAssembler::assemble_framed(
            &nodes,
            &self.step.job_action,
            &self.step.frame,
            self.observer.as_ref(),
        );

        Ok(WalkPlan {
            nodes,
            health,
            script,
        })
    }

    /// Plan the walk and submit its script to `executor`.
    ///
    /// Returns [`StepState::Pending`] as soon as the executor has accepted the
    /// script. Planning failures are returned before anything is submitted.
    pub async fn start(
        &self,
        executor: &dyn ScriptExecutor,
        callback: Arc<dyn CompletionCallback>,
    ) -> WalkResult<StepState> {
        let plan = {
            // The span guard is not Send; keep it out of the await below.
            let _span = crate::obs::WalkSpan::enter(&self.step.job);
            tracing::info!(job = %self.step.job, "Start walking from root job: {}", self.step.job);

            let plan = self.plan().inspect_err(|e| {
                crate::obs::emit_walk_rejected(&self.step.job, e);
            })?;

            self.observer.on_message("Generated script:\n");
            self.observer.on_message(plan.script.text());
            crate::obs::emit_script_generated(
                &self.step.job,
                plan.nodes.len(),
                &plan.script.short_digest(),
            );
            plan
        };

        let handle = executor.submit(plan.script, callback).await?;
        crate::obs::emit_script_submitted(&self.step.job, &handle.execution_id.to_string());
        Ok(StepState::Pending(handle))
    }

    /// Stop hook. Does nothing; a submitted script is cancelled through
    /// [`ExecutionHandle::abort`].
    pub fn stop(&self, cause: &dyn std::fmt::Display) {
        tracing::debug!(job = %self.step.job, cause = %cause, "stop requested; nothing to cancel");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{RecordingCallback, RecordingExecutor, RecordingObserver};
    use crate::graph::InMemoryGraph;
    use crate::model::{BuildHistory, JobNode};

    fn graph() -> Arc<InMemoryGraph> {
        let mut g = InMemoryGraph::new();
        g.add_node(JobNode::new("child_a").with_history(BuildHistory::new(Some(3), Some(5))));
        g.add_node(JobNode::new("parent_a").with_history(BuildHistory::new(Some(2), None)));
        g.add_dependency("parent_a", "child_a").unwrap();
        Arc::new(g)
    }

    #[test]
    fn test_step_defaults() {
        let step: WalkStep = serde_json::from_str(r#"{ "job": "grand" }"#).unwrap();
        assert_eq!(step, WalkStep::new("grand"));
        assert_eq!(step.job_action.as_str(), "build JOB_NAME");
        assert!(!step.fail_on_unstable);
    }

    #[test]
    fn test_empty_job_is_invalid() {
        let exec = WalkExecution::new(
            WalkStep::new("  "),
            graph(),
            Arc::new(RecordingObserver::new()),
        );
        assert!(matches!(exec.plan(), Err(WalkError::InvalidStep(_))));
    }

    #[test]
    fn test_plan_without_enforcement() {
        let exec = WalkExecution::new(
            WalkStep::new("parent_a").with_job_action("echo JOB_NAME"),
            graph(),
            Arc::new(RecordingObserver::new()),
        );
        let plan = exec.plan().unwrap();
        assert_eq!(plan.nodes.names(), vec!["child_a", "parent_a"]);
        assert_eq!(plan.script.text(), "echo 'child_a'\necho 'parent_a'\n");
        assert_eq!(plan.health.offending(), vec!["child_a"]);
    }

    #[tokio::test]
    async fn test_unhealthy_walk_submits_nothing() {
        let executor = RecordingExecutor::new();
        let exec = WalkExecution::new(
            WalkStep::new("parent_a").with_fail_on_unstable(true),
            graph(),
            Arc::new(RecordingObserver::new()),
        );
        let result = exec.start(&executor, Arc::new(RecordingCallback::new())).await;
        assert!(matches!(result, Err(WalkError::UnhealthyDependency { .. })));
        assert!(executor.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_start_returns_pending() {
        let executor = RecordingExecutor::new();
        let observer = Arc::new(RecordingObserver::new());
        let exec = WalkExecution::new(WalkStep::new("parent_a"), graph(), observer.clone());
        let callback = Arc::new(RecordingCallback::new());

        let state = exec.start(&executor, callback.clone()).await.unwrap();
        assert!(!state.is_complete());
        assert_eq!(executor.submitted().len(), 1);
        assert_eq!(
            state.handle().script_digest,
            executor.submitted()[0].digest()
        );
        assert!(observer
            .messages()
            .iter()
            .any(|m| m == "build 'child_a'\nbuild 'parent_a'\n"));
        assert_eq!(callback.completed().len(), 1);
    }

    #[test]
    fn test_stop_is_a_no_op() {
        let exec = WalkExecution::new(
            WalkStep::new("parent_a"),
            graph(),
            Arc::new(RecordingObserver::new()),
        );
        exec.stop(&"user abort");
        assert!(exec.plan().is_ok());
    }
}

//! depwalk Core Library
//!
//! Walks a build job and all of its upstream jobs in dependency order and
//! turns them into a single action script:
//! - [`traversal::Traversal`] - deduplicated post-order walk over a [`GraphAccessor`]
//! - [`health::HealthGate`] - optional check that no upstream job recently failed
//! - [`template::render`] - per-job placeholder substitution
//! - [`script::ScriptAssembler`] - one rendered line per job
//! - [`walker::WalkExecution`] - the `walk` step tying it together and
//!   submitting to a [`ScriptExecutor`]
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use depwalk_core::{InMemoryGraph, TracingObserver, WalkExecution, WalkStep};
//!
//! let execution = WalkExecution::new(
//!     WalkStep::new("grand").with_job_action("build JOB_NAME"),
//!     Arc::new(graph),
//!     Arc::new(TracingObserver),
//! );
//! let plan = execution.plan()?;
//! println!("{}", plan.script);
//! ```

pub mod error;
pub mod executor;
pub mod fakes;
pub mod graph;
pub mod health;
pub mod model;
pub mod obs;
pub mod observer;
pub mod script;
pub mod telemetry;
pub mod template;
pub mod traversal;
pub mod walker;

pub use error::{ExecutionError, WalkError, WalkResult};
pub use executor::{CompletionCallback, ExecutionHandle, ExecutionOutcome, ScriptExecutor};
pub use graph::{GraphAccessor, GraphDocument, InMemoryGraph, JobEntry};
pub use health::{HealthEntry, HealthGate, HealthReport, NodeHealth};
pub use model::{BuildHistory, JobNode, MavenConfig, ScmConfig};
pub use obs::WalkSpan;
pub use observer::{NullObserver, ProgressObserver, TracingObserver};
pub use script::{ActionScript, ScriptAssembler, ScriptFrame};
pub use telemetry::init_tracing;
pub use template::{render, ActionTemplate, Token, DEFAULT_ACTION};
pub use traversal::{OrderedNodes, Traversal};
pub use walker::{StepState, WalkExecution, WalkPlan, WalkStep, STEP_NAME};

/// depwalk version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

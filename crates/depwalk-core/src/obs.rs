//! Structured observability hooks for walk lifecycle events.
//!
//! This module provides:
//! - Walk-scoped tracing spans via `WalkSpan` RAII guard
//! - Emission functions for key lifecycle events: health check, script
//!   generation, submission and rejection
//!
//! Events are emitted at `info!` level (configurable via `RUST_LOG`).

use tracing::info;

/// RAII guard that enters a walk-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = WalkSpan::enter("grand");
/// // every event below carries root_job = "grand"
/// ```
pub struct WalkSpan {
    _span: tracing::span::EnteredSpan,
}

impl WalkSpan {
    pub fn enter(root_job: &str) -> Self {
        let span = tracing::info_span!("depwalk.walk", root_job = %root_job);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: health gate evaluated over `jobs` jobs.
pub fn emit_health_checked(jobs: usize, offending: usize, enforced: bool) {
    info!(
        event = "health.checked",
        jobs = jobs,
        offending = offending,
        enforced = enforced,
    );
}

/// Emit event: action script assembled.
pub fn emit_script_generated(root_job: &str, jobs: usize, digest: &str) {
    info!(event = "script.generated", root_job = %root_job, jobs = jobs, digest = %digest);
}

/// Emit event: script accepted by the executor.
pub fn emit_script_submitted(root_job: &str, execution_id: &str) {
    info!(event = "script.submitted", root_job = %root_job, execution_id = %execution_id);
}

/// Emit event: walk aborted before submission (warning level).
pub fn emit_walk_rejected(root_job: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "walk.rejected", root_job = %root_job, error = %error);
}

//! depwalk Exec - running generated action scripts
//!
//! Provides a [`ScriptExecutor`](depwalk_core::ScriptExecutor) that:
//! - Runs the assembled script through a host shell (`sh -c` by default)
//! - Enforces an optional timeout
//! - Reports the outcome through the walk's completion callback

pub mod callback;
pub mod shell;

// Re-export key types
pub use callback::{ChannelCallback, ExecutionResult, LoggingCallback};
pub use shell::{ShellConfig, ShellExecutor};

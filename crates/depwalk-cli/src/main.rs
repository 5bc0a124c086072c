//! depwalk - dependency walker CLI
//!
//! Reads a build graph from a JSON or TOML file and walks a job together
//! with everything it depends on.
//!
//! ## Commands
//!
//! - `order`: print the jobs in dependency order
//! - `health`: print the build health of every job in the walk
//! - `walk`: render the action script and optionally run it

mod graph_file;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use depwalk_core::{
    HealthReport, NodeHealth, ProgressObserver, ScriptFrame, Traversal, WalkExecution,
    WalkStep, DEFAULT_ACTION,
};
use depwalk_exec::{ChannelCallback, ShellConfig, ShellExecutor};

#[derive(Parser)]
#[command(name = "depwalk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Walk a build job and its upstream jobs in dependency order", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Dependency graph file (.json or .toml)
    #[arg(long, global = true, env = "DEPWALK_GRAPH")]
    graph: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the jobs reachable from JOB, dependencies first
    Order {
        /// Root job
        job: String,
    },

    /// Show the build health of every job in the walk
    ///
    /// Exits non-zero if any job recently failed.
    Health {
        /// Root job
        job: String,
    },

    /// Generate the action script for JOB and optionally run it
    Walk {
        /// Root job
        job: String,

        /// Action template applied to every job
        #[arg(short, long, default_value = DEFAULT_ACTION)]
        action: String,

        /// Refuse to walk if any job recently failed
        #[arg(long)]
        fail_on_unstable: bool,

        /// Wrap the script in a `node { ... }` block
        #[arg(long)]
        node_block: bool,

        /// Run the script through the host shell
        #[arg(long)]
        execute: bool,

        /// Script timeout in seconds (0 = none)
        #[arg(long, default_value = "0")]
        timeout: u64,
    },
}

/// Prints walk progress on stdout.
struct ConsoleObserver;

impl ProgressObserver for ConsoleObserver {
    fn on_message(&self, message: &str) {
        println!("{}", message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    depwalk_core::init_tracing(cli.json, level);

    let graph_path = cli
        .graph
        .as_deref()
        .context("no graph file given (use --graph or DEPWALK_GRAPH)")?;

    match cli.command {
        Commands::Order { job } => cmd_order(graph_path, &job),
        Commands::Health { job } => cmd_health(graph_path, &job),
        Commands::Walk {
            job,
            action,
            fail_on_unstable,
            node_block,
            execute,
            timeout,
        } => {
            let frame = if node_block {
                ScriptFrame::node_block()
            } else {
                ScriptFrame::none()
            };
            let step = WalkStep::new(job)
                .with_job_action(action)
                .with_fail_on_unstable(fail_on_unstable)
                .with_frame(frame);
            if execute {
                cmd_walk_execute(graph_path, step, timeout).await
            } else {
                cmd_walk_plan(graph_path, step)
            }
        }
    }
}

fn cmd_order(graph_path: &Path, job: &str) -> Result<()> {
    let graph = graph_file::load_graph(graph_path)?;
    let nodes = Traversal::new(&graph)
        .traverse(job)
        .with_context(|| format!("failed to walk from {}", job))?;

    for (index, node) in nodes.iter().enumerate() {
        println!("{:>3}. {}", index + 1, node.name);
    }
    Ok(())
}

fn cmd_health(graph_path: &Path, job: &str) -> Result<()> {
    let graph = graph_file::load_graph(graph_path)?;
    let nodes = Traversal::new(&graph)
        .traverse(job)
        .with_context(|| format!("failed to walk from {}", job))?;
    let report = HealthReport::inspect(&nodes);

    for entry in &report.entries {
        let (mark, label) = match entry.health {
            NodeHealth::Healthy => ("✓", "healthy"),
            NodeHealth::NeverBuilt => ("?", "never built"),
            NodeHealth::RecentlyFailed => ("✗", "recently failed"),
        };
        println!("  {} {} ({})", mark, entry.job, label);
    }

    println!();
    if report.is_healthy() {
        println!("✓ All {} jobs are buildable", report.entries.len());
        Ok(())
    } else {
        bail!("recently failed: {}", report.offending().join(", "))
    }
}

fn cmd_walk_plan(graph_path: &Path, step: WalkStep) -> Result<()> {
    let graph = graph_file::load_graph(graph_path)?;
    let execution = WalkExecution::new(step, Arc::new(graph), Arc::new(ConsoleObserver));
    let plan = execution.plan().context("failed to plan walk")?;

    println!("Generated script:");
    println!("{}", plan.script);
    println!();
    println!("Jobs: {}", plan.nodes.len());
    println!("Digest: {}", plan.script.short_digest());
    Ok(())
}

async fn cmd_walk_execute(graph_path: &Path, step: WalkStep, timeout: u64) -> Result<()> {
    let graph = graph_file::load_graph(graph_path)?;
    let root = step.job.clone();
    let execution = WalkExecution::new(step, Arc::new(graph), Arc::new(ConsoleObserver));
    let executor = ShellExecutor::new(ShellConfig::default().with_timeout(timeout));
    let (callback, mut results) = ChannelCallback::new();

    let state = execution
        .start(&executor, Arc::new(callback))
        .await
        .with_context(|| format!("failed to start walk from {}", root))?;
    println!("Execution ID: {}", state.handle().execution_id);

    let result = results
        .recv()
        .await
        .context("executor finished without reporting a result")?;
    let outcome = result.context("action script did not run")?;

    if !outcome.stdout.is_empty() {
        print!("{}", outcome.stdout);
    }
    if !outcome.stderr.is_empty() {
        eprint!("{}", outcome.stderr);
    }
    println!(
        "Status: {}",
        if outcome.passed() { "✓ PASSED" } else { "✗ FAILED" }
    );
    println!("Duration: {}ms", outcome.duration_ms);

    if outcome.passed() {
        Ok(())
    } else {
        bail!("action script exited with code {}", outcome.exit_code)
    }
}

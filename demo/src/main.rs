//! Tollgate Operations Desk: Demo CLI
//!
//! Runs one or all of the three operations-desk scenarios, or classifies tool
//! names against a policy file. Each scenario wires the real Tollgate
//! components (policy, gate, conversation, snapshot codec, resume coordinator,
//! audit chain) to a scripted runtime and a mock server fleet.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- policy-walkthrough
//!   cargo run -p demo -- batch-decision
//!   cargo run -p demo -- pause-again
//!   cargo run -p demo -- classify --policy crates/tollgate-ref-ops/policies/ops.toml server_restart logs_get

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tollgate_contracts::error::GateResult;
use tollgate_core::traits::ApprovalClassifier;
use tollgate_policy::ApprovalPolicy;
use tollgate_ref_ops::scenarios::{batch_decision, pause_again, policy_walkthrough};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Tollgate: human approval for model-proposed tool calls.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Tollgate operations-desk reference demo",
    long_about = "Runs Tollgate demo scenarios showing approval policy, blocked\n\
                  conversations, batched decisions, suspend/resume and audit chain integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: policy classification and refused proposals.
    PolicyWalkthrough,
    /// Scenario 2: one resume settles a batch of approvals and a rejection.
    BatchDecision,
    /// Scenario 3: a multi-batch run that suspends more than once.
    PauseAgain,
    /// Classify tool names against an approval policy file.
    Classify {
        /// Path to an approval policy TOML file.
        #[arg(long)]
        policy: PathBuf,
        /// Treat every tool as flagged `requires_approval` by its definition.
        #[arg(long)]
        flagged: bool,
        /// Tool names to classify.
        #[arg(required = true)]
        tools: Vec<String>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::RunAll => {
            print_banner();
            run_all()
        }
        Command::PolicyWalkthrough => {
            print_banner();
            policy_walkthrough::run_scenario()
        }
        Command::BatchDecision => {
            print_banner();
            batch_decision::run_scenario()
        }
        Command::PauseAgain => {
            print_banner();
            pause_again::run_scenario()
        }
        Command::Classify { policy, flagged, tools } => classify(&policy, flagged, &tools),
    };

    match result {
        Ok(()) => {
            println!("Done.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

fn run_all() -> GateResult<()> {
    policy_walkthrough::run_scenario()?;
    batch_decision::run_scenario()?;
    pause_again::run_scenario()?;
    Ok(())
}

fn classify(path: &std::path::Path, flagged: bool, tools: &[String]) -> GateResult<()> {
    let policy = ApprovalPolicy::from_file(path)?;
    info!(policy = %path.display(), tools = tools.len(), "classifying");

    for tool in tools {
        let class = policy.classify(tool, flagged);
        let label = if class.excluded {
            "excluded"
        } else if class.requires_approval {
            "needs approval"
        } else {
            "auto-approved"
        };
        println!("{:<28} {}", tool, label);
    }
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Tollgate: Tool Approval Engine");
    println!("Operations Desk Reference Demo");
    println!("===============================");
    println!();
    println!("Per proposed tool call:");
    println!("  [1] Policy: excluded / auto-approved / needs approval");
    println!("  [2] Input checked against the tool's JSON Schema and custom checks");
    println!("  [3] Gated calls suspend the run; the snapshot is parked per session");
    println!("  [4] One request carries every decision; one resume applies them all");
    println!("  [5] Every lifecycle event is appended to a SHA-256 audit chain");
    println!();
}

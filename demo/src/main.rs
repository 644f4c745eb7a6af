//! warden — Policy Decision Engine Demo
//!
//! Runs one or all of the three demo scenarios. Each scenario wires real
//! warden components (default evaluator, tag enricher, audit sink) over a
//! TOML policy snapshot.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- resource-access
//!   cargo run -p demo -- tag-override
//!   cargo run -p demo -- audit-trail

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod scenarios;

// ── CLI definition ────────────────────────────────────────────────────────────

/// warden — resource-level authorization demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "warden policy decision engine demo",
    long_about = "Runs warden demo scenarios showing two-stage policy evaluation,\n\
                  deny-overrides combination across tags, and audit sinks.\n\n\
                  Scenarios:\n\
                  1. Resource Access — resource policies decide untagged requests\n\
                  2. Tag Override    — tag verdicts win; one deny beats any allows\n\
                  3. Audit Trail     — batch evaluation into an in-memory audit sink"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: resource policies decide untagged requests.
    ResourceAccess,
    /// Scenario 2: tag policies override resource policies.
    TagOverride,
    /// Scenario 3: batch evaluation with an audit sink.
    AuditTrail,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging. Set RUST_LOG=debug to watch the
    // engine's per-evaluator decisions.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::ResourceAccess => scenarios::run_resource_access(),
        Command::TagOverride => scenarios::run_tag_override(),
        Command::AuditTrail => scenarios::run_audit_trail(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_all() -> warden_contracts::error::WardenResult<()> {
    scenarios::run_resource_access()?;
    scenarios::run_tag_override()?;
    scenarios::run_audit_trail()?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("warden — Policy Decision Engine");
    println!("===============================");
    println!();
    println!("Pipeline per request:");
    println!("  [1] Context enrichers attach derived facts (resource tags)");
    println!("  [2] Tag stage: per-tag evaluation, deny overrides allow across tags");
    println!("  [3] Resource stage: evaluators in order until access and audit determined");
    println!("  [4] Audit sink processes the result (never affects the decision)");
    println!();
}

//! CLI argument parsing for the run-mode lattice tools.
//!
//! The CLI only loads inputs and prints results; resolution and
//! consolidation live in the library so other build tooling can call them.
use crate::runmode::ServiceRole;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "rml",
    version,
    about = "Resolve run-mode aggregates and consolidate analyser messages",
    after_help = "Examples:\n  rml check author.dev dev.author\n  rml resolve --mapping runmodes.properties --role author\n  rml consolidate --messages messages.json --json\n  rml analyse --mapping runmodes.properties --findings findings.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Check(CheckArgs),
    Resolve(ResolveArgs),
    Consolidate(ConsolidateArgs),
    Analyse(AnalyseArgs),
}

/// Scope options shared by commands that depend on the role set.
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Optional JSON config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Restrict analysis to a role (repeatable; overrides the config)
    #[arg(long = "role", value_name = "ROLE", value_parser = parse_role)]
    pub roles: Vec<ServiceRole>,
}

#[derive(Parser, Debug)]
#[command(about = "Check run-mode names and suggest corrections")]
pub struct CheckArgs {
    /// Run-mode names to check
    #[arg(required = true, value_name = "RUN_MODE")]
    pub run_modes: Vec<String>,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Resolve the minimal set of aggregates for a run-mode mapping")]
pub struct ResolveArgs {
    /// Properties-style file mapping run modes to item identifiers
    #[arg(long, value_name = "PATH")]
    pub mapping: PathBuf,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Consolidate per-tier errors and warnings")]
pub struct ConsolidateArgs {
    /// JSON file with `errors` and `warnings` tier maps
    #[arg(long, value_name = "PATH")]
    pub messages: PathBuf,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Resolve aggregates, replay recorded findings, and consolidate them")]
pub struct AnalyseArgs {
    /// Properties-style file mapping run modes to item identifiers
    #[arg(long, value_name = "PATH")]
    pub mapping: PathBuf,

    /// JSON file of analyser findings keyed by aggregate
    #[arg(long, value_name = "PATH")]
    pub findings: PathBuf,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

fn parse_role(value: &str) -> Result<ServiceRole, String> {
    value.trim().to_ascii_lowercase().parse()
}

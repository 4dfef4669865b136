use anyhow::Result;
use clap::Parser;
use runmode_lattice::aggregate::{NoticeKind, Resolution, Resolver};
use runmode_lattice::analyse::{run_analysis, RecordedAnalyser};
use runmode_lattice::cli::{
    AnalyseArgs, CheckArgs, Command, ConsolidateArgs, ResolveArgs, RootArgs, ScopeArgs,
};
use runmode_lattice::config::{apply_role_overrides, load_config_or_default, LatticeConfig};
use runmode_lattice::consolidate::Consolidator;
use runmode_lattice::mapping::load_mapping;
use runmode_lattice::report::{
    load_messages, write_consolidated_text, write_json, write_resolution_text, ConsolidatedReport,
};
use runmode_lattice::runmode::{RunModeCheck, RunModeValidator};
use serde::Serialize;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Check(args) => cmd_check(args),
        Command::Resolve(args) => cmd_resolve(args),
        Command::Consolidate(args) => cmd_consolidate(args),
        Command::Analyse(args) => cmd_analyse(args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_scope(scope: &ScopeArgs) -> Result<LatticeConfig> {
    let mut config = load_config_or_default(scope.config.as_deref())?;
    apply_role_overrides(&mut config, &scope.roles);
    tracing::debug!(roles = ?config.roles, "loaded lattice scope");
    Ok(config)
}

fn cmd_check(args: CheckArgs) -> Result<ExitCode> {
    let config = load_scope(&args.scope)?;
    let validator = RunModeValidator::new(&config.roles);
    let mut stdout = std::io::stdout().lock();
    let mut all_known = true;
    for run_mode in &args.run_modes {
        match validator.classify(run_mode) {
            RunModeCheck::Known => writeln!(stdout, "{run_mode}: known")?,
            RunModeCheck::Misordered { corrected } => {
                all_known = false;
                writeln!(stdout, "{run_mode}: misordered, use {corrected}")?;
            }
            RunModeCheck::Unknown => {
                all_known = false;
                writeln!(stdout, "{run_mode}: unknown")?;
            }
        }
    }
    Ok(exit_code(all_known))
}

fn cmd_resolve(args: ResolveArgs) -> Result<ExitCode> {
    let config = load_scope(&args.scope)?;
    let resolver = Resolver::new(&config.roles)?;
    let resolution = resolve_mapping(&args.mapping, &resolver)?;
    let mut stdout = std::io::stdout().lock();
    if args.json {
        write_json(&mut stdout, &resolution)?;
    } else {
        write_resolution_text(&mut stdout, &resolution)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_consolidate(args: ConsolidateArgs) -> Result<ExitCode> {
    let config = load_scope(&args.scope)?;
    let messages = load_messages(&args.messages)?;
    let report = ConsolidatedReport::build(&Consolidator::new(&config.roles), messages);
    let mut stdout = std::io::stdout().lock();
    if args.json {
        write_json(&mut stdout, &report)?;
    } else {
        write_consolidated_text(&mut stdout, &report)?;
    }
    Ok(exit_code(passes(&report, &config)))
}

#[derive(Serialize)]
struct AnalyseOutput<'a> {
    resolution: &'a Resolution,
    report: &'a ConsolidatedReport,
}

fn cmd_analyse(args: AnalyseArgs) -> Result<ExitCode> {
    let config = load_scope(&args.scope)?;
    let resolver = Resolver::new(&config.roles)?;
    let resolution = resolve_mapping(&args.mapping, &resolver)?;
    let analyser = RecordedAnalyser::load(&args.findings)?;
    let analysis = run_analysis(
        &resolution,
        &analyser,
        &Consolidator::for_resolver(&resolver),
    )?;
    let report = ConsolidatedReport::from(&analysis);
    let mut stdout = std::io::stdout().lock();
    if args.json {
        let output = AnalyseOutput {
            resolution: &resolution,
            report: &report,
        };
        write_json(&mut stdout, &output)?;
    } else {
        write_consolidated_text(&mut stdout, &report)?;
    }
    Ok(exit_code(passes(&report, &config)))
}

fn resolve_mapping(path: &std::path::Path, resolver: &Resolver) -> Result<Resolution> {
    let items = load_mapping(path)?;
    let resolution = resolver.resolve(&items)?;
    for notice in &resolution.notices {
        match notice.kind {
            NoticeKind::Unknown => eprintln!("warning: {}", notice.message()),
            NoticeKind::Unused => tracing::info!("{}", notice.message()),
        }
    }
    Ok(resolution)
}

fn passes(report: &ConsolidatedReport, config: &LatticeConfig) -> bool {
    report.errors.is_empty() && (!config.fail_on_warnings || report.warnings.is_empty())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

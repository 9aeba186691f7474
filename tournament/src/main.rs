//! Resumable LLM dilemma tournament CLI.
//!
//! `run` plays every unique roster pair exactly once, checkpointing each
//! completed match so an interrupted run resumes where it left off.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use tournament::audit::AuditLog;
use tournament::checkpoint::CheckpointStore;
use tournament::config::{TournamentConfig, load_config, write_config};
use tournament::exit_codes;
use tournament::logging;
use tournament::oracle::{CommandOracle, FatalOracleError};
use tournament::report::standings;
use tournament::roster::builtin_roster;
use tournament::run::run_tournament;

#[derive(Parser)]
#[command(
    name = "tournament",
    version,
    about = "Resumable round-robin dilemma tournament with an LLM player"
)]
struct Cli {
    /// Path to the tournament config file.
    #[arg(long, default_value = "tournament.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Run the tournament, resuming from the checkpoint if one exists.
    Run,
    /// Print standings from the checkpoint ledger.
    Report,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        let code = if err.chain().any(|cause| cause.is::<FatalOracleError>()) {
            exit_codes::FATAL_ORACLE
        } else {
            exit_codes::INVALID
        };
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Run => cmd_run(&cli.config),
        Command::Report => cmd_report(&cli.config),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    write_config(config_path, &TournamentConfig::default())
        .with_context(|| format!("write {}", config_path.display()))?;
    println!("init: wrote {}", config_path.display());
    Ok(())
}

fn cmd_run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let oracle = Arc::new(CommandOracle::new(
        config.model.clone(),
        config.oracle_command.clone(),
        Duration::from_secs(config.call_timeout_secs),
        config.oracle_output_limit_bytes,
    ));
    let audit = AuditLog::new(&config.audit_log_path);
    let roster = builtin_roster(oracle, audit, &config)?;

    let outcome = run_tournament(&roster, &config)?;
    println!(
        "run: played={} skipped={} total={} checkpoint={}",
        outcome.played,
        outcome.skipped,
        outcome.total_pairs,
        config.checkpoint_path.display()
    );
    Ok(())
}

fn cmd_report(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let checkpoint = CheckpointStore::load(&config.checkpoint_path)?;
    let rows = standings(checkpoint.records());
    if rows.is_empty() {
        println!("report: no completed matches yet");
        return Ok(());
    }
    println!("report: matches={}", checkpoint.records().len());
    for standing in rows {
        println!(
            "report: {} score_per_turn={:.3} matches={}",
            standing.name, standing.mean_score_per_turn, standing.matches
        );
    }
    Ok(())
}

//! Tournament configuration (TOML).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Tournament configuration.
///
/// This file is intended to be edited by humans and must remain stable.
/// Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TournamentConfig {
    /// Model identifier recorded in audit rows and exported to the oracle
    /// command as `ORACLE_MODEL`.
    pub model: String,

    /// Command invoked once per oracle call; receives the prompt on stdin
    /// and prints the reply JSON on stdout.
    pub oracle_command: Vec<String>,

    /// Turns per match.
    pub turns: u32,

    /// Fixed seed for the Random strategy. Unset means seeded from
    /// entropy, which makes runs non-reproducible.
    pub seed: Option<u64>,

    /// Override for the built-in move prompt template.
    pub prompt_template: Option<PathBuf>,

    /// Completed-match ledger.
    pub checkpoint_path: PathBuf,

    /// Oracle decision audit log.
    pub audit_log_path: PathBuf,

    /// Transient failures retried at most this many times per decision.
    pub max_retries: u32,

    /// Per-call wall-clock budget for the oracle command, in seconds.
    pub call_timeout_secs: u64,

    /// First backoff delay in milliseconds; doubles per retry.
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds.
    pub backoff_cap_ms: u64,

    /// Truncate oracle stdout/stderr beyond this many bytes.
    pub oracle_output_limit_bytes: usize,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            model: "gemini/gemini-2.5-flash-lite".to_string(),
            oracle_command: vec!["llm".to_string()],
            turns: 50,
            seed: None,
            prompt_template: None,
            checkpoint_path: PathBuf::from("tournament_results.jsonl"),
            audit_log_path: PathBuf::from("oracle_audit.jsonl"),
            max_retries: 5,
            call_timeout_secs: 30,
            backoff_base_ms: 500,
            backoff_cap_ms: 8_000,
            oracle_output_limit_bytes: 100_000,
        }
    }
}

impl TournamentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.oracle_command.is_empty() || self.oracle_command[0].trim().is_empty() {
            return Err(anyhow!("oracle_command must be a non-empty array"));
        }
        if self.turns == 0 {
            return Err(anyhow!("turns must be > 0"));
        }
        if self.call_timeout_secs == 0 {
            return Err(anyhow!("call_timeout_secs must be > 0"));
        }
        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err(anyhow!("backoff_cap_ms must be >= backoff_base_ms"));
        }
        if self.oracle_output_limit_bytes == 0 {
            return Err(anyhow!("oracle_output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `TournamentConfig::default()`.
pub fn load_config(path: &Path) -> Result<TournamentConfig> {
    if !path.exists() {
        let cfg = TournamentConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: TournamentConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &TournamentConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

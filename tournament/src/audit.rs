//! Append-only audit log of oracle decision attempts.
//!
//! # Separation of Concerns
//!
//! - **Tracing (`logging`)**: dev diagnostics via `RUST_LOG`, stderr, not
//!   persisted.
//! - **Audit log (this module)**: product output, one JSON line per oracle
//!   attempt, always written regardless of `RUST_LOG`, flushed per record.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dilemma::history::TurnHistory;

/// One decision attempt: successful, degraded, or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// RFC 3339 timestamp of the attempt.
    pub timestamp: String,
    pub opponent_name: String,
    /// Snapshot of the match history visible to the policy at the time.
    pub match_history: TurnHistory,
    pub model_name: String,
    /// Move that resulted from the attempt; empty when none was produced.
    pub llm_move: String,
    /// Empty string on success.
    pub error: String,
    /// Raw oracle response text, when any was received.
    pub additional_info: String,
}

/// Handle to the append-only audit file.
///
/// Cheap to clone; every adapter in a run shares the same file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and flush it.
    pub fn append(&self, record: &AuditRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let mut line = serde_json::to_string(record).context("serialize audit record")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open audit log {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append audit log {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("flush audit log {}", self.path.display()))?;
        Ok(())
    }

    /// Read every record back, oldest first. Missing file yields an empty
    /// list. Used by tests and post-run analysis.
    pub fn read_all(&self) -> Result<Vec<AuditRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("read audit log {}", self.path.display()))?;
        let mut records = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: AuditRecord = serde_json::from_str(line).with_context(|| {
                format!("parse audit log {} line {}", self.path.display(), index + 1)
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dilemma::action::Action;

    fn sample(error: &str) -> AuditRecord {
        let mut history = TurnHistory::new();
        history.push(Action::Cooperate, Action::Defect);
        AuditRecord {
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            opponent_name: "Defector".to_string(),
            match_history: history,
            model_name: "test-model".to_string(),
            llm_move: "C".to_string(),
            error: error.to_string(),
            additional_info: "{\"move\": \"C\"}".to_string(),
        }
    }

    #[test]
    fn appends_accumulate_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = AuditLog::new(&temp.path().join("audit.jsonl"));

        log.append(&sample("")).expect("append");
        log.append(&sample("transient")).expect("append");

        let records = log.read_all().expect("read");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].error, "");
        assert_eq!(records[1].error, "transient");
    }

    #[test]
    fn missing_file_reads_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = AuditLog::new(&temp.path().join("audit.jsonl"));
        assert!(log.read_all().expect("read").is_empty());
    }

    #[test]
    fn rows_round_trip_history_snapshots() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = AuditLog::new(&temp.path().join("audit.jsonl"));
        let record = sample("");
        log.append(&record).expect("append");

        let records = log.read_all().expect("read");
        assert_eq!(records[0], record);
        assert_eq!(records[0].match_history.len(), 1);
    }
}

//! Durable ledger of completed matches.
//!
//! One JSON line per completed pair, in insertion order. Appends rewrite
//! the whole table to a temp file and rename it into place, so a crash at
//! any point leaves either the old or the new complete ledger on disk,
//! never a torn row and never a duplicate on reload.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One completed match, written exactly once per oriented pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub player1: String,
    pub player2: String,
    pub player1_score_per_turn: f64,
    pub player2_score_per_turn: f64,
}

/// In-memory view of the ledger plus its on-disk location.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    records: Vec<MatchRecord>,
}

impl CheckpointStore {
    /// Load the ledger. A missing file is an empty table, not an error; an
    /// unparseable line is an error, since silently dropping rows would
    /// re-run matches that already completed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no checkpoint file, starting empty");
            return Ok(Self {
                path: path.to_path_buf(),
                records: Vec::new(),
            });
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read checkpoint {}", path.display()))?;
        let mut records = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: MatchRecord = serde_json::from_str(line).with_context(|| {
                format!("parse checkpoint {} line {}", path.display(), index + 1)
            })?;
            records.push(record);
        }
        debug!(path = %path.display(), rows = records.len(), "checkpoint loaded");
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Exact-orientation membership: `(a, b)` recorded does not make
    /// `(b, a)` recorded.
    pub fn contains(&self, player1: &str, player2: &str) -> bool {
        self.records
            .iter()
            .any(|record| record.player1 == player1 && record.player2 == player2)
    }

    /// Rows in insertion order.
    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    /// Durably append one record.
    ///
    /// Once this returns, [`CheckpointStore::contains`] is true for the
    /// pair both in memory and after a reload from disk. The in-memory
    /// table is updated only after the rename lands, so a failed write
    /// leaves both views unchanged.
    pub fn append(&mut self, record: MatchRecord) -> Result<()> {
        if self.contains(&record.player1, &record.player2) {
            return Err(anyhow!(
                "checkpoint already has a record for {} vs {}",
                record.player1,
                record.player2
            ));
        }

        let mut buf = String::new();
        for existing in &self.records {
            buf.push_str(&serde_json::to_string(existing).context("serialize checkpoint row")?);
            buf.push('\n');
        }
        buf.push_str(&serde_json::to_string(&record).context("serialize checkpoint row")?);
        buf.push('\n');
        write_atomic(&self.path, &buf)?;

        debug!(player1 = %record.player1, player2 = %record.player2, "checkpoint appended");
        self.records.push(record);
        Ok(())
    }
}

/// Atomic whole-file write (temp file + rename).
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("jsonl.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp checkpoint {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace checkpoint {}", path.display()))?;
    Ok(())
}

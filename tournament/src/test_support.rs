//! Test-only doubles and fixtures for the oracle boundary.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;

use crate::config::TournamentConfig;
use crate::oracle::{Oracle, OracleError};

/// Scripted result for one oracle call.
#[derive(Debug, Clone)]
pub enum ScriptedCall {
    Reply(String),
    Transient(String),
    Fatal(String),
    Other(String),
}

impl ScriptedCall {
    /// A reply wrapping the move letter in the expected JSON shape.
    pub fn move_reply(letter: &str) -> Self {
        ScriptedCall::Reply(format!(
            r#"{{"analysis": "scripted", "move": "{letter}"}}"#
        ))
    }
}

/// Oracle double returning queued outcomes in order.
///
/// Panics when called more times than scripted, so tests pin exact call
/// counts.
pub struct ScriptedOracle {
    model: String,
    calls: Mutex<VecDeque<ScriptedCall>>,
}

impl ScriptedOracle {
    pub fn new(calls: Vec<ScriptedCall>) -> Self {
        Self {
            model: "scripted-model".to_string(),
            calls: Mutex::new(calls.into()),
        }
    }

    /// Calls not yet consumed.
    pub fn remaining(&self) -> usize {
        self.calls.lock().expect("scripted oracle lock").len()
    }
}

impl Oracle for ScriptedOracle {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn propose(&self, _prompt: &str) -> Result<String, OracleError> {
        let call = self
            .calls
            .lock()
            .expect("scripted oracle lock")
            .pop_front()
            .expect("scripted oracle exhausted");
        scripted_result(call)
    }
}

/// Oracle double repeating one outcome forever.
pub struct RepeatOracle {
    model: String,
    call: ScriptedCall,
}

impl RepeatOracle {
    pub fn new(call: ScriptedCall) -> Self {
        Self {
            model: "repeat-model".to_string(),
            call,
        }
    }
}

impl Oracle for RepeatOracle {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn propose(&self, _prompt: &str) -> Result<String, OracleError> {
        scripted_result(self.call.clone())
    }
}

fn scripted_result(call: ScriptedCall) -> Result<String, OracleError> {
    match call {
        ScriptedCall::Reply(text) => Ok(text),
        ScriptedCall::Transient(msg) => Err(OracleError::Transient(msg)),
        ScriptedCall::Fatal(msg) => Err(OracleError::Fatal(msg)),
        ScriptedCall::Other(msg) => Err(OracleError::Other(msg)),
    }
}

/// Disposable workspace: a config whose ledger and audit paths live inside
/// a tempdir, with fast test-friendly retry settings.
pub struct TestArena {
    temp: tempfile::TempDir,
    pub config: TournamentConfig,
}

impl TestArena {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let config = TournamentConfig {
            turns: 5,
            seed: Some(7),
            max_retries: 2,
            backoff_base_ms: 0,
            backoff_cap_ms: 0,
            checkpoint_path: temp.path().join("results.jsonl"),
            audit_log_path: temp.path().join("audit.jsonl"),
            ..TournamentConfig::default()
        };
        Ok(Self { temp, config })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }
}

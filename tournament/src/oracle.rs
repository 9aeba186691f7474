//! Oracle boundary: external move proposers and their failure classes.
//!
//! The harness depends only on the [`Oracle`] trait; nothing outside this
//! module knows how a proposal is transported. Failures are classified
//! here, at the boundary, so callers branch on the variant and never
//! inspect message text.

use std::fmt;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Oracle command exit code for "try again later" (rate limited, upstream
/// timeout). BSD sysexits `EX_TEMPFAIL`.
pub const EXIT_TEMPFAIL: i32 = 75;
/// Oracle command exit code for authentication or quota failures. BSD
/// sysexits `EX_NOPERM`.
pub const EXIT_NOPERM: i32 = 77;

/// Failure classes an oracle call can produce.
#[derive(Debug)]
pub enum OracleError {
    /// Temporarily unavailable; worth retrying.
    Transient(String),
    /// Non-recoverable provider condition (bad credentials, exhausted
    /// quota). Never retried; aborts the match and the run.
    Fatal(String),
    /// Anything the boundary could not classify. Callers treat this like
    /// a malformed reply and degrade instead of crashing.
    Other(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Transient(msg) => write!(f, "transient oracle failure: {msg}"),
            OracleError::Fatal(msg) => write!(f, "fatal oracle failure: {msg}"),
            OracleError::Other(msg) => write!(f, "oracle failure: {msg}"),
        }
    }
}

impl std::error::Error for OracleError {}

/// The one oracle condition that escapes the decision adapter.
///
/// Recovered from an error chain via
/// `err.chain().any(|cause| cause.is::<FatalOracleError>())`.
#[derive(Debug)]
pub struct FatalOracleError {
    pub message: String,
}

impl fmt::Display for FatalOracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fatal oracle failure: {}", self.message)
    }
}

impl std::error::Error for FatalOracleError {}

/// A move proposer: takes a rendered prompt, returns raw response text or
/// a classified failure.
pub trait Oracle {
    /// Model identifier recorded in audit rows.
    fn model_name(&self) -> &str;

    fn propose(&self, prompt: &str) -> Result<String, OracleError>;
}

/// Oracle that spawns a configured command per call, writing the prompt to
/// stdin and reading the reply from stdout.
///
/// The command receives the model identifier in `ORACLE_MODEL`. Exit code
/// contract: `0` success, [`EXIT_TEMPFAIL`] transient, [`EXIT_NOPERM`]
/// fatal, anything else unclassified. Exceeding the per-call timeout is
/// transient; failing to spawn at all is fatal.
pub struct CommandOracle {
    model: String,
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandOracle {
    pub fn new(
        model: String,
        command: Vec<String>,
        timeout: Duration,
        output_limit_bytes: usize,
    ) -> Self {
        Self {
            model,
            command,
            timeout,
            output_limit_bytes,
        }
    }
}

impl Oracle for CommandOracle {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    fn propose(&self, prompt: &str) -> Result<String, OracleError> {
        let output = run_oracle_command(
            &self.command,
            &self.model,
            prompt.as_bytes(),
            self.timeout,
            self.output_limit_bytes,
        )
        .map_err(|err| OracleError::Fatal(format!("{err:#}")))?;

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "oracle call timed out");
            return Err(OracleError::Transient(format!(
                "call timed out after {}s",
                self.timeout.as_secs()
            )));
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        match output.status.code() {
            Some(0) => {
                let text = String::from_utf8_lossy(&output.stdout).to_string();
                debug!(reply_bytes = text.len(), "oracle replied");
                Ok(text)
            }
            Some(EXIT_TEMPFAIL) => Err(OracleError::Transient(stderr)),
            Some(EXIT_NOPERM) => Err(OracleError::Fatal(stderr)),
            code => Err(OracleError::Other(format!(
                "exit status {code:?}: {stderr}"
            ))),
        }
    }
}

struct OracleOutput {
    status: std::process::ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    timed_out: bool,
}

/// Spawn the oracle command, feed it the prompt, wait with a timeout, and
/// capture bounded output. Replies are small; output beyond the limit is
/// truncated.
fn run_oracle_command(
    command: &[String],
    model: &str,
    prompt: &[u8],
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<OracleOutput> {
    if command.is_empty() {
        bail!("oracle command must be non-empty");
    }

    let mut child = Command::new(&command[0])
        .args(&command[1..])
        .env("ORACLE_MODEL", model)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn oracle command {:?}", command))?;

    {
        // Close stdin after writing so the command sees EOF.
        let mut stdin = child
            .stdin
            .take()
            .context("oracle stdin was not piped")?;
        stdin.write_all(prompt).context("write prompt to oracle")?;
    }

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for oracle")? {
        Some(status) => status,
        None => {
            timed_out = true;
            child.kill().ok();
            child.wait().context("wait for oracle after kill")?
        }
    };

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    if let Some(mut out) = child.stdout.take() {
        out.read_to_end(&mut stdout).context("read oracle stdout")?;
    }
    if let Some(mut err) = child.stderr.take() {
        err.read_to_end(&mut stderr).context("read oracle stderr")?;
    }
    stdout.truncate(output_limit_bytes);
    stderr.truncate(output_limit_bytes);

    Ok(OracleOutput {
        status,
        stdout,
        stderr,
        timed_out,
    })
}

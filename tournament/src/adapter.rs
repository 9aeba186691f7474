//! Decision-policy adapter: turns a flaky oracle into a deterministic,
//! audited action source.
//!
//! Every attempt appends an audit row before its outcome is acted on; no
//! return path skips the log. Transient failures are retried with capped
//! exponential backoff, malformed replies and exhausted retries degrade to
//! a deterministic fallback move, and a fatal classification is the only
//! path that returns no action.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, warn};

use dilemma::action::Action;
use dilemma::history::TurnHistory;

use crate::audit::{AuditLog, AuditRecord};
use crate::oracle::{FatalOracleError, Oracle, OracleError};
use crate::prompt::PromptBuilder;
use crate::reply::parse_reply;

/// Exponential backoff between transient retries.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
}

impl BackoffPolicy {
    /// Delay after the `attempt`-th transient failure (0-indexed):
    /// `base * 2^attempt`, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.cap)
    }
}

/// Classified outcome of a single oracle call.
#[derive(Debug)]
enum AttemptOutcome {
    /// Reply parsed to a valid move.
    Success { action: Action, raw: String },
    /// Temporary provider condition; retried while the budget lasts.
    Transient { reason: String },
    /// Reply received but unusable (or an unclassified failure); resolved
    /// to the fallback immediately, never retried.
    Malformed { error: String, raw: String },
    /// Non-recoverable provider condition; aborts the match.
    Fatal { message: String },
}

/// Progress of one decision through the retry machine. Attempt counts,
/// classification, and backoff are visible state here rather than hidden
/// control flow.
#[derive(Debug)]
enum AttemptState {
    Attempting(u32),
    Backoff(u32, Duration),
    Resolved(Action),
    Aborted(FatalOracleError),
}

/// Drives one oracle-backed decision per turn.
///
/// One adapter exists per policy instance per match; attempt counters
/// reset on every `decide` call and nothing is shared across matches
/// except the process-wide oracle client and the audit file.
pub struct DecisionAdapter {
    oracle: Arc<dyn Oracle>,
    prompts: PromptBuilder,
    audit: AuditLog,
    opponent_name: String,
    max_retries: u32,
    backoff: BackoffPolicy,
}

impl DecisionAdapter {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        prompts: PromptBuilder,
        audit: AuditLog,
        opponent_name: impl Into<String>,
        max_retries: u32,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            oracle,
            prompts,
            audit,
            opponent_name: opponent_name.into(),
            max_retries,
            backoff,
        }
    }

    /// Produce exactly one action for the current turn.
    ///
    /// Success returns the oracle's parsed move. Malformed replies and
    /// exhausted retries resolve to the fallback: cooperate on an empty
    /// history, defect afterwards. A fatal classification is returned as
    /// an error carrying [`FatalOracleError`] and yields no action.
    pub fn decide(&mut self, own: &[Action], opponent: &[Action]) -> Result<Action> {
        let history = snapshot(own, opponent);
        let mut state = AttemptState::Attempting(0);

        loop {
            state = match state {
                AttemptState::Attempting(attempt) => {
                    let outcome = self.attempt(own, opponent);
                    self.resolve(attempt, outcome, own, &history)?
                }
                AttemptState::Backoff(attempt, delay) => {
                    debug!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "transient oracle failure, backing off"
                    );
                    thread::sleep(delay);
                    AttemptState::Attempting(attempt + 1)
                }
                AttemptState::Resolved(action) => return Ok(action),
                AttemptState::Aborted(fatal) => return Err(fatal.into()),
            };
        }
    }

    /// One oracle round-trip, classified. Prompt construction failures and
    /// unclassified oracle errors count as malformed so the policy degrades
    /// instead of crashing the match.
    fn attempt(&self, own: &[Action], opponent: &[Action]) -> AttemptOutcome {
        let prompt = match self.prompts.render(own, opponent) {
            Ok(prompt) => prompt,
            Err(err) => {
                return AttemptOutcome::Malformed {
                    error: format!("build prompt: {err:#}"),
                    raw: String::new(),
                };
            }
        };

        match self.oracle.propose(&prompt) {
            Ok(raw) => match parse_reply(&raw) {
                Ok(reply) => match Action::parse(&reply.proposed_move) {
                    Some(action) => AttemptOutcome::Success { action, raw },
                    None => AttemptOutcome::Malformed {
                        error: format!("invalid move {:?} in oracle reply", reply.proposed_move),
                        raw,
                    },
                },
                Err(err) => AttemptOutcome::Malformed {
                    error: format!("{err:#}"),
                    raw,
                },
            },
            Err(OracleError::Transient(reason)) => AttemptOutcome::Transient { reason },
            Err(OracleError::Fatal(message)) => AttemptOutcome::Fatal { message },
            Err(OracleError::Other(message)) => AttemptOutcome::Malformed {
                error: format!("unclassified oracle failure: {message}"),
                raw: String::new(),
            },
        }
    }

    /// Log the attempt, then map it to the next state. The audit row is
    /// written before any branch acts on the outcome.
    fn resolve(
        &self,
        attempt: u32,
        outcome: AttemptOutcome,
        own: &[Action],
        history: &TurnHistory,
    ) -> Result<AttemptState> {
        let next = match outcome {
            AttemptOutcome::Success { action, raw } => {
                self.log(history, action.as_str(), "", &raw)?;
                AttemptState::Resolved(action)
            }
            AttemptOutcome::Transient { reason } if attempt < self.max_retries => {
                self.log(
                    history,
                    "",
                    &format!(
                        "transient failure (attempt {} of {}): {}",
                        attempt + 1,
                        self.max_retries + 1,
                        reason
                    ),
                    "",
                )?;
                AttemptState::Backoff(attempt, self.backoff.delay(attempt))
            }
            AttemptOutcome::Transient { reason } => {
                let fallback = fallback_action(own);
                warn!(attempts = attempt + 1, "oracle retries exhausted, falling back");
                self.log(
                    history,
                    fallback.as_str(),
                    &format!(
                        "retries exhausted after {} attempts: {}",
                        attempt + 1,
                        reason
                    ),
                    "",
                )?;
                AttemptState::Resolved(fallback)
            }
            AttemptOutcome::Malformed { error, raw } => {
                let fallback = fallback_action(own);
                warn!(error = %error, "malformed oracle reply, falling back");
                self.log(history, fallback.as_str(), &error, &raw)?;
                AttemptState::Resolved(fallback)
            }
            AttemptOutcome::Fatal { message } => {
                self.log(history, "", &format!("fatal: {message}"), "")?;
                AttemptState::Aborted(FatalOracleError { message })
            }
        };
        Ok(next)
    }

    fn log(
        &self,
        history: &TurnHistory,
        llm_move: &str,
        error: &str,
        additional_info: &str,
    ) -> Result<()> {
        self.audit.append(&AuditRecord {
            timestamp: Utc::now().to_rfc3339(),
            opponent_name: self.opponent_name.clone(),
            match_history: history.clone(),
            model_name: self.oracle.model_name().to_string(),
            llm_move: llm_move.to_string(),
            error: error.to_string(),
            additional_info: additional_info.to_string(),
        })
    }
}

/// Deterministic degraded move: cooperate on an empty history, defect
/// after.
fn fallback_action(own: &[Action]) -> Action {
    if own.is_empty() {
        Action::Cooperate
    } else {
        Action::Defect
    }
}

/// Rebuild the visible history for audit snapshots. Both slices cover the
/// same completed turns.
fn snapshot(own: &[Action], opponent: &[Action]) -> TurnHistory {
    let mut history = TurnHistory::new();
    for (own_move, opponent_move) in own.iter().zip(opponent.iter()) {
        history.push(*own_move, *opponent_move);
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedCall, ScriptedOracle};

    fn adapter(oracle: ScriptedOracle, audit: &AuditLog, max_retries: u32) -> DecisionAdapter {
        DecisionAdapter::new(
            Arc::new(oracle),
            PromptBuilder::new(),
            audit.clone(),
            "Opponent",
            max_retries,
            BackoffPolicy {
                base: Duration::ZERO,
                cap: Duration::ZERO,
            },
        )
    }

    fn audit_log() -> (tempfile::TempDir, AuditLog) {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = AuditLog::new(&temp.path().join("audit.jsonl"));
        (temp, log)
    }

    #[test]
    fn success_returns_parsed_move_and_logs_once() {
        let (_temp, log) = audit_log();
        let oracle = ScriptedOracle::new(vec![ScriptedCall::move_reply("D")]);
        let mut adapter = adapter(oracle, &log, 3);

        let action = adapter.decide(&[], &[]).expect("decide");
        assert_eq!(action, Action::Defect);

        let rows = log.read_all().expect("read");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].llm_move, "D");
        assert_eq!(rows[0].error, "");
        assert!(rows[0].additional_info.contains("\"move\""));
    }

    #[test]
    fn malformed_reply_falls_back_to_cooperate_then_defect() {
        let (_temp, log) = audit_log();
        let oracle = ScriptedOracle::new(vec![
            ScriptedCall::Reply("not json at all".to_string()),
            ScriptedCall::Reply("not json at all".to_string()),
        ]);
        let mut adapter = adapter(oracle, &log, 3);

        // Turn 1: empty history, fallback cooperates.
        let first = adapter.decide(&[], &[]).expect("decide");
        assert_eq!(first, Action::Cooperate);

        // Turn 2: non-empty history, fallback defects.
        let second = adapter
            .decide(&[Action::Cooperate], &[Action::Cooperate])
            .expect("decide");
        assert_eq!(second, Action::Defect);

        let rows = log.read_all().expect("read");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| !row.error.is_empty()));
        assert_eq!(rows[0].llm_move, "C");
        assert_eq!(rows[1].llm_move, "D");
    }

    #[test]
    fn invalid_move_letter_is_malformed() {
        let (_temp, log) = audit_log();
        let oracle = ScriptedOracle::new(vec![ScriptedCall::move_reply("X")]);
        let mut adapter = adapter(oracle, &log, 3);

        let action = adapter.decide(&[], &[]).expect("decide");
        assert_eq!(action, Action::Cooperate);

        let rows = log.read_all().expect("read");
        assert!(rows[0].error.contains("invalid move"));
    }

    #[test]
    fn transient_then_success_uses_r_plus_one_attempts() {
        let (_temp, log) = audit_log();
        let oracle = ScriptedOracle::new(vec![
            ScriptedCall::Transient("rate limited".to_string()),
            ScriptedCall::Transient("rate limited".to_string()),
            ScriptedCall::move_reply("C"),
        ]);
        let mut adapter = adapter(oracle, &log, 5);

        let action = adapter.decide(&[], &[]).expect("decide");
        assert_eq!(action, Action::Cooperate);

        let rows = log.read_all().expect("read");
        assert_eq!(rows.len(), 3);
        assert!(rows[0].error.contains("transient failure (attempt 1"));
        assert!(rows[1].error.contains("transient failure (attempt 2"));
        assert_eq!(rows[2].error, "");
        assert_eq!(rows[2].llm_move, "C");
    }

    #[test]
    fn exhausted_retries_fall_back_and_log_exhaustion_last() {
        let (_temp, log) = audit_log();
        // R = 2 allows three attempts total; all transient.
        let oracle = ScriptedOracle::new(vec![
            ScriptedCall::Transient("429".to_string()),
            ScriptedCall::Transient("429".to_string()),
            ScriptedCall::Transient("429".to_string()),
        ]);
        let mut adapter = adapter(oracle, &log, 2);

        let action = adapter
            .decide(&[Action::Defect], &[Action::Defect])
            .expect("decide");
        assert_eq!(action, Action::Defect);

        let rows = log.read_all().expect("read");
        assert_eq!(rows.len(), 3);
        assert!(rows[0].error.contains("transient failure"));
        assert!(rows[1].error.contains("transient failure"));
        assert!(rows[2].error.contains("retries exhausted after 3 attempts"));
        assert_eq!(rows[2].llm_move, "D");
    }

    #[test]
    fn fatal_yields_no_action_and_is_downcastable() {
        let (_temp, log) = audit_log();
        let oracle = ScriptedOracle::new(vec![ScriptedCall::Fatal("quota exhausted".to_string())]);
        let mut adapter = adapter(oracle, &log, 5);

        let err = adapter.decide(&[], &[]).expect_err("fatal");
        assert!(err.chain().any(|cause| cause.is::<FatalOracleError>()));

        // The fatal attempt is still audited.
        let rows = log.read_all().expect("read");
        assert_eq!(rows.len(), 1);
        assert!(rows[0].error.contains("fatal: quota exhausted"));
        assert_eq!(rows[0].llm_move, "");
    }

    #[test]
    fn unclassified_failure_degrades_like_malformed() {
        let (_temp, log) = audit_log();
        let oracle = ScriptedOracle::new(vec![ScriptedCall::Other("exit status 9".to_string())]);
        let mut adapter = adapter(oracle, &log, 5);

        let action = adapter.decide(&[], &[]).expect("decide");
        assert_eq!(action, Action::Cooperate);

        let rows = log.read_all().expect("read");
        assert!(rows[0].error.contains("unclassified oracle failure"));
    }

    #[test]
    fn backoff_grows_exponentially_and_is_capped() {
        let backoff = BackoffPolicy {
            base: Duration::from_millis(100),
            cap: Duration::from_millis(350),
        };
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(2), Duration::from_millis(350));
        assert_eq!(backoff.delay(10), Duration::from_millis(350));
    }

    #[test]
    fn audit_rows_snapshot_the_visible_history() {
        let (_temp, log) = audit_log();
        let oracle = ScriptedOracle::new(vec![ScriptedCall::move_reply("C")]);
        let mut adapter = adapter(oracle, &log, 0);

        adapter
            .decide(&[Action::Cooperate], &[Action::Defect])
            .expect("decide");

        let rows = log.read_all().expect("read");
        assert_eq!(rows[0].match_history.own(), vec![Action::Cooperate]);
        assert_eq!(rows[0].match_history.opponent(), vec![Action::Defect]);
        assert_eq!(rows[0].opponent_name, "Opponent");
    }
}

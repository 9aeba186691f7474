//! Fixed-length match execution between two decision policies.

use std::fmt;

use tracing::{debug, instrument};

use crate::history::TurnHistory;
use crate::payoff::PayoffRule;
use crate::strategy::Strategy;

/// Executor lifecycle, observable for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    NotStarted,
    /// Turn currently being played (1-indexed).
    InProgress(u32),
    Completed,
    Aborted,
}

/// Outcome of a match that ran all its turns.
#[derive(Debug, Clone)]
pub struct MatchSummary {
    /// Full history from player 1's perspective.
    pub history: TurnHistory,
    /// Cumulative payoffs over all turns, `(player1, player2)`.
    pub total_payoff: (f64, f64),
    pub turns: u32,
}

/// A match stopped before completing its configured turns.
///
/// Transient and malformed oracle conditions are resolved inside the
/// policies and never surface here; any error a policy does return aborts
/// the match. Carries the partial history for audit. `source()` exposes
/// the policy error chain so callers can recognize fatal oracle failures.
#[derive(Debug)]
pub struct MatchAborted {
    /// Turn on which the failing decision was requested (1-indexed).
    pub turn: u32,
    /// Name of the policy whose decision failed.
    pub player: String,
    /// Turns completed before the abort, player 1's perspective.
    pub partial_history: TurnHistory,
    pub source: anyhow::Error,
}

impl fmt::Display for MatchAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "match aborted on turn {} ({} failed to decide)",
            self.turn, self.player
        )
    }
}

impl std::error::Error for MatchAborted {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

/// Plays fixed-length matches, one simultaneous turn at a time.
#[derive(Debug)]
pub struct MatchExecutor {
    rule: PayoffRule,
    turns: u32,
    state: MatchState,
}

impl MatchExecutor {
    pub fn new(rule: PayoffRule, turns: u32) -> Self {
        Self {
            rule,
            turns,
            state: MatchState::NotStarted,
        }
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    /// Play the full match.
    ///
    /// On each turn both policies decide from the history accumulated so
    /// far (the current turn is excluded from both views), then the action
    /// pair is appended and scored. The history never grows past the
    /// configured turn count.
    #[instrument(skip_all, fields(player1 = player1.name(), player2 = player2.name(), turns = self.turns))]
    pub fn run(
        &mut self,
        player1: &mut dyn Strategy,
        player2: &mut dyn Strategy,
    ) -> Result<MatchSummary, MatchAborted> {
        let mut history = TurnHistory::new();
        let mut totals = (0.0, 0.0);

        for turn in 1..=self.turns {
            self.state = MatchState::InProgress(turn);
            let own1 = history.own();
            let own2 = history.opponent();

            let action1 = match player1.decide(&own1, &own2) {
                Ok(action) => action,
                Err(err) => return Err(self.abort(turn, player1.name(), history, err)),
            };
            let action2 = match player2.decide(&own2, &own1) {
                Ok(action) => action,
                Err(err) => return Err(self.abort(turn, player2.name(), history, err)),
            };

            history.push(action1, action2);
            let (p1, p2) = self.rule.payoff(action1, action2);
            totals.0 += p1;
            totals.1 += p2;
        }

        self.state = MatchState::Completed;
        debug!(
            history = %TurnHistory::compact(&history.own()),
            opponent = %TurnHistory::compact(&history.opponent()),
            payoff1 = totals.0,
            payoff2 = totals.1,
            "match complete"
        );
        Ok(MatchSummary {
            history,
            total_payoff: totals,
            turns: self.turns,
        })
    }

    fn abort(
        &mut self,
        turn: u32,
        player: &str,
        partial_history: TurnHistory,
        source: anyhow::Error,
    ) -> MatchAborted {
        self.state = MatchState::Aborted;
        debug!(
            turn,
            player,
            completed_turns = partial_history.len(),
            "match aborted"
        );
        MatchAborted {
            turn,
            player: player.to_string(),
            partial_history,
            source,
        }
    }
}

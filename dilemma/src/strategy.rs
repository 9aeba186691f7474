//! The decision-policy seam shared by rule-based and oracle-backed players.

use anyhow::Result;

use crate::action::Action;

/// A source of moves: given the visible history, propose the next action.
///
/// Histories cover completed turns only; an implementation never sees the
/// turn currently being decided. Rule-based strategies are infallible.
/// Oracle-backed ones absorb transient and malformed provider conditions
/// internally and return an error only for non-recoverable failures, which
/// abort the match.
pub trait Strategy {
    fn name(&self) -> &str;

    fn decide(&mut self, own: &[Action], opponent: &[Action]) -> Result<Action>;
}

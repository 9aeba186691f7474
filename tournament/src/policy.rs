//! Oracle-backed implementation of the decision-policy seam.

use anyhow::Result;

use dilemma::action::Action;
use dilemma::strategy::Strategy;

use crate::adapter::DecisionAdapter;

/// A player whose moves come from the oracle, by way of the adapter.
///
/// Composes the adapter rather than inheriting from it: retry, fallback,
/// and audit behavior all live in [`DecisionAdapter`]; this type only
/// satisfies the [`Strategy`] seam the match executor drives.
pub struct OraclePolicy {
    name: String,
    adapter: DecisionAdapter,
}

impl OraclePolicy {
    pub fn new(name: impl Into<String>, adapter: DecisionAdapter) -> Self {
        Self {
            name: name.into(),
            adapter,
        }
    }
}

impl Strategy for OraclePolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, own: &[Action], opponent: &[Action]) -> Result<Action> {
        self.adapter.decide(own, opponent)
    }
}

//! Payoff rule and score aggregation.

use crate::action::Action;
use crate::history::TurnHistory;

/// Per-turn payoff matrix.
///
/// Defaults to the standard prisoner's dilemma values: mutual cooperation
/// pays 3, mutual defection 1, unilateral defection 5 against 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoffRule {
    pub reward: f64,
    pub sucker: f64,
    pub temptation: f64,
    pub punishment: f64,
}

impl Default for PayoffRule {
    fn default() -> Self {
        Self {
            reward: 3.0,
            sucker: 0.0,
            temptation: 5.0,
            punishment: 1.0,
        }
    }
}

impl PayoffRule {
    /// Payoffs for one turn, `(own, opponent)`.
    pub fn payoff(&self, own: Action, opponent: Action) -> (f64, f64) {
        match (own, opponent) {
            (Action::Cooperate, Action::Cooperate) => (self.reward, self.reward),
            (Action::Cooperate, Action::Defect) => (self.sucker, self.temptation),
            (Action::Defect, Action::Cooperate) => (self.temptation, self.sucker),
            (Action::Defect, Action::Defect) => (self.punishment, self.punishment),
        }
    }
}

/// Average payoff per turn for both players over a completed history.
///
/// Pure and deterministic; an empty history scores `(0.0, 0.0)`.
pub fn score_per_turn(history: &TurnHistory, rule: &PayoffRule) -> (f64, f64) {
    if history.is_empty() {
        return (0.0, 0.0);
    }
    let mut totals = (0.0, 0.0);
    for (own, opponent) in history.turns() {
        let (p1, p2) = rule.payoff(*own, *opponent);
        totals.0 += p1;
        totals.1 += p2;
    }
    let turns = history.len() as f64;
    (totals.0 / turns, totals.1 / turns)
}

//! Per-match turn history.

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Ordered, append-only record of one match's turns from one player's
/// perspective: each entry is `(own, opponent)`.
///
/// The only mutation is [`TurnHistory::push`]; entries are never edited or
/// removed once appended. Serializes as an array of letter pairs
/// (`[["C","D"], ...]`), which is the form the audit log stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnHistory {
    turns: Vec<(Action, Action)>,
}

impl TurnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed turn.
    pub fn push(&mut self, own: Action, opponent: Action) {
        self.turns.push((own, opponent));
    }

    pub fn turns(&self) -> &[(Action, Action)] {
        &self.turns
    }

    /// This player's moves, oldest first.
    pub fn own(&self) -> Vec<Action> {
        self.turns.iter().map(|(own, _)| *own).collect()
    }

    /// The opponent's moves, oldest first.
    pub fn opponent(&self) -> Vec<Action> {
        self.turns.iter().map(|(_, opponent)| *opponent).collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Compact `CDC...` rendering of one side's moves.
    pub fn compact(moves: &[Action]) -> String {
        moves.iter().map(Action::as_str).collect()
    }
}

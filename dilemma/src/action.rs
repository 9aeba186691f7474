//! Moves available to a player on each turn.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One move in the iterated prisoner's dilemma.
///
/// These two variants are the only values a turn history ever stores; any
/// "invalid move" condition is resolved before an `Action` is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "C")]
    Cooperate,
    #[serde(rename = "D")]
    Defect,
}

impl Action {
    /// Parse a move string: exactly `C` or `D`, case-insensitively, with
    /// surrounding whitespace tolerated. Anything else is `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("C") {
            Some(Action::Cooperate)
        } else if trimmed.eq_ignore_ascii_case("D") {
            Some(Action::Defect)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Cooperate => "C",
            Action::Defect => "D",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

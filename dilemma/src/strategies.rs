//! Rule-based strategies for the tournament roster.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::action::Action;
use crate::strategy::Strategy;

/// Always cooperates.
#[derive(Debug, Default)]
pub struct Cooperator;

impl Strategy for Cooperator {
    fn name(&self) -> &str {
        "Cooperator"
    }

    fn decide(&mut self, _own: &[Action], _opponent: &[Action]) -> Result<Action> {
        Ok(Action::Cooperate)
    }
}

/// Always defects.
#[derive(Debug, Default)]
pub struct Defector;

impl Strategy for Defector {
    fn name(&self) -> &str {
        "Defector"
    }

    fn decide(&mut self, _own: &[Action], _opponent: &[Action]) -> Result<Action> {
        Ok(Action::Defect)
    }
}

/// Cooperates first, then mirrors the opponent's previous move.
#[derive(Debug, Default)]
pub struct TitForTat;

impl Strategy for TitForTat {
    fn name(&self) -> &str {
        "Tit For Tat"
    }

    fn decide(&mut self, _own: &[Action], opponent: &[Action]) -> Result<Action> {
        Ok(opponent.last().copied().unwrap_or(Action::Cooperate))
    }
}

/// Cooperates until the opponent defects once, then defects forever.
#[derive(Debug, Default)]
pub struct Grudger;

impl Strategy for Grudger {
    fn name(&self) -> &str {
        "Grudger"
    }

    fn decide(&mut self, _own: &[Action], opponent: &[Action]) -> Result<Action> {
        if opponent.contains(&Action::Defect) {
            Ok(Action::Defect)
        } else {
            Ok(Action::Cooperate)
        }
    }
}

/// Uniformly random moves from a seeded generator.
#[derive(Debug)]
pub struct Random {
    rng: StdRng,
}

impl Random {
    /// Deterministic for a fixed seed, so seeded runs are reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Strategy for Random {
    fn name(&self) -> &str {
        "Random"
    }

    fn decide(&mut self, _own: &[Action], _opponent: &[Action]) -> Result<Action> {
        if self.rng.gen_bool(0.5) {
            Ok(Action::Cooperate)
        } else {
            Ok(Action::Defect)
        }
    }
}

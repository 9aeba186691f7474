//! Standings aggregation over the checkpoint ledger.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::checkpoint::MatchRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStanding {
    pub name: String,
    pub matches: usize,
    pub mean_score_per_turn: f64,
}

/// Mean score-per-turn for each player across their recorded matches,
/// best first, ties broken by name.
pub fn standings(records: &[MatchRecord]) -> Vec<PlayerStanding> {
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(&record.player1).or_insert((0.0, 0));
        entry.0 += record.player1_score_per_turn;
        entry.1 += 1;
        let entry = totals.entry(&record.player2).or_insert((0.0, 0));
        entry.0 += record.player2_score_per_turn;
        entry.1 += 1;
    }

    let mut rows: Vec<PlayerStanding> = totals
        .into_iter()
        .map(|(name, (total, matches))| PlayerStanding {
            name: name.to_string(),
            matches,
            mean_score_per_turn: total / matches as f64,
        })
        .collect();
    rows.sort_by(|left, right| {
        right
            .mean_score_per_turn
            .partial_cmp(&left.mean_score_per_turn)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.name.cmp(&right.name))
    });
    rows
}

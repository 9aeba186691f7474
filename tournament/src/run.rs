//! Tournament orchestration: a resumable round-robin over the roster.

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use dilemma::match_runner::MatchExecutor;
use dilemma::payoff::{PayoffRule, score_per_turn};

use crate::checkpoint::{CheckpointStore, MatchRecord};
use crate::config::TournamentConfig;
use crate::pairing::round_robin_pairs;
use crate::roster::PlayerSpec;

/// Summary of one orchestrator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentOutcome {
    /// Matches played and recorded by this invocation.
    pub played: usize,
    /// Pairs skipped because the checkpoint already had them.
    pub skipped: usize,
    pub total_pairs: usize,
}

/// Run (or resume) the full round-robin.
///
/// Pairs already in the checkpoint are skipped by exact orientation;
/// every other pair gets fresh policy instances, a full match, and one
/// appended record. A fatal oracle condition stops the run before the
/// current pair is recorded; pairs not yet attempted are left untouched,
/// so the next invocation resumes at the same failing pair. A provider
/// that stays broken therefore re-fails the same pair on every rerun —
/// there is deliberately no circuit breaker here.
#[instrument(skip_all, fields(players = roster.len(), turns = config.turns))]
pub fn run_tournament(
    roster: &[PlayerSpec],
    config: &TournamentConfig,
) -> Result<TournamentOutcome> {
    let mut checkpoint = CheckpointStore::load(&config.checkpoint_path)?;
    let pairs = round_robin_pairs(roster.len());
    let total_pairs = pairs.len();
    info!(
        total_pairs,
        recorded = checkpoint.records().len(),
        "tournament starting"
    );

    let rule = PayoffRule::default();
    let mut played = 0usize;
    let mut skipped = 0usize;

    for (i, j) in pairs {
        let player1 = &roster[i];
        let player2 = &roster[j];
        if checkpoint.contains(&player1.name, &player2.name) {
            debug!(player1 = %player1.name, player2 = %player2.name, "already recorded, skipping");
            skipped += 1;
            continue;
        }

        info!(player1 = %player1.name, player2 = %player2.name, "match starting");
        let mut policy1 = player1.instantiate(&player2.name);
        let mut policy2 = player2.instantiate(&player1.name);
        let mut executor = MatchExecutor::new(rule, config.turns);
        let summary = executor
            .run(policy1.as_mut(), policy2.as_mut())
            .map_err(|aborted| {
                anyhow::Error::new(aborted)
                    .context(format!("{} vs {}", player1.name, player2.name))
            })?;

        let (score1, score2) = score_per_turn(&summary.history, &rule);
        checkpoint
            .append(MatchRecord {
                player1: player1.name.clone(),
                player2: player2.name.clone(),
                player1_score_per_turn: score1,
                player2_score_per_turn: score2,
            })
            .context("record completed match")?;
        info!(
            player1 = %player1.name,
            player2 = %player2.name,
            score1,
            score2,
            "match recorded"
        );
        played += 1;
    }

    info!(played, skipped, "tournament complete");
    Ok(TournamentOutcome {
        played,
        skipped,
        total_pairs,
    })
}

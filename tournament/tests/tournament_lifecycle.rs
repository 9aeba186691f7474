//! End-to-end scheduling behavior: fresh runs, resumption, and skipping.

use std::sync::Arc;
use std::time::Duration;

use dilemma::strategies::{Cooperator, TitForTat};

use tournament::adapter::{BackoffPolicy, DecisionAdapter};
use tournament::audit::AuditLog;
use tournament::checkpoint::{CheckpointStore, MatchRecord};
use tournament::config::TournamentConfig;
use tournament::oracle::Oracle;
use tournament::policy::OraclePolicy;
use tournament::prompt::PromptBuilder;
use tournament::roster::PlayerSpec;
use tournament::run::run_tournament;
use tournament::test_support::{RepeatOracle, ScriptedCall, TestArena};

/// Three-player roster whose last slot is oracle-backed: pairs are
/// (Tit For Tat, Cooperator), (Tit For Tat, LLM), (Cooperator, LLM).
fn test_roster(oracle: Arc<dyn Oracle>, config: &TournamentConfig) -> Vec<PlayerSpec> {
    let audit = AuditLog::new(&config.audit_log_path);
    let backoff = BackoffPolicy {
        base: Duration::from_millis(config.backoff_base_ms),
        cap: Duration::from_millis(config.backoff_cap_ms),
    };
    let max_retries = config.max_retries;

    vec![
        PlayerSpec::new("Tit For Tat", Box::new(|_| Box::new(TitForTat))),
        PlayerSpec::new("Cooperator", Box::new(|_| Box::new(Cooperator))),
        PlayerSpec::new(
            "LLM",
            Box::new(move |opponent| {
                let adapter = DecisionAdapter::new(
                    oracle.clone(),
                    PromptBuilder::new(),
                    audit.clone(),
                    opponent,
                    max_retries,
                    backoff,
                );
                Box::new(OraclePolicy::new("LLM", adapter))
            }),
        ),
    ]
}

#[test]
fn fresh_run_records_every_pair_once() {
    let arena = TestArena::new().expect("arena");
    let oracle = Arc::new(RepeatOracle::new(ScriptedCall::move_reply("C")));
    let roster = test_roster(oracle, &arena.config);

    let outcome = run_tournament(&roster, &arena.config).expect("run");
    assert_eq!(outcome.played, 3);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(outcome.total_pairs, 3);

    let checkpoint = CheckpointStore::load(&arena.config.checkpoint_path).expect("load");
    let pairs: Vec<(&str, &str)> = checkpoint
        .records()
        .iter()
        .map(|r| (r.player1.as_str(), r.player2.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Tit For Tat", "Cooperator"),
            ("Tit For Tat", "LLM"),
            ("Cooperator", "LLM"),
        ]
    );

    // Everyone cooperates in this lineup, so every seat averages 3.
    for record in checkpoint.records() {
        assert!((record.player1_score_per_turn - 3.0).abs() < 1e-12);
        assert!((record.player2_score_per_turn - 3.0).abs() < 1e-12);
    }
}

#[test]
fn second_run_skips_everything() {
    let arena = TestArena::new().expect("arena");
    let oracle = Arc::new(RepeatOracle::new(ScriptedCall::move_reply("C")));
    let roster = test_roster(oracle, &arena.config);

    run_tournament(&roster, &arena.config).expect("first run");
    let outcome = run_tournament(&roster, &arena.config).expect("second run");

    assert_eq!(outcome.played, 0);
    assert_eq!(outcome.skipped, 3);

    let checkpoint = CheckpointStore::load(&arena.config.checkpoint_path).expect("load");
    assert_eq!(checkpoint.records().len(), 3);
}

#[test]
fn prepopulated_pairs_are_skipped_and_left_untouched() {
    let arena = TestArena::new().expect("arena");

    // Seed the ledger with one pair, using sentinel scores no real match
    // produces, to prove resumption does not rewrite existing rows.
    let sentinel = MatchRecord {
        player1: "Tit For Tat".to_string(),
        player2: "LLM".to_string(),
        player1_score_per_turn: 9.9,
        player2_score_per_turn: 9.9,
    };
    let mut store = CheckpointStore::load(&arena.config.checkpoint_path).expect("load");
    store.append(sentinel.clone()).expect("seed");
    drop(store);

    let oracle = Arc::new(RepeatOracle::new(ScriptedCall::move_reply("C")));
    let roster = test_roster(oracle, &arena.config);
    let outcome = run_tournament(&roster, &arena.config).expect("run");

    assert_eq!(outcome.played, 2);
    assert_eq!(outcome.skipped, 1);

    let checkpoint = CheckpointStore::load(&arena.config.checkpoint_path).expect("reload");
    assert_eq!(checkpoint.records().len(), 3);
    assert_eq!(checkpoint.records()[0], sentinel);
}

#[test]
fn orientation_matters_for_resumption() {
    let arena = TestArena::new().expect("arena");

    // A record in the opposite orientation must not suppress the pair.
    let reversed = MatchRecord {
        player1: "Cooperator".to_string(),
        player2: "Tit For Tat".to_string(),
        player1_score_per_turn: 1.0,
        player2_score_per_turn: 1.0,
    };
    let mut store = CheckpointStore::load(&arena.config.checkpoint_path).expect("load");
    store.append(reversed).expect("seed");
    drop(store);

    let oracle = Arc::new(RepeatOracle::new(ScriptedCall::move_reply("C")));
    let roster = test_roster(oracle, &arena.config);
    let outcome = run_tournament(&roster, &arena.config).expect("run");

    // All three generated pairs still run; the reversed row matches none.
    assert_eq!(outcome.played, 3);
    assert_eq!(outcome.skipped, 0);
}

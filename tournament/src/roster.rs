//! Tournament roster: identities plus per-match policy factories.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use dilemma::strategies::{Cooperator, Defector, Grudger, Random, TitForTat};
use dilemma::strategy::Strategy;

use crate::adapter::{BackoffPolicy, DecisionAdapter};
use crate::audit::AuditLog;
use crate::config::TournamentConfig;
use crate::oracle::Oracle;
use crate::policy::OraclePolicy;
use crate::prompt::PromptBuilder;

/// Factory producing a fresh policy for one match against `opponent`.
pub type PolicyFactory = Box<dyn Fn(&str) -> Box<dyn Strategy>>;

/// One roster slot: a stable identity plus its policy factory.
///
/// The roster is fixed at run start; the factory is invoked once per
/// match, so every match gets independent policy state (histories, retry
/// counters, rng positions) with nothing carried over.
pub struct PlayerSpec {
    pub name: String,
    factory: PolicyFactory,
}

impl PlayerSpec {
    pub fn new(name: impl Into<String>, factory: PolicyFactory) -> Self {
        Self {
            name: name.into(),
            factory,
        }
    }

    /// Fresh policy instance for a match against `opponent`.
    pub fn instantiate(&self, opponent: &str) -> Box<dyn Strategy> {
        (self.factory)(opponent)
    }
}

/// The default lineup: the classic rule-based strategies plus one
/// oracle-backed player named after its model.
pub fn builtin_roster(
    oracle: Arc<dyn Oracle>,
    audit: AuditLog,
    config: &TournamentConfig,
) -> Result<Vec<PlayerSpec>> {
    let prompts = PromptBuilder::from_override(config.prompt_template.as_deref())?;
    let backoff = BackoffPolicy {
        base: Duration::from_millis(config.backoff_base_ms),
        cap: Duration::from_millis(config.backoff_cap_ms),
    };
    let max_retries = config.max_retries;
    let seed = config.seed;
    let llm_name = format!("LLM ({})", config.model);
    let oracle_player_name = llm_name.clone();

    Ok(vec![
        PlayerSpec::new("Cooperator", Box::new(|_| Box::new(Cooperator))),
        PlayerSpec::new("Defector", Box::new(|_| Box::new(Defector))),
        PlayerSpec::new("Tit For Tat", Box::new(|_| Box::new(TitForTat))),
        PlayerSpec::new("Grudger", Box::new(|_| Box::new(Grudger))),
        PlayerSpec::new(
            "Random",
            Box::new(move |_| match seed {
                Some(seed) => Box::new(Random::seeded(seed)),
                None => Box::new(Random::from_entropy()),
            }),
        ),
        PlayerSpec::new(
            llm_name,
            Box::new(move |opponent| {
                let adapter = DecisionAdapter::new(
                    oracle.clone(),
                    prompts.clone(),
                    audit.clone(),
                    opponent,
                    max_retries,
                    backoff,
                );
                Box::new(OraclePolicy::new(oracle_player_name.clone(), adapter))
            }),
        ),
    ])
}

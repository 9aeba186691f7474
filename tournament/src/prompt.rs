//! Prompt construction for oracle-backed players.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use dilemma::action::Action;
use dilemma::history::TurnHistory;

const MOVE_TEMPLATE: &str = include_str!("prompts/move.md");

/// Renders the move prompt from the visible history.
///
/// Histories are rendered in the compact `CDC...` form, with `None`
/// standing in for an empty history so turn one is unambiguous to the
/// model. Rendering is deterministic for identical inputs.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
}

impl PromptBuilder {
    /// Builder using the built-in template.
    pub fn new() -> Self {
        Self {
            template: MOVE_TEMPLATE.to_string(),
        }
    }

    /// Builder using the built-in template, or the override file when the
    /// config names one.
    pub fn from_override(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::new()),
            Some(path) => {
                let template = fs::read_to_string(path)
                    .with_context(|| format!("read prompt template {}", path.display()))?;
                Ok(Self { template })
            }
        }
    }

    pub fn render(&self, own: &[Action], opponent: &[Action]) -> Result<String> {
        let mut env = Environment::new();
        env.add_template("move", &self.template)
            .context("compile prompt template")?;
        let template = env.get_template("move").context("load prompt template")?;
        let rendered = template
            .render(context! {
                own_history => render_side(own),
                opponent_history => render_side(opponent),
                turns_played => own.len(),
            })
            .context("render prompt template")?;
        Ok(rendered)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn render_side(moves: &[Action]) -> String {
    if moves.is_empty() {
        "None".to_string()
    } else {
        TurnHistory::compact(moves)
    }
}

//! Iterated prisoner's dilemma primitives.
//!
//! This crate holds the game itself: moves, per-match histories, the payoff
//! rule, the rule-based strategies, and the match executor that plays two
//! decision policies against each other for a fixed number of turns. It is
//! deliberately free of filesystem and process I/O:
//!
//! - **[`strategy`]** defines the single seam every player satisfies:
//!   "propose the next action given the visible history". Rule-based and
//!   oracle-backed players are variant implementations of this one trait.
//! - **[`match_runner`]** drives a match turn by turn and is the only
//!   module that mutates a [`history::TurnHistory`].
//!
//! Oracle plumbing (retries, audit logging, checkpointing) lives in the
//! `tournament` crate, which depends on this one.

pub mod action;
pub mod history;
pub mod match_runner;
pub mod payoff;
pub mod strategies;
pub mod strategy;

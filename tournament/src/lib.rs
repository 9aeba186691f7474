//! Resumable round-robin tournament harness for oracle-backed players.
//!
//! The harness plays every unique roster pair exactly once, surviving
//! process restarts without re-running or double-counting a match, and
//! turns a flaky, rate-limited oracle into a deterministic, audited action
//! source. The architecture keeps two concerns apart:
//!
//! - **Scheduling** ([`pairing`], [`checkpoint`], [`run`]): deterministic
//!   pair enumeration over a durable ledger of completed matches. Only
//!   fully completed matches are ever recorded, so interrupting the
//!   process between (or during) matches is always safe.
//! - **Decision plumbing** ([`oracle`], [`reply`], [`adapter`], [`audit`]):
//!   the oracle boundary classifies every failure as transient, fatal, or
//!   unclassified; the adapter retries transients with capped exponential
//!   backoff, degrades malformed replies to a deterministic fallback, logs
//!   every attempt, and lets only fatal conditions escape.
//!
//! Game rules and the rule-based strategies live in the `dilemma` crate.

pub mod adapter;
pub mod audit;
pub mod checkpoint;
pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod oracle;
pub mod pairing;
pub mod policy;
pub mod prompt;
pub mod reply;
pub mod report;
pub mod roster;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

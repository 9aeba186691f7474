//! Stable exit codes for the tournament CLI.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed (invalid config, I/O error, corrupt ledger).
pub const INVALID: i32 = 1;
/// The run aborted on a fatal oracle condition; resuming retries the
/// aborted pair.
pub const FATAL_ORACLE: i32 = 2;

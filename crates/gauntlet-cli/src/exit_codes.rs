//! Exit codes are part of the CLI contract; CI gates on them.

/// Run completed and every case passed.
pub const SUCCESS: i32 = 0;
/// Run completed but at least one case failed, errored, or regressed.
pub const EVAL_FAILED: i32 = 1;
/// Configuration, suite, or prompt problem before any case ran.
pub const CONFIG_ERROR: i32 = 2;

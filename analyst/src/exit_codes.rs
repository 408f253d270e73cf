//! Stable exit codes for analyst CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config/session/routing or other errors.
pub const INVALID: i32 = 1;
/// `analyst ask` aborted because a task exhausted its retry budget after the
/// one-shot revision.
pub const EXHAUSTED: i32 = 3;

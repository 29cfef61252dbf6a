//! Stable exit codes for the `recorder` and `verify` binaries.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed: bad manifest, missing tool, subprocess error.
pub const ERROR: i32 = 1;
/// A recording was produced but did not pass validation.
pub const VALIDATION_FAILED: i32 = 2;

//! Demo recording toolkit for the `wt` CLI.
//!
//! Demos run against throwaway git repositories and home directories with
//! mock external tools, driven by VHS tapes. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (tape rendering, command
//!   extraction, checkpoint matching, diffs). No I/O.
//! - **[`io`]**: Side-effecting operations (git, subprocesses, downloads,
//!   config files).
//!
//! [`demo`] coordinates both to implement the CLI commands described by a
//! demo manifest.

pub mod core;
pub mod demo;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

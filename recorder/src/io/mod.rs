//! I/O helpers for demo recording: provisioning, external tools and files.

pub mod claude;
pub mod deps;
pub mod env;
pub mod fish;
pub mod fixtures;
pub mod git;
pub mod manifest;
pub mod mocks;
pub mod process;
pub mod snapshot;
pub mod tape;
pub mod vhs;
pub mod zellij;

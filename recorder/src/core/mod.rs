//! Deterministic, pure logic shared by the recorder.
//!
//! Core modules must be free of I/O side effects. They operate on strings and
//! small value types and return deterministic outputs suitable for tests.

pub mod checkpoint;
pub mod commands;
pub mod dates;
pub mod platform;
pub mod size;
pub mod snapshot;
pub mod tape;
pub mod theme;

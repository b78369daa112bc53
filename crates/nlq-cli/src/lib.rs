//! nlq CLI library surface, exposed for integration testing.
//!
//! The `nlq` binary is the primary entry point; this module just lets
//! tests exercise argument parsing and report formatting without spawning
//! a subprocess.

pub mod cli;
pub mod output;

pub use cli::Args;

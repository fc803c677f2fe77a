//! Subcommand implementations.

pub mod config;
pub mod sources;
pub mod sync;

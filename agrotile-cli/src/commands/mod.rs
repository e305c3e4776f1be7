//! Subcommand implementations.

pub mod config;
pub mod serve;
pub mod tile;
pub mod warm;

//! CLI subcommand implementations.

pub mod aliases;
pub mod analyze;
pub mod show_config;

//! Warehouse efficiency CLI library.
//!
//! This crate provides ingestion and the command-line interface around
//! the `wheff-core` engine.

mod cli;
pub mod commands;
mod config;
pub mod ingest;

pub use cli::{Cli, Commands};
pub use config::Config;

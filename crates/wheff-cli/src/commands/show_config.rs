//! Config command: print the effective configuration as TOML.

use anyhow::{Context, Result};

use crate::Config;

pub fn format_config(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("failed to serialize configuration")
}

pub fn run(config: &Config) -> Result<()> {
    print!("{}", format_config(config)?);
    Ok(())
}

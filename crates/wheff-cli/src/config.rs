//! Configuration loading and management.

use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use wheff_core::{EngineConfig, ExclusionRule};

use crate::ingest::ReportKind;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default column layout for input files.
    #[serde(default)]
    pub report: ReportKind,

    /// Engine thresholds.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Exclusion windows applied to every run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<ExclusionRule>,
}

/// Exclusion rules kept in a standalone TOML file.
#[derive(Debug, Default, Deserialize)]
struct ExclusionFile {
    #[serde(default)]
    exclusions: Vec<ExclusionRule>,
}

impl Config {
    /// Loads configuration from default locations, optionally merging a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WHEFF_*, nested with __)
        figment = figment.merge(Env::prefixed("WHEFF_").split("__"));

        figment.extract()
    }
}

/// Loads `[[exclusions]]` entries from a TOML file. The file must exist.
pub fn load_exclusions(path: &Path) -> anyhow::Result<Vec<ExclusionRule>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: ExclusionFile = Figment::from(Toml::string(&contents))
        .extract()
        .with_context(|| format!("invalid exclusion rules in {}", path.display()))?;
    Ok(file.exclusions)
}

/// Returns the platform-specific config directory for wheff.
///
/// On Linux: `~/.config/wheff`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wheff"))
}

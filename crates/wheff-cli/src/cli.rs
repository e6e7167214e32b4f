//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::analyze::AnalyzeArgs;
use crate::ingest::ReportKind;

/// Warehouse efficiency reports.
///
/// Computes records per working hour and idle gaps per operator and day
/// from timestamped work logs.
#[derive(Debug, Parser)]
#[command(name = "wheff", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze a work log and print efficiency and idle-gap tables.
    Analyze(AnalyzeArgs),

    /// List the column names accepted for a report layout.
    Aliases {
        /// Report layout (defaults to the configured one).
        #[arg(long, value_enum)]
        report: Option<ReportKind>,
    },

    /// Print the effective configuration.
    Config,
}

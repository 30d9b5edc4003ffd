//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Cairn using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Cairn - research-data repository service core
#[derive(Parser, Debug)]
#[command(name = "cairn")]
#[command(version, about, long_about = None)]
#[command(author = "Cairn Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "cairn.toml", env = "CAIRN_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CAIRN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Export metadata of released datasets
    Export(commands::export::ExportArgs),

    /// Inspect and release dataset locks
    Locks(commands::locks::LocksArgs),

    /// Assign and register identifiers for a dataset's files
    RegisterFilePids(commands::pids::RegisterFilePidsArgs),
}

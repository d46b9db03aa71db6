//! # Compref CLI Module
//!
//! This module implements the CLI interface for Compref.
//!
//! ## Available Commands
//!
//! - `resolve` - Resolve every component of a report
//! - `lookup` - Resolve a report and show one component
//! - `encode` - Convert a JSON report to the binary format
//! - `index` - List persisted component identities
//! - `init` - Initialize a new index database

mod commands;

use crate::config::{Overrides, Settings};
use crate::input::ReportFormat;
use clap::{Parser, Subcommand};
use compref_core::ComprefError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Compref - component key and identifier resolution
///
/// Assigns every component of an analysis report a hierarchical key and an
/// identifier that stays stable across analyses.
#[derive(Parser, Debug)]
#[command(name = "compref")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress summary output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./compref.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the persisted-component index database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve keys and identifiers for every component of a report
    Resolve {
        /// Path to the report file
        #[arg(short, long)]
        report: PathBuf,

        /// Report format (json, binary); detected when omitted
        #[arg(short = 't', long)]
        format: Option<String>,

        /// Persist the resolved identities to the index
        #[arg(long)]
        record: bool,

        /// Mint name-based identifiers instead of random ones
        #[arg(long)]
        deterministic: bool,
    },

    /// Resolve a report and show a single component
    Lookup {
        /// Path to the report file
        #[arg(short, long)]
        report: PathBuf,

        /// Report format (json, binary); detected when omitted
        #[arg(short = 't', long)]
        format: Option<String>,

        /// Component ref to look up
        #[arg(long = "ref")]
        component_ref: u32,
    },

    /// Convert a JSON report to the binary format
    Encode {
        /// Input JSON report
        #[arg(short, long)]
        input: PathBuf,

        /// Output binary report
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List persisted component identities
    Index,

    /// Initialize a new empty index database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Flag values that take precedence over environment and config file.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        let deterministic_ids = matches!(
            self.command,
            Some(Commands::Resolve {
                deterministic: true,
                ..
            })
        );
        Overrides {
            database: self.database.clone(),
            json_output: self.json_mode,
            deterministic_ids,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

fn report_format(format: Option<&str>) -> Result<Option<ReportFormat>, ComprefError> {
    format.map(ReportFormat::parse).transpose()
}

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli, settings: &Settings) -> Result<(), ComprefError> {
    match cli.command {
        Some(Commands::Resolve {
            report,
            format,
            record,
            deterministic: _,
        }) => cmd_resolve(settings, &report, report_format(format.as_deref())?, record),
        Some(Commands::Lookup {
            report,
            format,
            component_ref,
        }) => cmd_lookup(
            settings,
            &report,
            report_format(format.as_deref())?,
            component_ref,
        ),
        Some(Commands::Encode { input, output }) => cmd_encode(settings, &input, &output),
        Some(Commands::Index) => cmd_index(settings),
        Some(Commands::Init { force }) => cmd_init(settings, force),
        None => {
            // No subcommand - list the index by default
            cmd_index(settings)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

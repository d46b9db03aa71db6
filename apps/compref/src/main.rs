//! # Compref - Component Reference Resolution
//!
//! The main binary for compref.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              apps/compref (THE BINARY)              │
//! │                                                     │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  │
//! │  │    CLI      │  │   Config    │  │ Report I/O  │  │
//! │  │   (clap)    │  │   (toml)    │  │ (json, bin) │  │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  │
//! │         └────────────────┼────────────────┘         │
//! │                          ▼                          │
//! │                 ┌────────────────┐                  │
//! │                 │  compref-core  │                  │
//! │                 │  (THE LOGIC)   │                  │
//! │                 └────────────────┘                  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! compref init
//! compref resolve -r report.json --record
//! compref lookup -r report.json --ref 4
//! compref encode -i report.json -o report.bin
//! compref index --json-mode
//! ```

use clap::Parser;
use compref::cli;
use compref::config::{ComprefConfig, LogFormat, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    let settings = ComprefConfig::load(cli.config.as_deref())
        .and_then(|config| config.settings(|name| std::env::var(name).ok(), &cli.overrides()));

    // Logging needs settings; a config error is reported with defaults.
    let log_settings = settings.as_ref().cloned().unwrap_or_else(|_| Settings {
        verbose: cli.verbose,
        ..Settings::default()
    });
    init_tracing(&log_settings);

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::execute(cli, &settings) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the tracing subscriber. Logs go to stderr; stdout is command output.
fn init_tracing(settings: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| settings.default_log_filter().into());

    match settings.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

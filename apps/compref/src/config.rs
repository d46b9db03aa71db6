//! # Configuration
//!
//! Settings come from four layers, highest priority first:
//!
//! 1. Command-line flags
//! 2. Environment (`COMPREF_DATABASE`, `COMPREF_LOG_FORMAT`)
//! 3. TOML file (`--config <path>`, or `compref.toml` if present)
//! 4. Built-in defaults
//!
//! ```toml
//! database = "compref.db"
//! log_format = "json"
//! json_output = false
//! deterministic_ids = false
//! ```

use compref_core::ComprefError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "compref.toml";

/// Index database used when no layer names one.
pub const DEFAULT_DATABASE: &str = "compref.db";

/// Environment variable overriding the index database path.
pub const ENV_DATABASE: &str = "COMPREF_DATABASE";

/// Environment variable selecting the log formatter.
pub const ENV_LOG_FORMAT: &str = "COMPREF_LOG_FORMAT";

// =============================================================================
// LOG FORMAT
// =============================================================================

/// Formatter for diagnostic output on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse a format name (`text` or `json`).
    pub fn parse(value: &str) -> Result<Self, ComprefError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ComprefError::ConfigError(format!(
                "Unknown log format: {}. Use: text, json",
                other
            ))),
        }
    }
}

// =============================================================================
// CONFIG FILE
// =============================================================================

/// Contents of a config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComprefConfig {
    /// Path to the persisted-component index database.
    pub database: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
    /// Print command output as JSON.
    pub json_output: Option<bool>,
    /// Mint name-based identifiers instead of random ones.
    pub deterministic_ids: Option<bool>,
}

impl ComprefConfig {
    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ComprefError> {
        toml::from_str(content)
            .map_err(|e| ComprefError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, ComprefError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ComprefError::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Load the explicit config file, or the default one if it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ComprefError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    tracing::debug!(path = %default_path.display(), "loading default config");
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Layer environment and flags over this file into final settings.
    pub fn settings(
        &self,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Settings, ComprefError> {
        let env_database = env(ENV_DATABASE).filter(|v| !v.is_empty()).map(PathBuf::from);
        let env_log_format = match env(ENV_LOG_FORMAT).filter(|v| !v.is_empty()) {
            Some(value) => Some(LogFormat::parse(&value)?),
            None => None,
        };

        let database = overrides
            .database
            .clone()
            .or(env_database)
            .or_else(|| self.database.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        Ok(Settings {
            database,
            log_format: env_log_format.or(self.log_format).unwrap_or_default(),
            json_output: overrides.json_output || self.json_output.unwrap_or(false),
            deterministic_ids: overrides.deterministic_ids
                || self.deterministic_ids.unwrap_or(false),
            quiet: overrides.quiet,
            verbose: overrides.verbose,
        })
    }
}

/// Values given on the command line.
///
/// Boolean flags can only switch a setting on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub json_output: bool,
    pub deterministic_ids: bool,
    pub quiet: bool,
    pub verbose: bool,
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub log_format: LogFormat,
    pub json_output: bool,
    pub deterministic_ids: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            log_format: LogFormat::Text,
            json_output: false,
            deterministic_ids: false,
            quiet: false,
            verbose: false,
        }
    }
}

impl Settings {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    #[must_use]
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "compref=debug"
        } else {
            "compref=info"
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = ComprefConfig::from_toml("").expect("parse");
        let settings = config.settings(no_env, &Overrides::default()).expect("settings");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn log_format_parse_is_case_insensitive() {
        assert_eq!(LogFormat::parse("JSON").expect("parse"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" text ").expect("parse"), LogFormat::Text);
        assert!(matches!(
            LogFormat::parse("yaml"),
            Err(ComprefError::ConfigError(_))
        ));
    }

    #[test]
    fn verbose_raises_default_filter() {
        let settings = Settings {
            verbose: true,
            ..Settings::default()
        };
        assert_eq!(settings.default_log_filter(), "compref=debug");
        assert_eq!(Settings::default().default_log_filter(), "compref=info");
    }
}

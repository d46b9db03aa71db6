//! # compref
//!
//! Command-line front end for `compref-core`.
//!
//! - [`cli`] - clap command tree and command implementations
//! - [`config`] - layered settings (flags, environment, TOML file)
//! - [`input`] - report file reading (JSON and binary)

pub mod cli;
pub mod config;
pub mod input;

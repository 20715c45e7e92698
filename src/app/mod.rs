//! Application glue module
//!
//! Configuration loading and output formatting for the `ttytype` binary.

mod config;
pub mod output;

pub use config::{CliArgs, Config, ConfigError, OutputFormat};
pub use output::ShellFlavor;

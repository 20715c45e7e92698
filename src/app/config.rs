//! Configuration for ttytype
//!
//! Sources, highest precedence first:
//! - command line flags
//! - environment variables (`TTYTYPE_*`)
//! - TOML config file (`--config`, or `ttytype/config.toml` in the user's
//!   config directory)
//! - built-in defaults

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::probe::{Family, ProbeOptions, UnknownFamily};
use crate::tty::{WindowSize, DEFAULT_DEVICE};

/// Longest inquiry timeout accepted, in milliseconds
const MAX_TIMEOUT_MS: u64 = 60_000;

/// CLI arguments for ttytype
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "ttytype")]
#[command(version)]
#[command(about = "Identify the attached terminal by asking it", long_about = None)]
pub struct CliArgs {
    /// Settle on "unknown" instead of prompting when nothing answers
    #[arg(short = 'a', long)]
    pub assume_unknown: bool,

    /// Prompt for the terminal type before probing
    #[arg(short = 'p', long)]
    pub prompt_first: bool,

    /// Print shell commands setting TERM, LINES and COLUMNS
    #[arg(short = 's', long, conflicts_with = "json")]
    pub shell: bool,

    /// Report the matched family and response on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Only probe one family (hp, ansi or wyse)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub family: Option<String>,

    /// Trace every inquiry and response on stderr
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// Terminal device to probe
    #[arg(short = 'T', long, value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Lines to report when the size cannot be determined
    #[arg(short = 'R', long, value_name = "LINES")]
    pub lines: Option<u16>,

    /// Columns to report when the size cannot be determined
    #[arg(short = 'C', long, value_name = "COLUMNS")]
    pub columns: Option<u16>,

    /// Time allowed for each inquiry to be answered
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to custom config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// What is printed once the probe is done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Just the terminal name
    #[default]
    Name,
    /// Shell assignments for TERM, LINES and COLUMNS
    Shell,
    /// The whole result as a JSON object
    Json,
}

/// Probe configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Terminal device to open
    pub device: PathBuf,
    /// Per-inquiry timeout in milliseconds
    pub timeout_ms: u64,
    /// Fallback screen height
    pub lines: u16,
    /// Fallback screen width
    pub columns: u16,
    /// Settle on "unknown" instead of prompting
    pub assume_unknown: bool,
    /// Prompt before probing
    pub prompt_first: bool,
    /// Only probe this family
    pub family: Option<String>,
    /// Output format
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        let size = WindowSize::default();
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            timeout_ms: 1000,
            lines: size.rows,
            columns: size.cols,
            assume_unknown: false,
            prompt_first: false,
            family: None,
            output: OutputFormat::Name,
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config error in '{field}': {message}")]
    Invalid { field: &'static str, message: String },

    #[error(transparent)]
    Family(#[from] UnknownFamily),
}

impl Config {
    /// Load configuration with full precedence:
    /// CLI args > environment variables > config file > defaults
    pub fn load_with_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            // An explicitly named file has to load
            Some(path) => Self::load_from_file(path)?,
            None => Self::default_config_path()
                .filter(|path| path.exists())
                .and_then(|path| match Self::load_from_file(&path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("Ignoring config file: {}", e);
                        None
                    },
                })
                .unwrap_or_default(),
        };

        config.apply_env_vars();
        config.apply_cli_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ttytype").join("config.toml"))
    }

    fn apply_env_vars(&mut self) {
        self.apply_env(|name| env::var(name).ok());
    }

    /// Apply `TTYTYPE_*` variables as seen through `lookup`.
    ///
    /// Values that do not parse are skipped with a warning.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(name: &str, value: Option<String>) -> Option<T> {
            let value = value?;
            match value.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring {}={:?}: not a number", name, value);
                    None
                },
            }
        }

        if let Some(device) = lookup("TTYTYPE_DEVICE").filter(|v| !v.is_empty()) {
            self.device = PathBuf::from(device);
        }
        if let Some(lines) = parsed("TTYTYPE_LINES", lookup("TTYTYPE_LINES")) {
            self.lines = lines;
        }
        if let Some(columns) = parsed("TTYTYPE_COLUMNS", lookup("TTYTYPE_COLUMNS")) {
            self.columns = columns;
        }
        if let Some(timeout) = parsed("TTYTYPE_TIMEOUT_MS", lookup("TTYTYPE_TIMEOUT_MS")) {
            self.timeout_ms = timeout;
        }
    }

    fn apply_cli_args(&mut self, args: &CliArgs) {
        if let Some(device) = &args.device {
            self.device = device.clone();
        }
        if let Some(lines) = args.lines {
            self.lines = lines;
        }
        if let Some(columns) = args.columns {
            self.columns = columns;
        }
        if let Some(timeout) = args.timeout_ms {
            self.timeout_ms = timeout;
        }
        if let Some(family) = &args.family {
            self.family = Some(family.clone());
        }
        if args.assume_unknown {
            self.assume_unknown = true;
        }
        if args.prompt_first {
            self.prompt_first = true;
        }
        if args.json {
            self.output = OutputFormat::Json;
        } else if args.shell {
            self.output = OutputFormat::Shell;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.device.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "device",
                message: "Device path must not be empty".to_string(),
            });
        }
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid {
                field: "timeout_ms",
                message: format!("Timeout must be between 1 and {} ms", MAX_TIMEOUT_MS),
            });
        }
        if self.lines == 0 {
            return Err(ConfigError::Invalid {
                field: "lines",
                message: "Lines must be at least 1".to_string(),
            });
        }
        if self.columns == 0 {
            return Err(ConfigError::Invalid {
                field: "columns",
                message: "Columns must be at least 1".to_string(),
            });
        }
        self.restrict()?;

        Ok(())
    }

    /// The family probing is limited to, if any
    pub fn restrict(&self) -> Result<Option<Family>, UnknownFamily> {
        self.family.as_deref().map(str::parse).transpose()
    }

    /// Settings for the probe
    pub fn probe_options(&self) -> Result<ProbeOptions, ConfigError> {
        Ok(ProbeOptions {
            assume_unknown: self.assume_unknown,
            prompt_first: self.prompt_first,
            restrict: self.restrict()?,
            deadline: Duration::from_millis(self.timeout_ms),
            default_size: WindowSize::new(self.columns, self.lines),
        })
    }
}

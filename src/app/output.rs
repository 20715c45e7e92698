//! Formatting the probe result for stdout

use std::path::Path;

use super::config::OutputFormat;
use crate::probe::Identification;

/// Syntax used for shell assignments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlavor {
    /// sh, bash, ksh, zsh and anything unrecognised
    Bourne,
    /// csh and tcsh
    CShell,
}

impl ShellFlavor {
    /// Pick the flavor from a login shell path such as `$SHELL`
    pub fn from_shell(shell: Option<&str>) -> Self {
        let name = shell
            .map(Path::new)
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        if name.starts_with("csh") || name.starts_with("tcsh") {
            ShellFlavor::CShell
        } else {
            ShellFlavor::Bourne
        }
    }

    /// Flavor of the user's `$SHELL`
    pub fn detect() -> Self {
        Self::from_shell(std::env::var("SHELL").ok().as_deref())
    }
}

/// Render `ident` in the requested format, newline-terminated
pub fn format(
    ident: &Identification,
    kind: OutputFormat,
    flavor: ShellFlavor,
) -> Result<String, serde_json::Error> {
    match kind {
        OutputFormat::Name => Ok(format!("{}\n", ident.name())),
        OutputFormat::Shell => Ok(shell_assignments(ident, flavor)),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string(ident)?)),
    }
}

/// Assignments of TERM, LINES and COLUMNS
pub fn shell_assignments(ident: &Identification, flavor: ShellFlavor) -> String {
    let lines = ident.lines().unwrap_or_default();
    let columns = ident.columns().unwrap_or_default();

    match flavor {
        ShellFlavor::CShell => format!(
            "setenv TERM {}\nsetenv LINES {}\nsetenv COLUMNS {}\n",
            ident.name(),
            lines,
            columns
        ),
        ShellFlavor::Bourne => format!(
            "TERM='{}'; export TERM;\nLINES={}; export LINES;\nCOLUMNS={}; export COLUMNS;\n",
            ident.name(),
            lines,
            columns
        ),
    }
}

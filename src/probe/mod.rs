//! Terminal identification and geometry probing
//!
//! The probe runs in two phases over one [`Session`]:
//!
//! 1. [`Identifier`] asks each terminal family in turn (Wyse, ANSI/DEC, HP)
//!    to identify itself and matches the answer against that family's
//!    signature table, falling back to asking the user.
//! 2. [`GeometryProber`] measures the screen with the identified family's
//!    cursor inquiries, falling back to the window-size ioctl and finally to
//!    configured defaults.
//!
//! Each probing attempt holds raw mode only for its own exchange.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::tty::{Session, Tty, TtyResult, WindowSize};

mod family;
mod geometry;
mod ident;
pub mod prompt;
pub mod render;
pub mod signature;
mod transceiver;

pub use family::{Family, UnknownFamily};
pub use geometry::{parse_cursor_report, parse_hp_position, Geometry, GeometryProber, GeometrySource};
pub use ident::{Identifier, State};
pub use transceiver::{Response, Transceiver, DEFAULT_DEADLINE, RESPONSE_CAPACITY};

/// Name reported when probing is given up without asking
pub const UNKNOWN_NAME: &str = "unknown";

/// A terminal type name, at most [`TermName::MAX_LEN`] bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TermName(String);

impl TermName {
    pub const MAX_LEN: usize = 40;

    /// Build a name, cutting it to [`TermName::MAX_LEN`] bytes
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(Self::MAX_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        Self(name[..end].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TermName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the probe found out about the terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identification {
    identified: bool,
    family: Family,
    name: TermName,
    lines: Option<u16>,
    columns: Option<u16>,
}

impl Identification {
    pub(crate) fn identified(family: Family, name: TermName) -> Self {
        Self {
            identified: true,
            family,
            name,
            lines: None,
            columns: None,
        }
    }

    pub(crate) fn defaulted(name: &str) -> Self {
        Self {
            identified: false,
            family: Family::Unknown,
            name: TermName::new(name),
            lines: None,
            columns: None,
        }
    }

    pub(crate) fn with_geometry(self, geometry: Geometry) -> Self {
        Self {
            lines: Some(geometry.lines),
            columns: Some(geometry.columns),
            ..self
        }
    }

    /// Whether the terminal (or the user) named the terminal type
    pub fn is_identified(&self) -> bool {
        self.identified
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn name(&self) -> &TermName {
        &self.name
    }

    pub fn lines(&self) -> Option<u16> {
        self.lines
    }

    pub fn columns(&self) -> Option<u16> {
        self.columns
    }
}

/// Settings for one probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Settle on "unknown" instead of prompting when nothing answers
    pub assume_unknown: bool,
    /// Ask the user first and only probe if the answer is empty
    pub prompt_first: bool,
    /// Only probe this family
    pub restrict: Option<Family>,
    /// Time each inquiry is given to be answered
    pub deadline: Duration,
    /// Size used when neither the terminal nor the driver report one
    pub default_size: WindowSize,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            assume_unknown: false,
            prompt_first: false,
            restrict: None,
            deadline: DEFAULT_DEADLINE,
            default_size: WindowSize::default(),
        }
    }
}

/// Identify the terminal, then measure it.
///
/// Only device failures are errors; a terminal that answers nothing still
/// yields a name and a size.
pub fn run<T: Tty>(session: &mut Session<T>, options: &ProbeOptions) -> TtyResult<Identification> {
    let transceiver = Transceiver::new(options.deadline);

    let ident = Identifier::new(transceiver, options).identify(session)?;
    let geometry = GeometryProber::new(transceiver, options.default_size).probe(session, ident.family())?;

    Ok(ident.with_geometry(geometry))
}

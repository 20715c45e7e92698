//! Screen size discovery
//!
//! Stages, first usable answer wins:
//!
//! 1. Ask the terminal: move the cursor as far as it will go and read the
//!    position back (ANSI and HP only).
//! 2. Ask the terminal driver (TIOCGWINSZ).
//! 3. Use the configured defaults.

use serde::Serialize;

use crate::tty::{Session, Tty, TtyResult, WindowSize};

use super::render::render;
use super::transceiver::{Transceiver, RESPONSE_CAPACITY};
use super::Family;

/// DECSC, CUP 999;999, CPR request, DECRC
const ANSI_SIZE_QUERY: &[u8] = b"\x1b7\x1b[999;999H\x1b[6n\x1b8";

/// HP: report cursor position
const HP_CURSOR_QUERY: &[u8] = b"\x1b`";

/// HP: move to the furthest addressable position, then report it
const HP_SIZE_QUERY: &[u8] = b"\x1b&a999c999Y\x1b`";

/// Where a size came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometrySource {
    Terminal,
    System,
    Default,
}

/// Screen size in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub lines: u16,
    pub columns: u16,
    pub source: GeometrySource,
}

impl Geometry {
    fn from_size(size: WindowSize, source: GeometrySource) -> Self {
        Self {
            lines: size.rows,
            columns: size.cols,
            source,
        }
    }
}

/// Measures the screen for an identified family
pub struct GeometryProber {
    transceiver: Transceiver,
    defaults: WindowSize,
}

impl GeometryProber {
    pub fn new(transceiver: Transceiver, defaults: WindowSize) -> Self {
        Self {
            transceiver,
            defaults,
        }
    }

    /// Determine the screen size; always produces concrete values
    pub fn probe<T: Tty>(&self, session: &mut Session<T>, family: Family) -> TtyResult<Geometry> {
        session.check_termination()?;

        let measured = match family {
            Family::Ansi => self.probe_ansi(session)?,
            Family::Hp => self.probe_hp(session)?,
            Family::Wyse | Family::Unknown => None,
        };

        let geometry = if let Some(size) = measured {
            Geometry::from_size(size, GeometrySource::Terminal)
        } else if let Some(size) = session.tty().window_size().filter(WindowSize::is_usable) {
            tracing::debug!("ioctl reports {} lines, {} columns", size.rows, size.cols);
            Geometry::from_size(size, GeometrySource::System)
        } else {
            Geometry::from_size(self.defaults, GeometrySource::Default)
        };

        tracing::info!(
            "COLUMNS={}; LINES={} ({:?})",
            geometry.columns,
            geometry.lines,
            geometry.source
        );
        Ok(geometry)
    }

    fn probe_ansi<T: Tty>(&self, session: &mut Session<T>) -> TtyResult<Option<WindowSize>> {
        let mut scope = session.raw()?;
        scope.check_termination()?;
        let report = self
            .transceiver
            .transact(&mut scope, ANSI_SIZE_QUERY, RESPONSE_CAPACITY)?;
        scope.close()?;

        let size = parse_cursor_report(report.bytes()).map(|(row, col)| WindowSize::new(col, row));
        match size {
            Some(size) => tracing::debug!("ANSI reports size as {} lines, {} columns", size.rows, size.cols),
            None => tracing::debug!("no usable cursor report in \"{}\"", render(report.bytes())),
        }
        Ok(size)
    }

    fn probe_hp<T: Tty>(&self, session: &mut Session<T>) -> TtyResult<Option<WindowSize>> {
        let mut scope = session.raw()?;

        scope.check_termination()?;
        let origin = self
            .transceiver
            .transact(&mut scope, HP_CURSOR_QUERY, RESPONSE_CAPACITY)?;
        let origin = parse_hp_position(origin.bytes());

        scope.check_termination()?;
        let extent = self
            .transceiver
            .transact(&mut scope, HP_SIZE_QUERY, RESPONSE_CAPACITY)?;

        // Put the cursor back where it was
        if let Some((col, row)) = origin {
            scope.tty_mut().send(format!("\x1b&a{}c{}Y", col, row).as_bytes())?;
        }
        scope.close()?;

        // Positions are zero-based offsets of the last cell
        let size = parse_hp_position(extent.bytes())
            .and_then(|(col, row)| Some(WindowSize::new(col.checked_add(1)?, row.checked_add(1)?)));
        match size {
            Some(size) => tracing::debug!("HP reports size as {} lines, {} columns", size.rows, size.cols),
            None => tracing::debug!("no usable HP position in \"{}\"", render(extent.bytes())),
        }
        Ok(size)
    }
}

/// Leading decimal number of `bytes` and the rest
fn parse_number(bytes: &[u8]) -> Option<(u16, &[u8])> {
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let value = std::str::from_utf8(&bytes[..digits]).ok()?.parse().ok()?;
    Some((value, &bytes[digits..]))
}

/// Parse a cursor-position report `ESC [ <row> ; <col> R` into one-based
/// `(row, col)`. Anything before the report (an echoed DA answer, say) is
/// skipped.
pub fn parse_cursor_report(bytes: &[u8]) -> Option<(u16, u16)> {
    let parse_at = |start: usize| -> Option<(u16, u16)> {
        let rest = bytes[start..].strip_prefix(b"\x1b[")?;
        let (row, rest) = parse_number(rest)?;
        let rest = rest.strip_prefix(b";")?;
        let (col, rest) = parse_number(rest)?;
        rest.strip_prefix(b"R")?;
        (row > 0 && col > 0).then_some((row, col))
    };

    (0..bytes.len())
        .filter(|&i| bytes[i] == 0x1b)
        .find_map(parse_at)
}

/// Parse an HP cursor position `ESC & a <col> c <row> Y` into zero-based
/// `(col, row)`
pub fn parse_hp_position(bytes: &[u8]) -> Option<(u16, u16)> {
    let rest = bytes.strip_prefix(b"\x1b&a")?;
    let (col, rest) = parse_number(rest)?;
    let rest = rest.strip_prefix(b"c")?;
    let (row, _) = parse_number(rest)?;
    Some((col, row))
}

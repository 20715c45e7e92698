//! Terminal families and their inquiry dialects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::signature::{self, Signature};

/// Wyse: read terminal ID
const WYSE_ID: &[u8] = b"\x1b ";
/// DEC: primary device attributes (DA)
const DEC_DA: &[u8] = b"\x1b[0c";
/// DEC: identify terminal (DECID), for VT5x and older VT100s
const DEC_ID: &[u8] = b"\x1bZ";
/// HP: terminal ID request
const HP_ID: &[u8] = b"\x1b*s1^";

/// A group of terminals sharing an inquiry/response dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Wyse,
    Ansi,
    Hp,
    Unknown,
}

impl Family {
    /// Families in the order they are probed
    pub const PROBE_ORDER: [Family; 3] = [Family::Wyse, Family::Ansi, Family::Hp];

    /// Inquiries to send, in order; later ones are only tried when earlier
    /// ones get no answer at all.
    ///
    /// DA goes before DECID so a terminal that understands both only answers
    /// once.
    pub fn inquiries(self) -> &'static [&'static [u8]] {
        match self {
            Family::Wyse => &[WYSE_ID],
            Family::Ansi => &[DEC_DA, DEC_ID],
            Family::Hp => &[HP_ID],
            Family::Unknown => &[],
        }
    }

    /// Known answers for this family
    pub fn signatures(self) -> &'static [Signature] {
        match self {
            Family::Wyse => signature::WYSE,
            Family::Ansi => signature::ANSI,
            Family::Hp => signature::HP,
            Family::Unknown => &[],
        }
    }

    /// Name used in diagnostics
    pub fn label(self) -> &'static str {
        match self {
            Family::Wyse => "WYSE",
            Family::Ansi => "ANSI",
            Family::Hp => "HP",
            Family::Unknown => "unknown",
        }
    }

    /// Families visited when probing is limited to `restrict`
    pub fn probe_order(restrict: Option<Family>) -> impl Iterator<Item = Family> {
        Self::PROBE_ORDER
            .into_iter()
            .filter(move |f| restrict.map_or(true, |r| r == *f))
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::Wyse => "wyse",
            Family::Ansi => "ansi",
            Family::Hp => "hp",
            Family::Unknown => "unknown",
        })
    }
}

/// Error returned when a restriction names no known family
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown terminal type '{0}' (expected hp, ansi or wyse)")]
pub struct UnknownFamily(pub String);

impl FromStr for Family {
    type Err = UnknownFamily;

    /// Accepts any word starting with `hp`, `ansi` or `wyse` (so `hp2392` or
    /// `ansi-vt100` select their family), ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("hp") {
            Ok(Family::Hp)
        } else if lower.starts_with("ansi") {
            Ok(Family::Ansi)
        } else if lower.starts_with("wyse") {
            Ok(Family::Wyse)
        } else {
            Err(UnknownFamily(s.to_string()))
        }
    }
}

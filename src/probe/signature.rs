//! Signature tables and prefix matching
//!
//! A signature is the fixed leading part of a terminal's answer to an
//! inquiry. Tables are ordered: the first entry whose whole signature is a
//! prefix of the answer wins, so more specific entries are listed before the
//! shorter ones they extend.

/// One known answer and the terminal name it identifies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Leading bytes of the answer (may contain NUL)
    pub bytes: &'static [u8],
    /// Canonical terminal name
    pub name: &'static str,
}

impl Signature {
    pub const fn new(bytes: &'static [u8], name: &'static str) -> Self {
        Self { bytes, name }
    }

    /// Whether `response` starts with this signature
    pub fn matches(&self, response: &[u8]) -> bool {
        response.starts_with(self.bytes)
    }
}

/// Result of a successful table lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub name: &'static str,
    /// Number of response bytes covered by the signature
    pub len: usize,
    /// Position of the winning entry in its table
    pub index: usize,
}

/// Find the first entry of `table` that `response` starts with
pub fn find(response: &[u8], table: &[Signature]) -> Option<Match> {
    table
        .iter()
        .enumerate()
        .find(|(_, sig)| sig.matches(response))
        .map(|(index, sig)| Match {
            name: sig.name,
            len: sig.bytes.len(),
            index,
        })
}

/// Pairs `(earlier, later)` where the later entry can never match because the
/// earlier one is a prefix of it
pub fn shadowed(table: &[Signature]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, earlier) in table.iter().enumerate() {
        for (j, later) in table.iter().enumerate().skip(i + 1) {
            if later.bytes.starts_with(earlier.bytes) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// DEC and ANSI terminals: DECID answers (VT5x) and primary DA answers.
///
/// Newer models are reported as the base of their class (a VT525 answers
/// like a VT510); DA strings are too alike within a class to go further.
pub static ANSI: &[Signature] = &[
    // VT5x, answering DECID with ESC / <model>
    Signature::new(b"\x1b/A", "vt50"),
    Signature::new(b"\x1b/C", "vt55"),
    Signature::new(b"\x1b/H", "vt50h"),
    Signature::new(b"\x1b/J", "vt50h"),
    Signature::new(b"\x1b/K", "vt52"),
    Signature::new(b"\x1b/L", "vt52"),
    // VT100 and VT101, one answer per option set
    Signature::new(b"\x1b[?1;0c", "vt100"),
    Signature::new(b"\x1b[?1;1c", "vt100"),
    Signature::new(b"\x1b[?1;2c", "vt100"),
    Signature::new(b"\x1b[?1;3c", "vt100"),
    Signature::new(b"\x1b[?1;4c", "vt100"),
    Signature::new(b"\x1b[?1;5c", "vt100"),
    Signature::new(b"\x1b[?1;6c", "vt100"),
    Signature::new(b"\x1b[?1;7c", "vt100"),
    Signature::new(b"\x1b[?6c", "vt102"),
    Signature::new(b"\x1b[?62;", "vt220"),
    Signature::new(b"\x1b[?63;", "vt320"),
    Signature::new(b"\x1b[?64;", "vt420"),
    Signature::new(b"\x1b[?65;", "vt510"),
    // Any other VT52-compatible DECID answer
    Signature::new(b"\x1b/", "vt52"),
];

/// Wyse terminals: answers to the terminal ID inquiry
pub static WYSE: &[Signature] = &[
    Signature::new(b"325", "wy325"),
    Signature::new(b"370", "wy370"),
    Signature::new(b"160", "wy160"),
    Signature::new(b"150", "wy150"),
    Signature::new(b"120", "wy120"),
    Signature::new(b"99", "wy99gt"),
    Signature::new(b"85", "wy85"),
    Signature::new(b"75", "wy75"),
    Signature::new(b"60", "wy60"),
    Signature::new(b"50", "wy50"),
    Signature::new(b"30", "wy30"),
];

/// HP terminals: answers to the terminal ID request
pub static HP: &[Signature] = &[
    Signature::new(b"2392A", "hp2392"),
    Signature::new(b"2397A", "hp2397a"),
    Signature::new(b"2621", "hp2621"),
    Signature::new(b"2622", "hp2622"),
    Signature::new(b"2623", "hp2623"),
    Signature::new(b"2624", "hp2624"),
    Signature::new(b"2626", "hp2626"),
    Signature::new(b"2627", "hp2627a"),
    Signature::new(b"2628", "hp2628"),
    Signature::new(b"2640", "hp2640b"),
    Signature::new(b"2645", "hp2645"),
    Signature::new(b"2648", "hp2648"),
    Signature::new(b"70092", "hp70092"),
    Signature::new(b"70094", "hp70094"),
    Signature::new(b"70096", "hp70096"),
];

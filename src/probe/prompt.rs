//! Asking the user for the terminal type

use crate::tty::{Session, Tty, TtyResult};

use super::TermName;

/// Prompt used before probing in prompt-first mode
pub const PROMPT: &str = "TERM = ";

/// Prompt used when probing found nothing
pub const FALLBACK_PROMPT: &str = "TERM = (vt100) ";

/// Name used when the fallback prompt gets an empty answer
pub const FALLBACK_NAME: &str = "vt100";

/// Keep the alphanumeric characters of a typed line.
///
/// Returns `None` when nothing usable was typed.
pub fn parse_reply(line: &[u8]) -> Option<TermName> {
    let name: String = line
        .iter()
        .filter(|b| b.is_ascii_alphanumeric())
        .map(|&b| char::from(b))
        .take(TermName::MAX_LEN)
        .collect();

    if name.is_empty() {
        None
    } else {
        Some(TermName::new(&name))
    }
}

/// Show `prompt` on the terminal and read a name in cooked mode.
///
/// Blocks until the user ends the line.
pub fn ask<T: Tty>(session: &mut Session<T>, prompt: &str) -> TtyResult<Option<TermName>> {
    session.restore()?;

    let tty = session.tty_mut();
    tty.send(prompt.as_bytes())?;
    let line = tty.read_line()?;

    Ok(parse_reply(&line))
}

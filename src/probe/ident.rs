//! Identification state machine
//!
//! ```text
//! Unidentified -> Probing(Wyse) -> Probing(Ansi) -> Probing(Hp) -> PromptForManual
//!        |              |               |                |              |
//!        +--------------+---------------+----------------+--> Identified / Defaulted
//! ```
//!
//! A family whose inquiries go unanswered, or whose answer matches nothing in
//! its table, hands over to the next one. The first match ends the search.

use crate::tty::{Session, Tty, TtyResult};

use super::prompt::{self, FALLBACK_NAME, FALLBACK_PROMPT, PROMPT};
use super::render::render;
use super::signature;
use super::transceiver::{Transceiver, RESPONSE_CAPACITY};
use super::{Family, Identification, ProbeOptions, TermName, UNKNOWN_NAME};

/// Where the identification currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unidentified,
    Probing(Family),
    PromptForManual,
    Identified,
    Defaulted,
}

/// Runs the identification state machine over a session
pub struct Identifier<'a> {
    transceiver: Transceiver,
    options: &'a ProbeOptions,
}

impl<'a> Identifier<'a> {
    pub fn new(transceiver: Transceiver, options: &'a ProbeOptions) -> Self {
        Self {
            transceiver,
            options,
        }
    }

    /// Settle on a terminal name.
    ///
    /// Fails before any inquiry is sent if the terminal attributes cannot be
    /// read.
    pub fn identify<T: Tty>(&self, session: &mut Session<T>) -> TtyResult<Identification> {
        session.tty().attrs()?;

        let mut families = Family::probe_order(self.options.restrict);
        let mut state = State::Unidentified;
        let mut settled = None;

        loop {
            let next = match state {
                State::Unidentified => match self.ask_first(session)? {
                    Some(name) => {
                        tracing::info!("terminal type given as \"{}\"", name);
                        settled = Some(Identification::identified(Family::Unknown, name));
                        State::Identified
                    },
                    None => self.after_probing(families.next()),
                },
                State::Probing(family) => {
                    session.check_termination()?;
                    match self.probe_family(session, family)? {
                        Some(ident) => {
                            settled = Some(ident);
                            State::Identified
                        },
                        None => self.after_probing(families.next()),
                    }
                },
                State::PromptForManual => match prompt::ask(session, FALLBACK_PROMPT)? {
                    Some(name) => {
                        tracing::info!("manual terminal response is \"{}\"", name);
                        settled = Some(Identification::identified(Family::Unknown, name));
                        State::Identified
                    },
                    None => {
                        settled = Some(Identification::defaulted(FALLBACK_NAME));
                        State::Defaulted
                    },
                },
                State::Identified | State::Defaulted => {
                    return Ok(settled.unwrap_or_else(|| Identification::defaulted(UNKNOWN_NAME)));
                },
            };

            tracing::debug!("{:?} -> {:?}", state, next);
            state = next;
        }
    }

    fn ask_first<T: Tty>(&self, session: &mut Session<T>) -> TtyResult<Option<TermName>> {
        if self.options.prompt_first {
            prompt::ask(session, PROMPT)
        } else {
            Ok(None)
        }
    }

    fn after_probing(&self, next: Option<Family>) -> State {
        match next {
            Some(family) => State::Probing(family),
            None if self.options.assume_unknown => State::Defaulted,
            None => State::PromptForManual,
        }
    }

    /// One probing attempt: a single raw-mode scope covering the family's
    /// inquiries.
    fn probe_family<T: Tty>(
        &self,
        session: &mut Session<T>,
        family: Family,
    ) -> TtyResult<Option<Identification>> {
        let mut scope = session.raw()?;

        let mut answer = None;
        for inquiry in family.inquiries() {
            scope.check_termination()?;
            let response = self.transceiver.transact(&mut scope, inquiry, RESPONSE_CAPACITY)?;
            if !response.is_empty() {
                answer = Some(response);
                break;
            }
            tracing::debug!("no {} answer to \"{}\"", family.label(), render(inquiry));
        }

        scope.close()?;

        let Some(response) = answer else {
            return Ok(None);
        };
        if response.is_full() {
            tracing::debug!("{} answer filled the buffer and may be cut short", family.label());
        }

        match signature::find(response.bytes(), family.signatures()) {
            Some(m) => {
                tracing::info!(
                    "{} terminal response \"{}\" mapped to \"{}\"",
                    family.label(),
                    render(response.bytes()),
                    m.name
                );
                Ok(Some(Identification::identified(family, TermName::new(m.name))))
            },
            None => {
                tracing::info!(
                    "{} terminal response \"{}\" not recognised",
                    family.label(),
                    render(response.bytes())
                );
                Ok(None)
            },
        }
    }
}

//! Cooked/raw mode switching
//!
//! A [`Session`] owns the terminal and remembers the attributes it found
//! there. Raw mode is only ever entered through a [`RawScope`], which puts the
//! saved attributes back when it goes out of scope, so every way out of a
//! probe (success, no answer, I/O error, unwinding on a termination signal)
//! leaves the terminal cooked.

use std::ops::{Deref, DerefMut};

use super::{Apply, Tty, TtyError, TtyResult};

/// Line discipline state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Cooked,
    Raw,
}

/// A terminal together with its saved cooked-mode attributes
pub struct Session<T: Tty> {
    tty: T,
    saved: Option<T::Attrs>,
    mode: Mode,
}

impl<T: Tty> Session<T> {
    /// Wrap a terminal that is currently in its normal (cooked) state
    pub fn new(tty: T) -> Self {
        Self {
            tty,
            saved: None,
            mode: Mode::Cooked,
        }
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The underlying device
    pub fn tty(&self) -> &T {
        &self.tty
    }

    /// The underlying device, mutably
    pub fn tty_mut(&mut self) -> &mut T {
        &mut self.tty
    }

    /// Save the current attributes and switch to raw mode.
    ///
    /// Does nothing if the session is already raw.
    pub fn enter_raw(&mut self) -> TtyResult<()> {
        if self.mode == Mode::Raw {
            return Ok(());
        }

        let cooked = self.tty.attrs()?;
        let raw = T::make_raw(&cooked);

        self.tty.discard_input()?;
        self.tty.set_attrs(&raw, Apply::Now)?;

        self.saved = Some(cooked);
        self.mode = Mode::Raw;
        tracing::trace!("Terminal switched to raw mode");
        Ok(())
    }

    /// Put back the attributes saved by [`Session::enter_raw`].
    ///
    /// Does nothing if the session is already cooked. If the restore fails
    /// the session stays marked raw so a later call can retry.
    pub fn restore(&mut self) -> TtyResult<()> {
        if self.mode == Mode::Cooked {
            return Ok(());
        }

        if let Some(saved) = &self.saved {
            self.tty.set_attrs(saved, Apply::Flush)?;
        }
        self.tty.discard_input()?;

        self.saved = None;
        self.mode = Mode::Cooked;
        tracing::trace!("Terminal attributes restored");
        Ok(())
    }

    /// Enter raw mode for the lifetime of the returned scope
    pub fn raw(&mut self) -> TtyResult<RawScope<'_, T>> {
        self.enter_raw()?;
        Ok(RawScope { session: self })
    }

    /// Fail if a termination signal has arrived
    pub fn check_termination(&self) -> TtyResult<()> {
        match self.tty.pending_termination() {
            Some(signal) => Err(TtyError::Terminated(signal)),
            None => Ok(()),
        }
    }
}

impl<T: Tty> Drop for Session<T> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::error!("Failed to restore terminal: {}", e);
        }
    }
}

/// Raw mode held for one probing attempt
pub struct RawScope<'a, T: Tty> {
    session: &'a mut Session<T>,
}

impl<T: Tty> RawScope<'_, T> {
    /// Leave raw mode now, reporting a failed restore
    pub fn close(mut self) -> TtyResult<()> {
        self.session.restore()
    }
}

impl<T: Tty> Deref for RawScope<'_, T> {
    type Target = Session<T>;

    fn deref(&self) -> &Session<T> {
        self.session
    }
}

impl<T: Tty> DerefMut for RawScope<'_, T> {
    fn deref_mut(&mut self) -> &mut Session<T> {
        self.session
    }
}

impl<T: Tty> Drop for RawScope<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.session.restore() {
            tracing::error!("Failed to restore terminal: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTty;

    #[test]
    fn test_scope_restores_attributes() {
        let mut session = Session::new(ScriptedTty::new());
        let before = session.tty().current_attrs();

        {
            let scope = session.raw().expect("Failed to enter raw mode");
            assert_eq!(scope.mode(), Mode::Raw);
            assert!(scope.tty().current_attrs().raw);
        }

        assert_eq!(session.mode(), Mode::Cooked);
        assert_eq!(session.tty().current_attrs(), before);
        assert_eq!(session.tty().raw_entries(), 1);
        assert_eq!(session.tty().raw_exits(), 1);
    }

    #[test]
    fn test_enter_and_restore_are_idempotent() {
        let mut session = Session::new(ScriptedTty::new());

        session.restore().expect("restore while cooked");
        assert_eq!(session.tty().raw_exits(), 0);

        session.enter_raw().expect("first entry");
        session.enter_raw().expect("second entry");
        assert_eq!(session.tty().raw_entries(), 1);

        session.restore().expect("first restore");
        session.restore().expect("second restore");
        assert_eq!(session.tty().raw_exits(), 1);
    }

    #[test]
    fn test_get_attrs_failure_leaves_session_cooked() {
        let mut tty = ScriptedTty::new();
        tty.fail_get_attrs();
        let mut session = Session::new(tty);

        let err = session.raw().err().expect("entry should fail");
        assert!(matches!(err, TtyError::GetAttrs(_)));
        assert_eq!(session.mode(), Mode::Cooked);
        assert_eq!(session.tty().raw_entries(), 0);
    }

    #[test]
    fn test_failed_restore_is_retried_on_drop() {
        let mut session = Session::new(ScriptedTty::new());
        session.enter_raw().expect("entry");

        session.tty_mut().fail_next_set_attrs();
        assert!(session.restore().is_err());
        assert_eq!(session.mode(), Mode::Raw);

        session.restore().expect("retry");
        assert_eq!(session.mode(), Mode::Cooked);
        assert!(!session.tty().current_attrs().raw);
    }

    #[test]
    fn test_close_reports_restore() {
        let mut session = Session::new(ScriptedTty::new());
        let scope = session.raw().expect("entry");
        scope.close().expect("close");
        assert_eq!(session.tty().raw_exits(), 1);
    }

    #[test]
    fn test_close_failure_is_reported_then_retried_on_drop() {
        let mut session = Session::new(ScriptedTty::new());
        let mut scope = session.raw().expect("entry");
        scope.tty_mut().fail_next_set_attrs();

        let err = scope.close().err().expect("close should fail");
        assert!(matches!(err, TtyError::SetAttrs(_)));
        assert_eq!(session.mode(), Mode::Cooked);
        assert_eq!(session.tty().raw_exits(), 1);
    }
}

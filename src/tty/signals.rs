//! Signal handling while the terminal may be in raw mode
//!
//! Handlers are installed without `SA_RESTART`, so a signal that arrives
//! during a timed wait or the prompt read interrupts the system call. The
//! signal is recorded so the prober can unwind and restore the terminal
//! before the process exits.

use std::sync::atomic::{AtomicI32, Ordering};

use nix::libc;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use super::{TtyError, TtyResult};

/// Signals that end the process once the terminal has been restored
const TERMINATING: [Signal; 4] = [
    Signal::SIGINT,
    Signal::SIGTERM,
    Signal::SIGHUP,
    Signal::SIGQUIT,
];

static PENDING: AtomicI32 = AtomicI32::new(0);

extern "C" fn record_termination(signum: libc::c_int) {
    PENDING.store(signum, Ordering::SeqCst);
}

/// Termination signal received since the handlers were installed, if any
pub fn pending_termination() -> Option<i32> {
    match PENDING.load(Ordering::SeqCst) {
        0 => None,
        signum => Some(signum),
    }
}

/// Installed handlers; the previous dispositions come back on drop
pub struct SignalGuard {
    previous: Vec<(Signal, SigAction)>,
}

impl SignalGuard {
    /// Install the handlers for the lifetime of the returned guard
    pub fn install() -> TtyResult<Self> {
        let mut guard = SignalGuard {
            previous: Vec::with_capacity(TERMINATING.len()),
        };

        let handler = SigHandler::Handler(record_termination);
        for signal in TERMINATING {
            let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
            // SAFETY: the handler only touches an atomic, which is async-signal-safe
            let old = unsafe { sigaction(signal, &action) }.map_err(TtyError::SignalHandler)?;
            guard.previous.push((signal, old));
        }

        Ok(guard)
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        for (signal, old) in self.previous.drain(..).rev() {
            // SAFETY: restoring a disposition previously returned by sigaction
            if let Err(e) = unsafe { sigaction(signal, &old) } {
                tracing::warn!("Failed to restore handler for {}: {}", signal, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_and_restore() {
        let guard = SignalGuard::install().expect("Failed to install handlers");
        assert_eq!(guard.previous.len(), TERMINATING.len());
        drop(guard);
    }
}

//! Terminal device handling
//!
//! This module wraps the controlling terminal: opening and validating the
//! device, switching it between cooked and raw mode, timed reads, and the
//! window-size ioctl. The probing code only talks to the [`Tty`] trait so it
//! can be driven by a scripted device in tests.

use std::path::PathBuf;
use std::time::Duration;

mod console;
mod mode;
pub mod signals;

pub use console::{Console, DEFAULT_DEVICE, MAX_LINE};
pub use mode::{Mode, RawScope, Session};

/// Error type for terminal device operations
#[derive(Debug, thiserror::Error)]
pub enum TtyError {
    #[error("Could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a terminal")]
    NotATerminal(PathBuf),

    #[error("Failed to get terminal attributes: {0}")]
    GetAttrs(#[source] nix::Error),

    #[error("Failed to set terminal attributes: {0}")]
    SetAttrs(#[source] nix::Error),

    #[error("Failed to flush terminal input: {0}")]
    FlushInput(#[source] nix::Error),

    #[error("Failed to write to terminal: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to read from terminal: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to poll terminal: {0}")]
    Poll(#[source] nix::Error),

    #[error("Failed to install signal handler: {0}")]
    SignalHandler(#[source] nix::Error),

    #[error("Terminated by signal {0}")]
    Terminated(i32),
}

/// Result type for terminal device operations
pub type TtyResult<T> = Result<T, TtyError>;

/// How a new set of attributes is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apply {
    /// Immediately (TCSANOW)
    Now,
    /// After pending output drains, discarding pending input (TCSAFLUSH)
    Flush,
}

/// Window size reported by the terminal driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub rows: u16,
    pub cols: u16,
}

impl WindowSize {
    /// Create a new window size with rows and columns
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { rows, cols }
    }

    /// A size with a zero extent carries no information
    pub fn is_usable(&self) -> bool {
        self.rows > 0 && self.cols > 0
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

/// A byte-oriented duplex terminal line.
///
/// Implementations must not buffer writes: [`Tty::send`] returns only after
/// the bytes have been handed to the driver.
pub trait Tty {
    /// Saved line discipline settings
    type Attrs: Clone;

    /// Read the current attributes
    fn attrs(&self) -> TtyResult<Self::Attrs>;

    /// Apply a set of attributes
    fn set_attrs(&mut self, attrs: &Self::Attrs, when: Apply) -> TtyResult<()>;

    /// Derive the raw-mode variant of `cooked`
    fn make_raw(cooked: &Self::Attrs) -> Self::Attrs;

    /// Discard any input received but not yet read
    fn discard_input(&mut self) -> TtyResult<()>;

    /// Write `bytes` and flush them to the device
    fn send(&mut self, bytes: &[u8]) -> TtyResult<()>;

    /// Wait up to `timeout` for input.
    ///
    /// Returns false on timeout and when the wait is cut short by a signal.
    fn wait_readable(&mut self, timeout: Duration) -> TtyResult<bool>;

    /// Read whatever is available, up to `buf.len()` bytes
    fn read_available(&mut self, buf: &mut [u8]) -> TtyResult<usize>;

    /// Window size known to the terminal driver, if any
    fn window_size(&self) -> Option<WindowSize>;

    /// Blocking read of one line of cooked input, without the newline.
    ///
    /// At most [`MAX_LINE`] bytes are kept; the rest of the line is
    /// discarded. Fails with [`TtyError::Terminated`] once a termination
    /// signal has been recorded.
    fn read_line(&mut self) -> TtyResult<Vec<u8>>;

    /// Termination signal recorded for this process, if any
    fn pending_termination(&self) -> Option<i32> {
        signals::pending_termination()
    }
}

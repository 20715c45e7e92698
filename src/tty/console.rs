//! The real terminal device
//!
//! Implements [`Tty`] on top of a file descriptor opened against a terminal
//! device, using termios for mode switching and poll(2) for timed reads.

use std::fs::{File, OpenOptions};
use std::io::{IsTerminal, Read, Write};
use std::os::fd::{AsFd, AsRawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nix::errno::Errno;
use nix::libc;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{
    self, ControlFlags, FlushArg, InputFlags, LocalFlags, OutputFlags, SetArg,
    SpecialCharacterIndices, Termios,
};

use super::{signals, Apply, Tty, TtyError, TtyResult, WindowSize};

/// Device used when nothing else is configured or the configured one fails
pub const DEFAULT_DEVICE: &str = "/dev/tty";

/// Longest prompt line kept by [`Tty::read_line`]
pub const MAX_LINE: usize = 160;

/// An open terminal device
pub struct Console {
    file: File,
    path: PathBuf,
}

impl Console {
    /// Open `path` read-write and check that it is a terminal
    pub fn open(path: impl AsRef<Path>) -> TtyResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)
            .map_err(|source| TtyError::Open {
                path: path.clone(),
                source,
            })?;

        if !file.is_terminal() {
            return Err(TtyError::NotATerminal(path));
        }

        tracing::debug!("Opened terminal device {}", path.display());
        Ok(Self { file, path })
    }

    /// Open `path`, falling back to [`DEFAULT_DEVICE`] if it cannot be opened
    pub fn open_with_fallback(path: impl AsRef<Path>) -> TtyResult<Self> {
        let path = path.as_ref();
        match Self::open(path) {
            Err(e @ TtyError::Open { .. }) if path != Path::new(DEFAULT_DEVICE) => {
                tracing::warn!("{}; trying {}", e, DEFAULT_DEVICE);
                Self::open(DEFAULT_DEVICE)
            },
            other => other,
        }
    }

    /// Path the device was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Tty for Console {
    type Attrs = Termios;

    fn attrs(&self) -> TtyResult<Termios> {
        termios::tcgetattr(self.file.as_fd()).map_err(TtyError::GetAttrs)
    }

    fn set_attrs(&mut self, attrs: &Termios, when: Apply) -> TtyResult<()> {
        let arg = match when {
            Apply::Now => SetArg::TCSANOW,
            Apply::Flush => SetArg::TCSAFLUSH,
        };
        termios::tcsetattr(self.file.as_fd(), arg, attrs).map_err(TtyError::SetAttrs)
    }

    fn make_raw(cooked: &Termios) -> Termios {
        let mut raw = cooked.clone();

        // No break signal, CR translation, parity check, stripping or flow control
        raw.input_flags.remove(
            InputFlags::BRKINT
                | InputFlags::ICRNL
                | InputFlags::INPCK
                | InputFlags::ISTRIP
                | InputFlags::IXON,
        );

        // No output post-processing
        raw.output_flags.remove(OutputFlags::OPOST);

        // 8-bit characters, no parity
        raw.control_flags.remove(ControlFlags::CSIZE | ControlFlags::PARENB);
        raw.control_flags.insert(ControlFlags::CS8);

        // No echo, canonical mode, extended functions or signal characters
        raw.local_flags
            .remove(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN | LocalFlags::ISIG);

        // Return after one byte, no inter-byte timer
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        raw
    }

    fn discard_input(&mut self) -> TtyResult<()> {
        termios::tcflush(self.file.as_fd(), FlushArg::TCIFLUSH).map_err(TtyError::FlushInput)
    }

    fn send(&mut self, bytes: &[u8]) -> TtyResult<()> {
        self.file.write_all(bytes).map_err(TtyError::Write)?;
        self.file.flush().map_err(TtyError::Write)
    }

    fn wait_readable(&mut self, timeout: Duration) -> TtyResult<bool> {
        let millis = timeout.as_millis().min(u128::from(u16::MAX)) as u16;
        let mut fds = [PollFd::new(self.file.as_fd(), PollFlags::POLLIN)];

        match poll(&mut fds, PollTimeout::from(millis)) {
            Ok(n) => Ok(n > 0
                && fds[0]
                    .revents()
                    .is_some_and(|r| r.contains(PollFlags::POLLIN))),
            Err(Errno::EINTR) => {
                tracing::debug!("Wait for terminal input interrupted by a signal");
                Ok(false)
            },
            Err(e) => Err(TtyError::Poll(e)),
        }
    }

    fn read_available(&mut self, buf: &mut [u8]) -> TtyResult<usize> {
        match self.file.read(buf) {
            Ok(n) => Ok(n),
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock
                ) =>
            {
                Ok(0)
            },
            Err(e) => Err(TtyError::Read(e)),
        }
    }

    fn window_size(&self) -> Option<WindowSize> {
        let mut winsize = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };

        // SAFETY: TIOCGWINSZ fills in a winsize structure for a valid terminal fd
        let result = unsafe { libc::ioctl(self.file.as_raw_fd(), libc::TIOCGWINSZ, &mut winsize) };

        if result < 0 {
            tracing::debug!("TIOCGWINSZ failed: {}", Errno::last());
            None
        } else {
            Some(WindowSize::new(winsize.ws_col, winsize.ws_row))
        }
    }

    fn read_line(&mut self) -> TtyResult<Vec<u8>> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            if let Some(signal) = signals::pending_termination() {
                return Err(TtyError::Terminated(signal));
            }

            match self.file.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == b'\n' => break,
                // Anything past the limit is read and dropped
                Ok(_) if line.len() >= MAX_LINE => {},
                Ok(_) => line.push(byte[0]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {},
                Err(e) => return Err(TtyError::Read(e)),
            }
        }

        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device() {
        let err = Console::open("/nonexistent/tty").err().expect("open should fail");
        assert!(matches!(err, TtyError::Open { .. }));
    }

    #[test]
    fn test_open_rejects_non_terminal() {
        let file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let err = Console::open(file.path()).err().expect("open should fail");
        assert!(matches!(err, TtyError::NotATerminal(_)));
    }

    #[test]
    fn test_make_raw_clears_line_discipline() {
        // SAFETY: termios is plain old data; all-zero is a valid value
        let mut cooked: libc::termios = unsafe { std::mem::zeroed() };
        cooked.c_lflag = (libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN) as libc::tcflag_t;
        cooked.c_iflag = (libc::ICRNL | libc::IXON) as libc::tcflag_t;
        cooked.c_oflag = libc::OPOST as libc::tcflag_t;
        let cooked = Termios::from(cooked);

        let raw = Console::make_raw(&cooked);
        assert!(!raw.local_flags.intersects(
            LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::ISIG | LocalFlags::IEXTEN
        ));
        assert!(!raw.input_flags.intersects(InputFlags::ICRNL | InputFlags::IXON));
        assert!(!raw.output_flags.contains(OutputFlags::OPOST));
        assert!(raw.control_flags.contains(ControlFlags::CS8));
        assert_eq!(raw.control_chars[SpecialCharacterIndices::VMIN as usize], 1);
        assert_eq!(raw.control_chars[SpecialCharacterIndices::VTIME as usize], 0);
    }
}

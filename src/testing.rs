//! Scripted terminal for tests
//!
//! [`ScriptedTty`] plays the part of a terminal: it answers known inquiries
//! with canned replies, records everything written to it, and tracks its
//! attribute changes so tests can check that raw mode is always undone.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::tty::{Apply, Tty, TtyError, TtyResult, WindowSize};

/// Attributes of a scripted terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedAttrs {
    pub raw: bool,
    pub flags: u32,
}

impl Default for ScriptedAttrs {
    fn default() -> Self {
        Self {
            raw: false,
            flags: 0x8a3b,
        }
    }
}

/// A terminal that answers from a script
#[derive(Debug, Default)]
pub struct ScriptedTty {
    attrs: ScriptedAttrs,
    replies: HashMap<Vec<u8>, VecDeque<Vec<Vec<u8>>>>,
    pending: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    lines: VecDeque<Vec<u8>>,
    window: Option<WindowSize>,
    raw_entries: usize,
    raw_exits: usize,
    waited: Duration,
    fail_get_attrs: bool,
    fail_next_set_attrs: bool,
    fail_next_send: bool,
    fail_next_read: bool,
    signal_after: Option<(Vec<u8>, i32)>,
    signalled: Option<i32>,
}

impl ScriptedTty {
    /// A terminal that never answers
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `reply` the next time it is sent
    pub fn respond(&mut self, query: &[u8], reply: &[u8]) -> &mut Self {
        self.respond_in_chunks(query, &[reply])
    }

    /// Answer `query` with a reply that becomes readable piece by piece
    pub fn respond_in_chunks(&mut self, query: &[u8], chunks: &[&[u8]]) -> &mut Self {
        self.replies
            .entry(query.to_vec())
            .or_default()
            .push_back(chunks.iter().map(|c| c.to_vec()).collect());
        self
    }

    /// Line returned by the next prompt read
    pub fn type_line(&mut self, line: &str) -> &mut Self {
        self.lines.push_back(line.as_bytes().to_vec());
        self
    }

    /// Window size reported by the driver
    pub fn set_window_size(&mut self, size: WindowSize) -> &mut Self {
        self.window = Some(size);
        self
    }

    /// Make every attribute read fail
    pub fn fail_get_attrs(&mut self) -> &mut Self {
        self.fail_get_attrs = true;
        self
    }

    /// Make the next attribute write fail
    pub fn fail_next_set_attrs(&mut self) -> &mut Self {
        self.fail_next_set_attrs = true;
        self
    }

    /// Make the next write fail
    pub fn fail_next_send(&mut self) -> &mut Self {
        self.fail_next_send = true;
        self
    }

    /// Make the next wait report input and the read that follows fail
    pub fn fail_next_read(&mut self) -> &mut Self {
        self.fail_next_read = true;
        self
    }

    /// Record termination signal `signum` once `query` has been sent
    pub fn signal_after_send(&mut self, query: &[u8], signum: i32) -> &mut Self {
        self.signal_after = Some((query.to_vec(), signum));
        self
    }

    /// Attributes currently applied
    pub fn current_attrs(&self) -> ScriptedAttrs {
        self.attrs
    }

    /// Everything written to the terminal, one entry per send
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Number of switches into raw mode
    pub fn raw_entries(&self) -> usize {
        self.raw_entries
    }

    /// Number of switches back out of raw mode
    pub fn raw_exits(&self) -> usize {
        self.raw_exits
    }

    /// Total time spent waiting for answers that never came
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

impl Tty for ScriptedTty {
    type Attrs = ScriptedAttrs;

    fn attrs(&self) -> TtyResult<ScriptedAttrs> {
        if self.fail_get_attrs {
            return Err(TtyError::GetAttrs(nix::errno::Errno::ENOTTY));
        }
        Ok(self.attrs)
    }

    fn set_attrs(&mut self, attrs: &ScriptedAttrs, _when: Apply) -> TtyResult<()> {
        if std::mem::take(&mut self.fail_next_set_attrs) {
            return Err(TtyError::SetAttrs(nix::errno::Errno::EIO));
        }

        match (self.attrs.raw, attrs.raw) {
            (false, true) => self.raw_entries += 1,
            (true, false) => self.raw_exits += 1,
            _ => {},
        }
        self.attrs = *attrs;
        Ok(())
    }

    fn make_raw(cooked: &ScriptedAttrs) -> ScriptedAttrs {
        ScriptedAttrs {
            raw: true,
            flags: cooked.flags & 0x00ff,
        }
    }

    fn discard_input(&mut self) -> TtyResult<()> {
        self.pending.clear();
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> TtyResult<()> {
        if std::mem::take(&mut self.fail_next_send) {
            return Err(TtyError::Write(std::io::ErrorKind::BrokenPipe.into()));
        }
        self.sent.push(bytes.to_vec());

        if let Some((query, signum)) = &self.signal_after {
            if query == bytes {
                self.signalled = Some(*signum);
            }
        }

        // Only a raw terminal answers inquiries without a newline
        if self.attrs.raw {
            if let Some(reply) = self.replies.get_mut(bytes).and_then(VecDeque::pop_front) {
                self.pending.extend(reply);
            }
        }
        Ok(())
    }

    fn wait_readable(&mut self, timeout: Duration) -> TtyResult<bool> {
        if self.pending.is_empty() && !self.fail_next_read {
            self.waited += timeout;
            return Ok(false);
        }
        Ok(true)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> TtyResult<usize> {
        if std::mem::take(&mut self.fail_next_read) {
            return Err(TtyError::Read(std::io::ErrorKind::Other.into()));
        }
        let Some(mut chunk) = self.pending.pop_front() else {
            return Ok(0);
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            self.pending.push_front(chunk);
        }
        Ok(n)
    }

    fn window_size(&self) -> Option<WindowSize> {
        self.window
    }

    fn read_line(&mut self) -> TtyResult<Vec<u8>> {
        if let Some(signum) = self.signalled {
            return Err(TtyError::Terminated(signum));
        }
        Ok(self.lines.pop_front().unwrap_or_default())
    }

    fn pending_termination(&self) -> Option<i32> {
        self.signalled
    }
}

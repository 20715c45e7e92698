//! Timed inquiry/response exchange
//!
//! An inquiry is written and flushed, then the answer is collected until the
//! buffer is full, the deadline passes, or the line goes quiet. There is no
//! framing on the wire: silence is the only end-of-answer marker.

use std::time::{Duration, Instant};

use crate::tty::{RawScope, Tty, TtyResult};

use super::render::render;

/// Largest answer collected for one inquiry
pub const RESPONSE_CAPACITY: usize = 128;

/// Default time allowed for a terminal to start answering
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(1);

/// Default quiet period that ends an answer once it has started
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// Bytes received in answer to one inquiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    data: Vec<u8>,
    capacity: usize,
}

impl Response {
    /// The received bytes
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// No answer arrived before the deadline
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The answer filled the buffer and may have been cut short
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }
}

/// Sends inquiries and collects answers within a deadline
#[derive(Debug, Clone, Copy)]
pub struct Transceiver {
    deadline: Duration,
    settle: Duration,
}

impl Default for Transceiver {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE)
    }
}

impl Transceiver {
    /// A transceiver giving each inquiry `deadline` to be answered
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            settle: DEFAULT_SETTLE.min(deadline),
        }
    }

    /// Set the quiet period that ends an answer
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Send `query` and collect up to `max` bytes of answer.
    ///
    /// Taking a [`RawScope`] keeps the terminal raw for the whole exchange;
    /// several exchanges can share one scope. An empty [`Response`] means the
    /// terminal did not answer in time.
    pub fn transact<T: Tty>(
        &self,
        scope: &mut RawScope<'_, T>,
        query: &[u8],
        max: usize,
    ) -> TtyResult<Response> {
        let tty = scope.tty_mut();
        tty.send(query)?;

        let start = Instant::now();
        let deadline = start + self.deadline;
        let mut data = vec![0u8; max];
        let mut len = 0;

        while len < max {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            // Wait the full deadline for the first byte, then only as long as
            // the line keeps delivering
            let mut wait = deadline - now;
            if len > 0 {
                wait = wait.min(self.settle);
            }

            if !tty.wait_readable(wait)? {
                break;
            }

            let n = tty.read_available(&mut data[len..])?;
            if n == 0 {
                break;
            }
            len += n;
        }

        data.truncate(len);
        tracing::debug!(
            "sent \"{}\", read {} characters in {:?}: \"{}\"",
            render(query),
            len,
            start.elapsed(),
            render(&data)
        );

        Ok(Response {
            data,
            capacity: max,
        })
    }
}

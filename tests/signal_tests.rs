//! Signal delivery while blocked on the terminal
//!
//! Kept in its own test binary: a recorded termination signal is process-wide
//! and would end every other probe running in the same process.

use std::os::fd::AsRawFd;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use nix::libc;
use nix::pty::{openpty, OpenptyResult, Winsize};
use nix::sys::pthread::{pthread_kill, pthread_self};
use nix::sys::signal::Signal;

use ttytype::tty::signals::SignalGuard;
use ttytype::tty::{Console, Tty, TtyError};

#[test]
fn test_interrupt_at_prompt_ends_line_read() {
    let winsize = Winsize {
        ws_row: 24,
        ws_col: 80,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let OpenptyResult { master, slave } = openpty(&winsize, None).expect("Failed to open pty");
    let path = std::fs::read_link(format!("/proc/self/fd/{}", slave.as_raw_fd()))
        .expect("Failed to resolve pty path");

    let _guard = SignalGuard::install().expect("Failed to install handlers");
    let mut console = Console::open(&path).expect("Failed to open pty slave");

    let (tid_tx, tid_rx) = mpsc::channel();
    let (result_tx, result_rx) = mpsc::channel();
    thread::spawn(move || {
        tid_tx.send(pthread_self()).expect("send thread id");
        let _ = result_tx.send(console.read_line());
    });
    let reader = tid_rx.recv().expect("reader thread id");

    // Keep interrupting until the read gives up; one signal could land just
    // before the read starts
    let start = Instant::now();
    let result = loop {
        thread::sleep(Duration::from_millis(100));
        pthread_kill(reader, Signal::SIGINT).expect("Failed to signal reader");
        if let Ok(result) = result_rx.recv_timeout(Duration::from_millis(100)) {
            break result;
        }
        assert!(start.elapsed() < Duration::from_secs(5), "line read never returned");
    };

    assert!(matches!(result, Err(TtyError::Terminated(libc::SIGINT))));
    drop(master);
}

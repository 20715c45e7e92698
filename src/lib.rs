//! ttytype Library
//!
//! Identifies the terminal on the other end of a tty line by sending it the
//! identification inquiries of several terminal families and matching the
//! answer, then works out the screen size.
//!
//! - `tty`: Terminal device, raw mode sessions, signal handling
//! - `probe`: Inquiry/response exchange, signature tables, identification and geometry
//! - `app`: Configuration and output formatting for the command line tool
//! - `testing`: Scripted terminal for tests

pub mod app;
pub mod probe;
pub mod testing;
pub mod tty;

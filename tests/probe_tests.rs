//! End-to-end probe tests against scripted terminals
//!
//! Each test sets up a terminal that answers a fixed set of inquiries and
//! checks the name and size the probe settles on, along with what was sent
//! and that the terminal is left cooked.

use std::time::Duration;

use ttytype::app::{output, OutputFormat, ShellFlavor};
use ttytype::probe::{self, Family, ProbeOptions};
use ttytype::testing::{ScriptedAttrs, ScriptedTty};
use ttytype::tty::{Mode, Session, WindowSize};

const WYSE_ID: &[u8] = b"\x1b ";
const DA: &[u8] = b"\x1b[0c";
const DECID: &[u8] = b"\x1bZ";
const HP_ID: &[u8] = b"\x1b*s1^";
const ANSI_SIZE: &[u8] = b"\x1b7\x1b[999;999H\x1b[6n\x1b8";
const HP_WHERE: &[u8] = b"\x1b`";
const HP_SIZE: &[u8] = b"\x1b&a999c999Y\x1b`";

/// Run the whole probe and hand back the session for inspection
fn run(tty: ScriptedTty, options: &ProbeOptions) -> (probe::Identification, Session<ScriptedTty>) {
    let mut session = Session::new(tty);
    let ident = probe::run(&mut session, options).expect("Failed to probe terminal");
    assert_eq!(session.mode(), Mode::Cooked);
    assert_eq!(session.tty().current_attrs(), ScriptedAttrs::default());
    assert_eq!(session.tty().raw_entries(), session.tty().raw_exits());
    (ident, session)
}

fn assume_unknown() -> ProbeOptions {
    ProbeOptions {
        assume_unknown: true,
        ..Default::default()
    }
}

// ============================================================================
// Identification
// ============================================================================

#[test]
fn test_vt100_with_unparseable_size_report() {
    let mut tty = ScriptedTty::new();
    tty.respond(DA, b"\x1b[?1;2c");
    tty.respond(ANSI_SIZE, b"\x1b[?1;2c");
    tty.set_window_size(WindowSize::new(80, 24));

    let (ident, session) = run(tty, &ProbeOptions::default());
    assert_eq!(ident.name().as_str(), "vt100");
    assert_eq!(ident.family(), Family::Ansi);
    assert_eq!((ident.lines(), ident.columns()), (Some(24), Some(80)));
    assert_eq!(
        session.tty().sent(),
        &[WYSE_ID.to_vec(), DA.to_vec(), ANSI_SIZE.to_vec()]
    );
}

#[test]
fn test_vt52_answers_decid_only() {
    let mut tty = ScriptedTty::new();
    tty.respond(DECID, b"\x1b/K");

    let (ident, _) = run(tty, &ProbeOptions::default());
    assert_eq!(ident.name().as_str(), "vt52");
    // No usable size from anywhere
    assert_eq!((ident.lines(), ident.columns()), (Some(24), Some(80)));
}

#[test]
fn test_wyse_terminal() {
    let mut tty = ScriptedTty::new();
    tty.respond(WYSE_ID, b"50\r");
    tty.set_window_size(WindowSize::new(80, 25));

    let (ident, session) = run(tty, &ProbeOptions::default());
    assert_eq!(ident.name().as_str(), "wy50");
    assert_eq!(ident.lines(), Some(25));
    assert_eq!(session.tty().sent(), &[WYSE_ID.to_vec()]);
}

#[test]
fn test_hp_terminal_measured_by_cursor() {
    let mut tty = ScriptedTty::new();
    tty.respond(HP_ID, b"2397A\r");
    tty.respond(HP_WHERE, b"\x1b&a000c000Y\r");
    tty.respond(HP_SIZE, b"\x1b&a079c023Y\r");
    tty.set_window_size(WindowSize::new(132, 50));

    let (ident, session) = run(tty, &ProbeOptions::default());
    assert_eq!(ident.name().as_str(), "hp2397a");
    assert_eq!(ident.family(), Family::Hp);
    // The terminal's own answer wins over the driver's
    assert_eq!((ident.lines(), ident.columns()), (Some(24), Some(80)));
    assert_eq!(session.tty().sent().last(), Some(&b"\x1b&a0c0Y".to_vec()));
}

#[test]
fn test_answer_split_across_reads() {
    let mut tty = ScriptedTty::new();
    tty.respond_in_chunks(DA, &[b"\x1b[?6", b"4;1;2;6;8;9;15;18;21;22c"]);

    let (ident, _) = run(tty, &ProbeOptions::default());
    assert_eq!(ident.name().as_str(), "vt420");
}

#[test]
fn test_answer_with_trailing_noise() {
    let mut tty = ScriptedTty::new();
    tty.respond(DA, b"\x1b[?63;1;2;6;7;8c\x1b[?63;1;2;6;7;8c");

    let (ident, _) = run(tty, &ProbeOptions::default());
    assert_eq!(ident.name().as_str(), "vt320");
}

// ============================================================================
// Fallbacks
// ============================================================================

#[test]
fn test_silent_terminal_with_assume_unknown() {
    let options = ProbeOptions {
        deadline: Duration::from_millis(50),
        ..assume_unknown()
    };

    let (ident, session) = run(ScriptedTty::new(), &options);
    assert!(!ident.is_identified());
    assert_eq!(ident.name().as_str(), "unknown");
    // Wyse, DA, DECID and HP, then nothing more for an unknown family
    assert_eq!(session.tty().sent().len(), 4);
    assert!(session.tty().waited() <= Duration::from_millis(200));
}

#[test]
fn test_silent_terminal_prompts_for_name() {
    let mut tty = ScriptedTty::new();
    tty.type_line("adm3a");
    tty.set_window_size(WindowSize::new(80, 24));

    let (ident, session) = run(tty, &ProbeOptions::default());
    assert!(ident.is_identified());
    assert_eq!(ident.name().as_str(), "adm3a");
    assert!(session
        .tty()
        .sent()
        .contains(&b"TERM = (vt100) ".to_vec()));
}

#[test]
fn test_configured_default_size() {
    let options = ProbeOptions {
        default_size: WindowSize::new(132, 43),
        ..assume_unknown()
    };

    let (ident, _) = run(ScriptedTty::new(), &options);
    assert_eq!((ident.lines(), ident.columns()), (Some(43), Some(132)));
}

#[test]
fn test_restricted_to_ansi() {
    let mut tty = ScriptedTty::new();
    tty.respond(WYSE_ID, b"60\r");
    tty.respond(DA, b"\x1b[?65;1;9c");

    let options = ProbeOptions {
        restrict: Some(Family::Ansi),
        ..Default::default()
    };
    let (ident, session) = run(tty, &options);
    assert_eq!(ident.name().as_str(), "vt510");
    assert!(!session.tty().sent().contains(&WYSE_ID.to_vec()));
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_shell_output_for_probed_terminal() {
    let mut tty = ScriptedTty::new();
    tty.respond(DA, b"\x1b[?62;1;2c");
    tty.respond(ANSI_SIZE, b"\x1b[48;160R");

    let (ident, _) = run(tty, &ProbeOptions::default());
    let text = output::format(&ident, OutputFormat::Shell, ShellFlavor::Bourne).expect("format");
    assert_eq!(
        text,
        "TERM='vt220'; export TERM;\nLINES=48; export LINES;\nCOLUMNS=160; export COLUMNS;\n"
    );
}

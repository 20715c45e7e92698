//! ttytype
//!
//! Asks the attached terminal what it is, measures its screen, and prints the
//! result for a login script to use.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ttytype::app::{output, CliArgs, Config, ShellFlavor};
use ttytype::probe::{self, ProbeOptions};
use ttytype::tty::signals::SignalGuard;
use ttytype::tty::{Console, Session, TtyError};

/// Exit status for unusable configuration
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let (config, options) = match Config::load_with_args(&args)
        .and_then(|config| config.probe_options().map(|options| (config, options)))
    {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(EXIT_CONFIG);
        },
    };

    match run(&config, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Tty(TtyError::Terminated(signal))) => {
            tracing::warn!("Interrupted by signal {}", signal);
            ExitCode::from(128u8.saturating_add(u8::try_from(signal).unwrap_or(u8::MAX)))
        },
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        },
    }
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Tty(#[from] TtyError),

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write result: {0}")]
    Output(#[source] io::Error),
}

fn run(config: &Config, options: &ProbeOptions) -> Result<(), Error> {
    let _signals = SignalGuard::install()?;

    let console = Console::open_with_fallback(&config.device)?;
    tracing::debug!("Probing terminal on {}", console.path().display());
    let ident = {
        let mut session = Session::new(console);
        probe::run(&mut session, options)?
    };

    let text = output::format(&ident, config.output, ShellFlavor::detect())?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(Error::Output)
}

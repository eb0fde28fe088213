//! scopelight: scope-aware highlighting for Python source files.

#![deny(unsafe_code)]

mod args;
mod config;
mod diagnostics;
mod error;
mod run;

use args::Mode;
use config::CliConfig;
use error::{CliError, EXIT_SUCCESS};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = match args::parse_args(std::env::args_os().skip(1)) {
        Ok(args) => args,
        Err(err) => return error::report(&CliError::Usage(err)),
    };

    match args.mode {
        Mode::PrintVersion => {
            println!("{}", args::version_string());
            return ExitCode::from(EXIT_SUCCESS);
        }
        Mode::PrintHelp => {
            print!("{}", args::help_text());
            return ExitCode::from(EXIT_SUCCESS);
        }
        Mode::Highlight(_) | Mode::Diff { .. } => {}
    }

    let config = CliConfig::from_args(&args);
    init_logging(&config);
    for ignored in &config.ignored {
        tracing::warn!("ignoring {ignored}");
    }

    let stdout = std::io::stdout();
    match run::run(&args.mode, &config, &mut stdout.lock()) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => error::report(&err),
    }
}

/// Log to stderr, filtered by `SCOPELIGHT_LOG` or the `-v`/`-q` flags.
fn init_logging(config: &CliConfig) {
    let directive = config.log_directive();
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("scopelight: invalid log filter '{directive}': {err}");
        EnvFilter::new("warn")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

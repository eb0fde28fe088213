//! CLI errors, their stderr formatting and exit codes.

use crate::args::ArgError;
use crate::diagnostics::{self, SourceMap};
use scopelight_core::SyntaxError;
use scopelight_engine::EngineError;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

// =============================================================================
// Exit Codes
// =============================================================================

/// Successful run.
pub const EXIT_SUCCESS: u8 = 0;
/// The input could not be read, parsed or queried.
pub const EXIT_ERROR: u8 = 1;
/// Command-line usage error (bad flags, missing args).
pub const EXIT_USAGE_ERROR: u8 = 2;
/// Internal error (should never happen).
pub const EXIT_INTERNAL_ERROR: u8 = 120;

// =============================================================================
// Errors
// =============================================================================

/// Everything a run can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad command line.
    #[error(transparent)]
    Usage(#[from] ArgError),
    /// An input file could not be read.
    #[error("can't open file '{}': {source}", .path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// Why.
        #[source]
        source: std::io::Error,
    },
    /// An input file does not parse.
    #[error("{}: {error}", .path.display())]
    Syntax {
        /// The file.
        path: PathBuf,
        /// Its text, for the caret display.
        source_text: String,
        /// The parse failure.
        error: SyntaxError,
    },
    /// A query against the analysis failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Writing the output failed.
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

// =============================================================================
// Error Formatting
// =============================================================================

/// Print `error` to stderr and return its exit code.
pub fn report(error: &CliError) -> ExitCode {
    eprint!("{}", format_error_string(error));
    ExitCode::from(exit_code_for_error(error))
}

/// Format an error for stderr.
pub fn format_error_string(error: &CliError) -> String {
    match error {
        CliError::Syntax {
            path,
            source_text,
            error,
        } => {
            let filename = path.display().to_string();
            let sm = SourceMap::new(source_text, &filename);
            format!("{}\n", diagnostics::render_syntax_error(&sm, error))
        }
        CliError::Usage(err) => format!("scopelight: {}\nTry 'scopelight -h' for more information.\n", err),
        other => format!("scopelight: {}\n", other),
    }
}

/// Map an error to its exit code.
#[inline]
fn exit_code_for_error(error: &CliError) -> u8 {
    match error {
        CliError::Usage(_) => EXIT_USAGE_ERROR,
        CliError::Io { .. } | CliError::Syntax { .. } | CliError::Engine(_) => EXIT_ERROR,
        CliError::Output(_) => EXIT_INTERNAL_ERROR,
    }
}

// =============================================================================
// Tests
// =============================================================================

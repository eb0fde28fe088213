//! # Scopelight Engine
//!
//! Incremental highlighting on top of the analyzer: each buffer version is
//! analyzed, diffed against what is drawn, and only the difference is
//! published. Syntax errors go through a hysteresis controller so a user in
//! mid-edit does not see flicker.
//!
//! [`BufferSession`] is the synchronous core. [`Pipeline`] runs a session on
//! a worker thread with last-writer-wins coalescing.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod change;
pub mod config;
pub mod diff;
pub mod pipeline;
pub mod recovery;
pub mod session;

pub use change::{ChangedLines, Snapshot};
pub use config::{Config, ConfigBuilder, SelectionMode, DEFAULT_ERROR_DELAY};
pub use diff::{apply, diff, redraw, DiffOp, ErrorMark};
pub use pipeline::Pipeline;
pub use recovery::{RecoveryController, RecoveryState};
pub use session::{BufferSession, HighlightSink};

use scopelight_core::Position;
use thiserror::Error;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Parse failure or a position outside the buffer.
    #[error(transparent)]
    Core(#[from] scopelight_core::Error),
    /// A query needed a name under the cursor and found none.
    #[error("no name at {0}")]
    NoNameAt(Position),
    /// The analysis worker has exited.
    #[error("the analysis worker has stopped")]
    WorkerStopped,
    /// The analysis worker could not be started.
    #[error("failed to start the analysis worker")]
    Spawn(#[source] std::io::Error),
}

impl From<scopelight_core::SyntaxError> for EngineError {
    fn from(error: scopelight_core::SyntaxError) -> Self {
        EngineError::Core(error.into())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

//! The commands behind each mode.

use crate::args::Mode;
use crate::config::CliConfig;
use crate::error::CliError;
use scopelight_core::Position;
use scopelight_engine::{BufferSession, ChangedLines, Snapshot};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Run `mode`, writing results to `out`.
pub fn run(mode: &Mode, config: &CliConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let mut session = BufferSession::new(config.engine_config());
    match mode {
        Mode::Highlight(path) => {
            let text = read(path)?;
            analyze_into(&mut session, path, &text, None)?;
            warn_tolerated(&session, path, config);
            match config.at {
                Some(at) => write_selection(&session, at, out),
                None => write_lines(out, session.drawn()),
            }
        }
        Mode::Diff { old, new } => {
            let old_text = read(old)?;
            let new_text = read(new)?;
            analyze_into(&mut session, old, &old_text, None)?;
            let changed = ChangedLines::between(&old_text, &new_text);
            tracing::debug!(?changed, "diffing");
            let ops = analyze_into(&mut session, new, &new_text, changed)?;
            warn_tolerated(&session, new, config);
            write_lines(out, &ops)
        }
        Mode::PrintVersion | Mode::PrintHelp => Ok(()),
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Analyze `text` and commit it to the session. A buffer that does not
/// parse is an error here, unlike in the editor.
fn analyze_into(
    session: &mut BufferSession,
    path: &Path,
    text: &str,
    changed: Option<ChangedLines>,
) -> Result<Vec<scopelight_engine::DiffOp>, CliError> {
    let snapshot = match changed {
        Some(changed) => Snapshot::with_change(text, changed),
        None => Snapshot::new(text),
    };
    let analysis = session.run_pass(&snapshot).map_err(|error| CliError::Syntax {
        path: path.to_path_buf(),
        source_text: text.to_owned(),
        error,
    })?;
    let ops = session.commit(&snapshot, Ok(analysis), Instant::now());
    Ok(ops)
}

fn warn_tolerated(session: &BufferSession, path: &Path, config: &CliConfig) {
    if config.quiet {
        return;
    }
    if let Some(tolerated) = &session.analysis().tolerated {
        tracing::warn!(
            file = %path.display(),
            lines = ?tolerated.lines,
            "highlighted despite a syntax error: {}",
            tolerated.error
        );
    }
}

fn write_selection(session: &BufferSession, at: Position, out: &mut dyn Write) -> Result<(), CliError> {
    let nodes = session.rename_set(at)?;
    let highlights: Vec<_> = nodes.iter().map(|n| n.highlight()).collect();
    write_lines(out, &highlights)
}

fn write_lines<T: std::fmt::Display>(out: &mut dyn Write, items: &[T]) -> Result<(), CliError> {
    for item in items {
        writeln!(out, "{item}").map_err(CliError::Output)?;
    }
    out.flush().map_err(CliError::Output)
}

// =============================================================================
// Tests
// =============================================================================

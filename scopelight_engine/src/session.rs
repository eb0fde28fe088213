//! The synchronous per-buffer core: parse, classify, diff, commit.

use crate::change::{ChangedLines, Snapshot};
use crate::config::{Config, SelectionMode};
use crate::diff::{self, DiffOp};
use crate::recovery::RecoveryController;
use crate::{EngineError, Result};
use scopelight_analysis::{analyze, Analysis, Highlight, LocationKind, NameNode};
use scopelight_core::{LineIndex, ParseResult, Position};
use scopelight_parser::parse_tolerant;
use std::sync::Arc;
use std::time::Instant;

/// Receives the operations a pass produced.
pub trait HighlightSink: Send {
    /// Apply `ops` in order.
    fn publish(&mut self, ops: &[DiffOp]);
}

impl<F> HighlightSink for F
where
    F: FnMut(&[DiffOp]) + Send,
{
    fn publish(&mut self, ops: &[DiffOp]) {
        self(ops)
    }
}

/// Highlighting state of one buffer.
///
/// [`update`](Self::update) runs a whole pass. The pipeline splits it into
/// [`run_pass`](Self::run_pass), which needs no mutable access, and
/// [`commit`](Self::commit), so a stale pass can be dropped in between.
#[derive(Debug)]
pub struct BufferSession {
    config: Arc<Config>,
    text: Arc<str>,
    analysis: Arc<Analysis>,
    drawn: Vec<Highlight>,
    selected: Vec<Highlight>,
    /// Last cursor given to [`select`](Self::select), kept in step with edits.
    cursor: Option<Position>,
    recovery: RecoveryController,
    /// Whether the next snapshot's change hint is relative to `text`.
    in_sync: bool,
}

impl BufferSession {
    /// An empty session.
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        let recovery = RecoveryController::new(config.error_sign_delay, config.error_sign);
        Self {
            config,
            text: Arc::from(""),
            analysis: Arc::new(Analysis::empty()),
            drawn: Vec::new(),
            selected: Vec::new(),
            cursor: None,
            recovery,
            in_sync: true,
        }
    }

    /// Configuration in effect.
    #[inline]
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Last committed analysis.
    #[inline]
    pub fn analysis(&self) -> Arc<Analysis> {
        Arc::clone(&self.analysis)
    }

    /// Text of the last committed analysis.
    #[inline]
    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    /// Highlights currently drawn, sorted.
    #[inline]
    pub fn drawn(&self) -> &[Highlight] {
        &self.drawn
    }

    /// Error controller.
    #[inline]
    pub fn recovery(&self) -> &RecoveryController {
        &self.recovery
    }

    /// Analyze `snapshot` and apply the result.
    pub fn update(&mut self, snapshot: &Snapshot, now: Instant) -> Vec<DiffOp> {
        let outcome = self.run_pass(snapshot);
        self.commit(snapshot, outcome, now)
    }

    /// Parse and classify `snapshot` without touching any state.
    #[tracing::instrument(level = "debug", skip_all, fields(len = snapshot.text.len()))]
    pub fn run_pass(&self, snapshot: &Snapshot) -> ParseResult<Analysis> {
        let changed_line = self.change_hint(snapshot).map(|c| c.edited_line());
        let parsed = parse_tolerant(&snapshot.text, changed_line, self.config.policy())?;
        Ok(analyze(&parsed, &self.config.analysis_options()))
    }

    /// Apply the outcome of [`run_pass`](Self::run_pass) for `snapshot`.
    ///
    /// A failed pass leaves the highlights as they are and only informs the
    /// error controller.
    #[tracing::instrument(level = "debug", skip_all, fields(ok = outcome.is_ok()))]
    pub fn commit(&mut self, snapshot: &Snapshot, outcome: ParseResult<Analysis>, now: Instant) -> Vec<DiffOp> {
        let analysis = match outcome {
            Ok(analysis) => analysis,
            Err(error) => {
                tracing::debug!(%error, "pass failed, keeping last highlights");
                self.in_sync = false;
                return self.recovery.failure(error, now).into_iter().collect();
            }
        };

        let hint = self.change_hint(snapshot);
        let range = if self.config.whole_buffer { None } else { hint };
        let highlights = analysis.index.highlights(&self.config.excluded_categories);
        let mut ops = diff::diff(&self.drawn, &highlights, range);

        let error_op = match &analysis.tolerated {
            Some(tolerated) => self.recovery.failure(tolerated.error.clone(), now),
            None => self.recovery.success(),
        };

        tracing::debug!(ops = ops.len(), nodes = analysis.index.len(), "committed");
        self.drawn = highlights;
        self.text = Arc::clone(&snapshot.text);
        self.analysis = Arc::new(analysis);
        self.in_sync = true;

        if let (Some(cursor), Some(hint)) = (self.cursor.as_mut(), hint) {
            cursor.line = hint.shift(cursor.line);
        }
        ops.extend(self.reselect());
        ops.extend(error_op);
        ops
    }

    /// Forget that a snapshot was submitted: its pass will never commit, so
    /// later change hints cannot be trusted.
    pub fn discard(&mut self) {
        self.in_sync = false;
    }

    /// Confirm a pending syntax error whose delay has passed.
    pub fn poll(&mut self, now: Instant) -> Vec<DiffOp> {
        self.recovery.poll(now).into_iter().collect()
    }

    /// When [`poll`](Self::poll) will next have something to do.
    pub fn deadline(&self) -> Option<Instant> {
        self.recovery.deadline()
    }

    /// Move the cursor and update the selection highlights.
    pub fn select(&mut self, cursor: Position) -> Vec<DiffOp> {
        self.cursor = Some(cursor);
        self.reselect()
    }

    /// Recompute the selection at the stored cursor against the committed
    /// analysis.
    fn reselect(&mut self) -> Vec<DiffOp> {
        let selected = match (self.config.selection, self.cursor) {
            (SelectionMode::Off, _) | (_, None) => Vec::new(),
            (mode, Some(cursor)) => {
                let mut selected = self.analysis.index.selection(
                    cursor,
                    mode.marks_original(),
                    self.config.self_attribute_merge,
                );
                selected.sort();
                selected
            }
        };
        if selected == self.selected {
            return Vec::new();
        }
        let ops = diff::diff(&self.selected, &selected, None);
        self.selected = selected;
        ops
    }

    /// Erase and redraw everything, including the selection and a shown
    /// error.
    pub fn redraw(&self) -> Vec<DiffOp> {
        let mut shown: Vec<Highlight> = self.drawn.iter().chain(&self.selected).cloned().collect();
        shown.sort();
        let mut ops = diff::redraw(&shown, &shown);
        if self.recovery.is_shown() {
            if let Some(error) = self.recovery.error() {
                ops.push(DiffOp::MarkError(crate::diff::ErrorMark {
                    position: error.position,
                    message: error.message.clone(),
                }));
            }
        }
        ops
    }

    /// Switch configuration and reanalyze the committed text. A shown error
    /// is cleared first; the new controller reports it again if it persists.
    pub fn reconfigure(&mut self, config: Arc<Config>, now: Instant) -> Vec<DiffOp> {
        let mut ops = Vec::new();
        if self.recovery.is_shown() {
            ops.push(DiffOp::ClearError);
        }
        self.recovery = RecoveryController::new(config.error_sign_delay, config.error_sign);
        self.config = config;
        ops.extend(self.update(&Snapshot::new(Arc::clone(&self.text)), now));
        // A failed pass skips the commit, but the selection mode may differ.
        ops.extend(self.reselect());
        ops
    }

    /// Every node a rename at `pos` must touch.
    pub fn rename_set(&self, pos: Position) -> Result<Vec<NameNode>> {
        let node = self.node_at(pos)?;
        Ok(self
            .analysis
            .index
            .rename_set(node, self.config.self_attribute_merge)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Where to jump from `here`.
    pub fn next_location(&self, kind: LocationKind, here: Position, reverse: bool) -> Result<Option<Position>> {
        self.check_position(here)?;
        Ok(self
            .analysis
            .next_location(kind, here, reverse, self.config.self_attribute_merge))
    }

    fn node_at(&self, pos: Position) -> Result<&NameNode> {
        self.check_position(pos)?;
        self.analysis.index.node_at(pos).ok_or(EngineError::NoNameAt(pos))
    }

    fn check_position(&self, pos: Position) -> Result<()> {
        if pos.line == 0 || pos.line > LineIndex::new(&self.text).line_count() {
            return Err(scopelight_core::Error::OutOfRange(pos).into());
        }
        Ok(())
    }

    /// The change hint, if it is relative to the committed text; otherwise
    /// one computed from the texts.
    fn change_hint(&self, snapshot: &Snapshot) -> Option<ChangedLines> {
        match snapshot.changed {
            Some(changed) if self.in_sync => Some(changed),
            _ => ChangedLines::between(&self.text, &snapshot.text),
        }
    }
}

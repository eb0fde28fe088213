//! Error hysteresis.
//!
//! A syntax error is usually transient: the user is in the middle of typing.
//! The controller keeps the last good highlights and only shows an error once
//! it has persisted for a configured delay.

use crate::diff::{DiffOp, ErrorMark};
use scopelight_core::SyntaxError;
use std::time::{Duration, Instant};

/// Where the controller stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryState {
    /// The last pass parsed cleanly.
    Clean,
    /// Parsing fails but the error is not shown yet.
    ErrorPending {
        /// Most recent error.
        error: SyntaxError,
        /// When the current run of failures began.
        since: Instant,
    },
    /// The error has persisted past the delay.
    ErrorConfirmed {
        /// Most recent error.
        error: SyntaxError,
    },
}

/// Decides when to show and hide the syntax error indicator.
#[derive(Debug, Clone)]
pub struct RecoveryController {
    state: RecoveryState,
    delay: Duration,
    indicator: bool,
    shown: bool,
}

impl RecoveryController {
    /// Create a controller in [`RecoveryState::Clean`]. With `indicator` off,
    /// errors are tracked but never shown.
    #[must_use]
    pub fn new(delay: Duration, indicator: bool) -> Self {
        Self {
            state: RecoveryState::Clean,
            delay,
            indicator,
            shown: false,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> &RecoveryState {
        &self.state
    }

    /// The error being tracked, if any.
    pub fn error(&self) -> Option<&SyntaxError> {
        match &self.state {
            RecoveryState::Clean => None,
            RecoveryState::ErrorPending { error, .. } | RecoveryState::ErrorConfirmed { error } => Some(error),
        }
    }

    /// Whether the indicator is currently shown.
    #[inline]
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// When [`poll`](Self::poll) will next have something to do.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            RecoveryState::ErrorPending { since, .. } => Some(*since + self.delay),
            _ => None,
        }
    }

    /// Record a failed (or tolerated) pass.
    pub fn failure(&mut self, error: SyntaxError, now: Instant) -> Option<DiffOp> {
        match std::mem::replace(&mut self.state, RecoveryState::Clean) {
            RecoveryState::Clean => {
                tracing::debug!(line = error.line(), "syntax error pending");
                self.state = RecoveryState::ErrorPending { error, since: now };
                None
            }
            RecoveryState::ErrorPending { since, .. } => {
                self.state = RecoveryState::ErrorPending { error, since };
                None
            }
            RecoveryState::ErrorConfirmed { error: previous } => {
                let moved = previous.position != error.position || previous.message != error.message;
                let op = (moved && self.shown).then(|| DiffOp::MarkError(mark(&error)));
                self.state = RecoveryState::ErrorConfirmed { error };
                op
            }
        }
    }

    /// Record a clean pass.
    pub fn success(&mut self) -> Option<DiffOp> {
        if self.state != RecoveryState::Clean {
            tracing::debug!("syntax error resolved");
        }
        self.state = RecoveryState::Clean;
        std::mem::take(&mut self.shown).then_some(DiffOp::ClearError)
    }

    /// Confirm a pending error whose delay has passed.
    pub fn poll(&mut self, now: Instant) -> Option<DiffOp> {
        let RecoveryState::ErrorPending { error, since } = &self.state else {
            return None;
        };
        if now.saturating_duration_since(*since) < self.delay {
            return None;
        }
        let error = error.clone();
        tracing::debug!(line = error.line(), "syntax error confirmed");
        let op = self.indicator.then(|| DiffOp::MarkError(mark(&error)));
        self.shown = op.is_some();
        self.state = RecoveryState::ErrorConfirmed { error };
        op
    }
}

fn mark(error: &SyntaxError) -> ErrorMark {
    ErrorMark {
        position: error.position,
        message: error.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopelight_core::{Span, SyntaxErrorKind};

    const DELAY: Duration = Duration::from_millis(100);

    fn error_at(offset: u32) -> SyntaxError {
        SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken,
            "invalid syntax",
            Span::new(offset, offset + 1),
            "a = (\nb = )\n",
        )
    }

    #[test]
    fn test_error_is_shown_only_after_delay() {
        let start = Instant::now();
        let mut rc = RecoveryController::new(DELAY, true);
        assert_eq!(rc.failure(error_at(0), start), None);
        assert!(matches!(rc.state(), RecoveryState::ErrorPending { .. }));
        assert_eq!(rc.poll(start + DELAY / 2), None);
        assert_eq!(rc.deadline(), Some(start + DELAY));

        let op = rc.poll(start + DELAY);
        assert!(matches!(op, Some(DiffOp::MarkError(_))));
        assert!(matches!(rc.state(), RecoveryState::ErrorConfirmed { .. }));
        assert!(rc.is_shown());
        assert_eq!(rc.deadline(), None);
    }

    #[test]
    fn test_repeated_failures_do_not_restart_timer() {
        let start = Instant::now();
        let mut rc = RecoveryController::new(DELAY, true);
        rc.failure(error_at(0), start);
        rc.failure(error_at(6), start + DELAY / 2);
        assert_eq!(rc.deadline(), Some(start + DELAY));
        assert_eq!(rc.error().map(|e| e.line()), Some(2));
    }

    #[test]
    fn test_success_before_delay_shows_nothing() {
        let start = Instant::now();
        let mut rc = RecoveryController::new(DELAY, true);
        rc.failure(error_at(0), start);
        assert_eq!(rc.success(), None);
        assert_eq!(rc.poll(start + DELAY * 2), None);
        assert_eq!(rc.state(), &RecoveryState::Clean);
    }

    #[test]
    fn test_success_clears_shown_error() {
        let start = Instant::now();
        let mut rc = RecoveryController::new(DELAY, true);
        rc.failure(error_at(0), start);
        rc.poll(start + DELAY);
        assert_eq!(rc.success(), Some(DiffOp::ClearError));
        assert_eq!(rc.success(), None);
    }

    #[test]
    fn test_confirmed_error_moves() {
        let start = Instant::now();
        let mut rc = RecoveryController::new(DELAY, true);
        rc.failure(error_at(0), start);
        rc.poll(start + DELAY);
        assert_eq!(rc.failure(error_at(0), start + DELAY * 2), None);
        match rc.failure(error_at(6), start + DELAY * 3) {
            Some(DiffOp::MarkError(mark)) => assert_eq!(mark.position.line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_disabled_indicator() {
        let start = Instant::now();
        let mut rc = RecoveryController::new(DELAY, false);
        rc.failure(error_at(0), start);
        assert_eq!(rc.poll(start + DELAY), None);
        assert!(matches!(rc.state(), RecoveryState::ErrorConfirmed { .. }));
        assert_eq!(rc.failure(error_at(6), start + DELAY * 2), None);
        assert_eq!(rc.success(), None);
    }
}

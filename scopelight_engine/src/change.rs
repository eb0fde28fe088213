//! Buffer snapshots and the line range an edit touched.

use std::sync::Arc;

/// Lines an edit replaced. 1-indexed and half-open: old lines
/// `start..old_end` became new lines `start..new_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangedLines {
    /// First changed line.
    pub start: u32,
    /// End of the replaced range in the old text.
    pub old_end: u32,
    /// End of the replacing range in the new text.
    pub new_end: u32,
}

impl ChangedLines {
    /// A change of `count` lines starting at `start` that keeps the line
    /// count.
    #[inline]
    #[must_use]
    pub const fn lines(start: u32, count: u32) -> Self {
        Self {
            start,
            old_end: start + count,
            new_end: start + count,
        }
    }

    /// Compute the range from two versions of a buffer: everything between
    /// their common leading and trailing lines. `None` when both are equal.
    #[must_use]
    pub fn between(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }
        let old_lines: Vec<&str> = old.split('\n').collect();
        let new_lines: Vec<&str> = new.split('\n').collect();

        let prefix = old_lines
            .iter()
            .zip(&new_lines)
            .take_while(|(a, b)| a == b)
            .count();
        let max_suffix = old_lines.len().min(new_lines.len()) - prefix;
        let suffix = old_lines
            .iter()
            .rev()
            .zip(new_lines.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        Some(Self {
            start: prefix as u32 + 1,
            old_end: (old_lines.len() - suffix) as u32 + 1,
            new_end: (new_lines.len() - suffix) as u32 + 1,
        })
    }

    /// Whether the edit kept the line count.
    #[inline]
    #[must_use]
    pub const fn keeps_line_count(&self) -> bool {
        self.old_end == self.new_end
    }

    /// Whether `line` of the old text lies in the replaced range.
    #[inline]
    #[must_use]
    pub const fn in_old(&self, line: u32) -> bool {
        self.start <= line && line < self.old_end
    }

    /// Whether `line` of the new text lies in the replacing range.
    #[inline]
    #[must_use]
    pub const fn in_new(&self, line: u32) -> bool {
        self.start <= line && line < self.new_end
    }

    /// Where `line` of the old text ended up in the new text. Lines inside
    /// the replaced range stay put.
    #[inline]
    #[must_use]
    pub const fn shift(&self, line: u32) -> u32 {
        if line < self.old_end {
            line
        } else {
            line + self.new_end - self.old_end
        }
    }

    /// The line to patch alongside the error line when tolerating: the last
    /// line of the replacing range, which is where typing happens.
    #[inline]
    #[must_use]
    pub fn edited_line(&self) -> u32 {
        self.new_end.saturating_sub(1).max(self.start)
    }

    /// Smallest range covering both `self` and a later edit `next`, expressed
    /// against the text before `self`.
    #[must_use]
    pub fn merge(self, next: ChangedLines) -> ChangedLines {
        let start = self.start.min(next.start);
        // End of the union in the text between the two edits.
        let between = i64::from(self.new_end.max(next.old_end));
        let self_delta = i64::from(self.new_end) - i64::from(self.old_end);
        let next_delta = i64::from(next.new_end) - i64::from(next.old_end);
        let clamp = |line: i64| line.max(i64::from(start)) as u32;
        ChangedLines {
            start,
            old_end: clamp(between - self_delta),
            new_end: clamp(between + next_delta),
        }
    }
}

/// One version of a buffer as submitted for analysis.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Full text.
    pub text: Arc<str>,
    /// Lines changed since the previous snapshot. `None` means unknown.
    pub changed: Option<ChangedLines>,
}

impl Snapshot {
    /// A snapshot with no change hint.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            changed: None,
        }
    }

    /// A snapshot with a change hint.
    pub fn with_change(text: impl Into<Arc<str>>, changed: ChangedLines) -> Self {
        Self {
            text: text.into(),
            changed: Some(changed),
        }
    }
}

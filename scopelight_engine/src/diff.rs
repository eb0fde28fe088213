//! Minimal highlight updates between two analysis passes.

use crate::change::ChangedLines;
use scopelight_analysis::Highlight;
use scopelight_core::Position;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// A syntax error as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMark {
    /// Where the error is.
    pub position: Position,
    /// What went wrong.
    pub message: String,
}

/// One change to apply to a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOp {
    /// Draw a highlight.
    Add(Highlight),
    /// Erase a highlight.
    Remove(Highlight),
    /// Show the error indicator, replacing any shown one.
    MarkError(ErrorMark),
    /// Hide the error indicator.
    ClearError,
}

impl fmt::Display for DiffOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffOp::Add(hl) => write!(f, "+ {hl}"),
            DiffOp::Remove(hl) => write!(f, "- {hl}"),
            DiffOp::MarkError(mark) => write!(f, "! {} {}", mark.position, mark.message),
            DiffOp::ClearError => f.write_str("! clear"),
        }
    }
}

/// Operations turning `old` into `new`. Both must be sorted.
///
/// Highlights inside `changed` are replaced wholesale: every old one in the
/// old range is removed and every new one in the new range is added. The rest
/// is merged and equal pairs produce nothing. Without `changed` the merge
/// covers everything. All removes come before all adds.
#[tracing::instrument(level = "trace", skip_all, fields(old = old.len(), new = new.len()))]
pub fn diff(old: &[Highlight], new: &[Highlight], changed: Option<ChangedLines>) -> Vec<DiffOp> {
    let mut removed = Vec::new();
    let mut added = Vec::new();

    let (old_kept, old_replaced): (Vec<&Highlight>, Vec<&Highlight>) = old
        .iter()
        .partition(|hl| !changed.is_some_and(|c| c.in_old(hl.line)));
    let (new_kept, new_replaced): (Vec<&Highlight>, Vec<&Highlight>) = new
        .iter()
        .partition(|hl| !changed.is_some_and(|c| c.in_new(hl.line)));
    removed.extend(old_replaced);
    added.extend(new_replaced);

    let (mut i, mut j) = (0, 0);
    while i < old_kept.len() && j < new_kept.len() {
        match old_kept[i].cmp(new_kept[j]) {
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                removed.push(old_kept[i]);
                i += 1;
            }
            Ordering::Greater => {
                added.push(new_kept[j]);
                j += 1;
            }
        }
    }
    removed.extend_from_slice(&old_kept[i..]);
    added.extend_from_slice(&new_kept[j..]);

    tracing::trace!(removed = removed.len(), added = added.len(), "diff");
    removed
        .into_iter()
        .map(|hl| DiffOp::Remove(hl.clone()))
        .chain(added.into_iter().map(|hl| DiffOp::Add(hl.clone())))
        .collect()
}

/// Operations that erase everything in `old` and draw everything in `new`.
#[must_use]
pub fn redraw(old: &[Highlight], new: &[Highlight]) -> Vec<DiffOp> {
    old.iter()
        .cloned()
        .map(DiffOp::Remove)
        .chain(new.iter().cloned().map(DiffOp::Add))
        .collect()
}

/// Apply highlight operations to a set of drawn highlights. Error operations
/// are ignored.
pub fn apply(drawn: &mut BTreeSet<Highlight>, ops: &[DiffOp]) {
    for op in ops {
        match op {
            DiffOp::Add(hl) => {
                drawn.insert(hl.clone());
            }
            DiffOp::Remove(hl) => {
                drawn.remove(hl);
            }
            DiffOp::MarkError(_) | DiffOp::ClearError => {}
        }
    }
}

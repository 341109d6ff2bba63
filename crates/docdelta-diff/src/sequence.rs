//! Generic sequence diff: turns an edit script into domain records.
//!
//! [`diff_sequences`] is shared by every granularity (inline tokens,
//! paragraphs, tree entries, comments). Each granularity supplies a
//! [`SequenceHooks`] implementation that decides what "equal" means and how
//! added, deleted, and modified records are built. Beyond the raw
//! equal/insert/delete script, the walk supports:
//!
//! 1. equal-but-changed detection ([`SequenceHooks::equal_is_modification`]),
//! 2. re-pairing an adjacent delete + insert into one modification
//!    ([`SequenceHooks::can_pair`]),
//! 3. reordering the script before it is walked ([`SequenceHooks::reorder`]).

use serde::Serialize;
use tracing::trace;

use crate::myers::{edit_script, EditOp};

/// The three record shapes every granularity produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAction {
    Added,
    Deleted,
    Modified,
}

/// Hook set specializing [`diff_sequences`] for one item type.
///
/// Builders return `None` to suppress a record, e.g. when the item is
/// already covered by an ancestor's addition or deletion.
pub trait SequenceHooks<T> {
    /// The record type produced by the builders.
    type Record;

    /// Whether two items are the same item for the edit script.
    fn matches(&self, old: &T, new: &T) -> bool;

    /// Build a record for an inserted item.
    ///
    /// `old_index` is the insertion point in the old sequence and
    /// `previous_old` the old item immediately before it, if any.
    fn build_added(
        &mut self,
        item: &T,
        old_index: usize,
        previous_old: Option<&T>,
    ) -> Option<Self::Record>;

    /// Build a record for a deleted item at `old_index`.
    fn build_deleted(&mut self, item: &T, old_index: usize) -> Option<Self::Record>;

    /// Build a record for a matched or re-paired item.
    fn build_modified(&mut self, old: &T, new: &T, old_index: usize) -> Option<Self::Record>;

    /// Whether two matched items still need a modification record.
    fn equal_is_modification(&self, _old: &T, _new: &T) -> bool {
        false
    }

    /// Whether an adjacent deletion and insertion describe one edited item.
    fn can_pair(&self, _deleted: &T, _inserted: &T) -> bool {
        false
    }

    /// Rewrite the edit script before it is walked.
    fn reorder(&self, ops: Vec<EditOp>) -> Vec<EditOp> {
        ops
    }
}

/// Diff two sequences and collect the records built by `hooks`.
///
/// # Panics
///
/// Panics if [`SequenceHooks::reorder`] returns a script whose operation
/// counts no longer match the input lengths. That is a bug in the hook set,
/// not a property of the data.
pub fn diff_sequences<T, H>(old: &[T], new: &[T], hooks: &mut H) -> Vec<H::Record>
where
    H: SequenceHooks<T>,
{
    let ops = edit_script(old, new, |a, b| hooks.matches(a, b));
    let ops = hooks.reorder(ops);
    assert_script_fits(&ops, old.len(), new.len());

    let mut records = Vec::new();
    let (mut old_index, mut new_index) = (0usize, 0usize);
    let mut i = 0;

    while i < ops.len() {
        match ops[i] {
            EditOp::Equal => {
                let (o, n) = (&old[old_index], &new[new_index]);
                if hooks.equal_is_modification(o, n) {
                    records.extend(hooks.build_modified(o, n, old_index));
                }
                old_index += 1;
                new_index += 1;
            }
            EditOp::Delete => {
                let deleted = &old[old_index];
                let paired = ops.get(i + 1) == Some(&EditOp::Insert)
                    && hooks.can_pair(deleted, &new[new_index]);
                if paired {
                    trace!(old_index, new_index, "re-paired delete and insert");
                    records.extend(hooks.build_modified(deleted, &new[new_index], old_index));
                    old_index += 1;
                    new_index += 1;
                    i += 2;
                    continue;
                }
                records.extend(hooks.build_deleted(deleted, old_index));
                old_index += 1;
            }
            EditOp::Insert => {
                let previous = old_index.checked_sub(1).map(|p| &old[p]);
                records.extend(hooks.build_added(&new[new_index], old_index, previous));
                new_index += 1;
            }
        }
        i += 1;
    }

    records
}

fn assert_script_fits(ops: &[EditOp], old_len: usize, new_len: usize) {
    let equal = ops.iter().filter(|op| **op == EditOp::Equal).count();
    let deleted = ops.iter().filter(|op| **op == EditOp::Delete).count();
    let inserted = ops.len() - equal - deleted;
    assert!(
        equal + deleted == old_len && equal + inserted == new_len,
        "reordered edit script covers {} old / {} new items, expected {old_len} / {new_len}",
        equal + deleted,
        equal + inserted,
    );
}

/// Reorder hook that turns each run of changes into delete/insert pairs.
///
/// Inside every maximal run of non-equal operations, the i-th deletion is
/// placed directly before the i-th insertion so that pairing can consider
/// them; unpaired deletions, then unpaired insertions, follow.
///
/// ```rust
/// use docdelta_diff::myers::EditOp::{Delete as D, Equal as E, Insert as I};
/// use docdelta_diff::sequence::interleave_changes;
///
/// assert_eq!(interleave_changes(vec![E, D, D, I, I, I, E]), vec![E, D, I, D, I, I, E]);
/// ```
pub fn interleave_changes(ops: Vec<EditOp>) -> Vec<EditOp> {
    let mut out = Vec::with_capacity(ops.len());
    let mut deletes = 0usize;
    let mut inserts = 0usize;

    let flush = |out: &mut Vec<EditOp>, deletes: &mut usize, inserts: &mut usize| {
        let pairs = (*deletes).min(*inserts);
        for _ in 0..pairs {
            out.push(EditOp::Delete);
            out.push(EditOp::Insert);
        }
        out.extend(std::iter::repeat(EditOp::Delete).take(*deletes - pairs));
        out.extend(std::iter::repeat(EditOp::Insert).take(*inserts - pairs));
        *deletes = 0;
        *inserts = 0;
    };

    for op in ops {
        match op {
            EditOp::Delete => deletes += 1,
            EditOp::Insert => inserts += 1,
            EditOp::Equal => {
                flush(&mut out, &mut deletes, &mut inserts);
                out.push(EditOp::Equal);
            }
        }
    }
    flush(&mut out, &mut deletes, &mut inserts);
    out
}

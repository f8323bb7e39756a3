//! Revision synthesis: turn a classified batch into its replacement.
//!
//! The replacement batch carries the raw operations followed by the fix-ups
//! that make the edit reviewable: reinserted deletion fragments, verbatim
//! restores and insertion marks. Pending changes are processed in strictly
//! descending anchor order (ties in reverse emission order), and every
//! anchor is remapped through the partially built output before use, so
//! earlier positions stay put while later insertions shift the tail.

use chrono::{DateTime, Utc};

use crate::editing::batch::{BatchTags, EditBatch, EditOp};
use crate::editing::classify::PendingChange;
use crate::editing::mapping::{Assoc, Mapping, PosMap};
use crate::model::{Attribution, Mark, MarkId, RevisionKind, Run};

/// Build the replacement batch for a raw batch and its pending changes.
/// Returns the batch (tagged "processed") and the mark ids it allocated.
pub(crate) fn synthesize(
    batch: &EditBatch,
    pending: Vec<PendingChange>,
    author: &str,
    now: DateTime<Utc>,
) -> (EditBatch, Vec<MarkId>) {
    let mut ops = batch.ops.clone();
    let mut new_marks = Vec::new();

    // Descending anchors; reversing first makes the stable sort keep ties
    // in reverse emission order, so same-anchor reinsertions land in front
    // of one another and reading order is preserved.
    let mut items = pending;
    items.reverse();
    items.sort_by(|a, b| b.anchor().cmp(&a.anchor()));

    let mut out_map = Mapping::new();
    for change in items {
        match change {
            PendingChange::Insertion { anchor, text } => {
                let len = text.chars().count();
                if len == 0 {
                    continue;
                }
                let start = out_map.map(anchor, Assoc::Before);
                let range = start..start + len;
                let attr = Attribution::new(author, now);
                new_marks.push(attr.id);
                // Typing inside deleted text resolves the conflict as a new
                // insertion, never a stale deletion.
                ops.push(EditOp::StripRevision {
                    range: range.clone(),
                    kind: RevisionKind::Deletion,
                });
                ops.push(EditOp::AddMark {
                    range,
                    mark: Mark::Insertion(attr),
                });
            }
            PendingChange::RestoreDeleted { anchor, text, marks } => {
                let len = text.chars().count();
                if len == 0 {
                    continue;
                }
                let start = out_map.map(anchor, Assoc::Before);
                ops.push(EditOp::Replace {
                    range: start..start,
                    content: vec![Run::new(text, marks)],
                });
                out_map.push(PosMap {
                    start,
                    old_len: 0,
                    new_len: len,
                });
            }
            PendingChange::Deletion { anchor, fragments } => {
                if fragments.iter().all(|f| f.text.is_empty()) {
                    continue;
                }
                let attr = Attribution::new(author, now);
                new_marks.push(attr.id);
                let start = out_map.map(anchor, Assoc::Before);
                // Reverse order: each fragment lands in front of the one
                // inserted before it, reproducing reading order.
                for fragment in fragments.iter().rev() {
                    let len = fragment.text.chars().count();
                    if len == 0 {
                        continue;
                    }
                    let mut marks = fragment.marks.clone();
                    marks.push(Mark::Deletion(attr.clone()));
                    ops.push(EditOp::Replace {
                        range: start..start,
                        content: vec![Run::new(fragment.text.clone(), marks)],
                    });
                    out_map.push(PosMap {
                        start,
                        old_len: 0,
                        new_len: len,
                    });
                }
            }
        }
    }

    let replacement = EditBatch {
        ops,
        tags: BatchTags {
            processed: true,
            ..batch.tags
        },
    };
    (replacement, new_marks)
}

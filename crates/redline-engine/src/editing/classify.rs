//! Fragment classification: what did a deleting operation actually touch?
//!
//! For every structural operation the classifier maps the touched range back
//! to pre-batch coordinates, walks the original content run by run and sorts
//! each piece by provenance. The output is the ordered pending-change list
//! the synthesizer consumes; document order of the touched content survives
//! grouping so reinsertion can reproduce it exactly.

use crate::editing::batch::{content_text, EditBatch, EditOp};
use crate::editing::document::{Document, SliceItem};
use crate::editing::mapping::{map_to_post_batch, map_to_pre_batch, Assoc};
use crate::error::TrackError;
use crate::model::Mark;

/// Where a touched run came from, resolved once per run
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Provenance {
    /// Pending insertion by the current author; retyping over it discards it
    OwnInsertion,
    /// Pending insertion by someone else; becomes a deletion of theirs
    ForeignInsertion,
    /// Already deleted; restored verbatim with its attribution intact
    Deleted,
    /// Ordinary committed content
    Plain,
}

pub(crate) fn provenance(marks: &[Mark], author: &str) -> Provenance {
    for mark in marks {
        match mark {
            Mark::Insertion(attr) if attr.author == author => return Provenance::OwnInsertion,
            Mark::Insertion(_) => return Provenance::ForeignInsertion,
            Mark::Deletion(_) => return Provenance::Deleted,
            _ => {}
        }
    }
    Provenance::Plain
}

/// Original content plus its marks, extracted for reuse in synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub marks: Vec<Mark>,
}

/// One pending change of an interception cycle, anchored in post-batch
/// coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange {
    /// Content the batch removed that must resurface as a tracked deletion
    Deletion {
        anchor: usize,
        fragments: Vec<Fragment>,
    },
    /// Already-deleted content the batch passed through; reinserted verbatim
    RestoreDeleted {
        anchor: usize,
        text: String,
        marks: Vec<Mark>,
    },
    /// Content the batch inserted that must be marked as a tracked insertion
    Insertion { anchor: usize, text: String },
}

impl PendingChange {
    pub fn anchor(&self) -> usize {
        match self {
            PendingChange::Deletion { anchor, .. }
            | PendingChange::RestoreDeleted { anchor, .. }
            | PendingChange::Insertion { anchor, .. } => *anchor,
        }
    }
}

/// Classify every structural operation of a raw batch against the pre-batch
/// document.
pub(crate) fn classify_batch(
    doc: &Document,
    batch: &EditBatch,
    author: &str,
) -> Result<Vec<PendingChange>, TrackError> {
    let doc_len = doc.char_len();

    // Operation ranges are sequential; verify each against the length the
    // preceding operations produce before trusting any mapping.
    let mut running_len = doc_len;
    for op in &batch.ops {
        let map = op.pos_map();
        if let EditOp::Replace { range, .. } = op {
            if range.start > range.end || range.end > running_len {
                return Err(TrackError::MalformedBatch(format!(
                    "operation range {}..{} exceeds document length {running_len}",
                    range.start, range.end
                )));
            }
        }
        running_len = running_len - map.old_len + map.new_len;
    }

    let mut pending = Vec::new();
    for (i, op) in batch.ops.iter().enumerate() {
        let EditOp::Replace { range, content } = op else {
            continue;
        };

        let back = map_to_pre_batch(&batch.ops, i);
        let from = back.map(range.start, Assoc::Before);
        let to = back.map(range.end, Assoc::After);
        if from > to || to > doc_len {
            return Err(TrackError::MalformedBatch(format!(
                "operation maps to invalid pre-batch range {from}..{to}"
            )));
        }
        let anchor = map_to_post_batch(&batch.ops, i).map(range.start, Assoc::Before);

        let mut group: Vec<Fragment> = Vec::new();
        for item in doc.slice_items(from, to) {
            match item {
                SliceItem::Break => {
                    // Removed block break, representable as deletion text.
                    group.push(Fragment {
                        text: "\n".to_string(),
                        marks: Vec::new(),
                    });
                }
                SliceItem::Piece { text, marks } => match provenance(&marks, author) {
                    Provenance::OwnInsertion => {
                        // The one sanctioned discard: the author removing
                        // their own uncommitted insertion.
                    }
                    Provenance::ForeignInsertion => group.push(Fragment {
                        text,
                        marks: marks
                            .into_iter()
                            .filter(|m| !matches!(m, Mark::Insertion(_)))
                            .collect(),
                    }),
                    Provenance::Plain => group.push(Fragment { text, marks }),
                    Provenance::Deleted => {
                        if !group.is_empty() {
                            pending.push(PendingChange::Deletion {
                                anchor,
                                fragments: std::mem::take(&mut group),
                            });
                        }
                        pending.push(PendingChange::RestoreDeleted {
                            anchor,
                            text,
                            marks,
                        });
                    }
                },
            }
        }
        if !group.is_empty() {
            pending.push(PendingChange::Deletion {
                anchor,
                fragments: group,
            });
        }

        let inserted = content_text(content);
        if !inserted.is_empty() {
            pending.push(PendingChange::Insertion {
                anchor,
                text: inserted,
            });
        }
    }
    Ok(pending)
}

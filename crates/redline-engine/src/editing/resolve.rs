//! Resolution engine: accept or reject one revision by mark id.
//!
//! Mark locations are found by rebuilding an id→ranges index from a fresh
//! document walk on every command; nothing keeps back-pointers that could
//! dangle after structural edits. Every resulting batch is tagged
//! "resolution" so the guard filter never re-tracks it.

use crate::editing::batch::{BatchTags, EditBatch, EditOp};
use crate::editing::document::Document;
use crate::error::TrackError;
use crate::model::{MarkId, RevisionKind};

/// Accept an insertion: the mark goes, the text stays
pub fn accept_insertion(doc: &mut Document, id: MarkId) -> Result<bool, TrackError> {
    resolve(doc, id, RevisionKind::Insertion, Resolution::Strip)
}

/// Reject an insertion: the text goes with the mark
pub fn reject_insertion(doc: &mut Document, id: MarkId) -> Result<bool, TrackError> {
    resolve(doc, id, RevisionKind::Insertion, Resolution::Delete)
}

/// Accept a deletion: the text finally goes
pub fn accept_deletion(doc: &mut Document, id: MarkId) -> Result<bool, TrackError> {
    resolve(doc, id, RevisionKind::Deletion, Resolution::Delete)
}

/// Reject a deletion: the mark goes, the text stays; restored block breaks
/// expand back into real splits during normalization
pub fn reject_deletion(doc: &mut Document, id: MarkId) -> Result<bool, TrackError> {
    resolve(doc, id, RevisionKind::Deletion, Resolution::Strip)
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Resolution {
    Strip,
    Delete,
}

fn resolve(
    doc: &mut Document,
    id: MarkId,
    expected: RevisionKind,
    resolution: Resolution,
) -> Result<bool, TrackError> {
    let (kind, ranges) = match doc.revision_ranges(id) {
        Ok(found) => found,
        Err(TrackError::MarkNotFound(_)) => return Ok(false),
        Err(e) => return Err(e),
    };
    if kind != expected {
        return Ok(false);
    }

    let ops = match resolution {
        // Deletes go back to front so earlier ranges stay valid; there is
        // no transactional rollback primitive to lean on.
        Resolution::Delete => ranges
            .into_iter()
            .rev()
            .map(|range| EditOp::Replace {
                range,
                content: Vec::new(),
            })
            .collect(),
        Resolution::Strip => ranges
            .into_iter()
            .map(|range| EditOp::StripRevision {
                range,
                kind: expected,
            })
            .collect(),
    };
    let batch = EditBatch::new(ops).with_tags(BatchTags {
        resolution: true,
        ..Default::default()
    });
    doc.commit(&batch)?;
    Ok(true)
}

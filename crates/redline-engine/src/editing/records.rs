//! Outward ChangeRecord projection.
//!
//! A derived, serializable view of every unresolved revision in document
//! order, for external navigation and accept/reject UI. Records are rebuilt
//! from a fresh walk on every query and never stored.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::editing::document::Document;
use crate::model::{MarkId, RevisionKind};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    Insertion,
    Deletion,
    FormatChange,
}

/// Externally visible projection of one unresolved revision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub id: MarkId,
    pub kind: ChangeKind,
    pub author: String,
    pub date: DateTime<Utc>,
    pub text: String,
    pub range: std::ops::Range<usize>,
}

/// All unresolved revisions in document order
pub fn change_records(doc: &Document) -> Vec<ChangeRecord> {
    let mut records: Vec<ChangeRecord> = doc
        .revision_spans()
        .into_iter()
        .map(|span| ChangeRecord {
            id: span.id,
            kind: match span.kind {
                RevisionKind::Insertion => ChangeKind::Insertion,
                RevisionKind::Deletion => ChangeKind::Deletion,
            },
            author: span.author,
            date: span.date,
            text: span.text,
            range: span.range,
        })
        .collect();

    for span in &doc.leaf_spans() {
        let leaf = doc.node(&span.path);
        if let Some(snapshot) = &leaf.attrs.pending_format {
            records.push(ChangeRecord {
                id: snapshot.id,
                kind: ChangeKind::FormatChange,
                author: snapshot.author.clone(),
                date: snapshot.date,
                text: leaf.text(),
                range: span.start..span.end(),
            });
        }
    }

    records.sort_by_key(|r| r.range.start);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::batch::EditBatch;
    use crate::editing::format::FormatCommand;
    use crate::editing::tracker::{ChangeTracker, TrackingConfig};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
    }

    #[test]
    fn test_records_cover_all_kinds_in_document_order() {
        let mut doc = Document::from_paragraphs(["alpha beta", "gamma delta"]);
        let tracker = ChangeTracker::new(TrackingConfig::new("alice"));

        // Delete "delta" (para 2, local 6..11 -> global 17..22), then insert
        // into para 1, then a format change on para 1.
        tracker
            .process_at(&mut doc, EditBatch::delete(17..22), now())
            .expect("delete");
        tracker
            .process_at(&mut doc, EditBatch::insert(5, "new "), now())
            .expect("insert");
        let block = doc.leaf_blocks()[0].id;
        tracker
            .format_at(
                &mut doc,
                FormatCommand {
                    block,
                    new_style: Some("Quote".to_string()),
                    new_level: None,
                },
                now(),
            )
            .expect("format");

        let records = change_records(&doc);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].kind, ChangeKind::FormatChange);
        assert_eq!(records[0].range.start, 0);
        assert_eq!(records[1].kind, ChangeKind::Insertion);
        assert_eq!(records[1].text, "new ");
        assert_eq!(records[1].author, "alice");
        assert_eq!(records[2].kind, ChangeKind::Deletion);
        assert_eq!(records[2].text, "delta");
        assert!(
            records[1].range.start < records[2].range.start,
            "Records come out in document order"
        );
    }

    #[test]
    fn test_no_marks_no_records() {
        let doc = Document::from_paragraphs(["plain"]);
        assert!(change_records(&doc).is_empty());
    }

    #[test]
    fn test_cross_block_deletion_text_keeps_break() {
        let mut doc = Document::from_paragraphs(["Hello", "World"]);
        let tracker = ChangeTracker::new(TrackingConfig::new("bob"));
        tracker
            .process_at(&mut doc, EditBatch::delete(3..8), now())
            .expect("delete");

        let records = change_records(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "lo\nWo");
        assert_eq!(records[0].range, 3..8);
    }
}

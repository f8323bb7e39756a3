//! The interception pipeline: guard → classify → synthesize → commit.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::editing::batch::EditBatch;
use crate::editing::classify::classify_batch;
use crate::editing::document::Document;
use crate::editing::filter::should_intercept;
use crate::editing::patch::Patch;
use crate::editing::synthesize::synthesize;
use crate::error::TrackError;

/// Author and enable state, read once per processed batch.
///
/// Owned by the pipeline instance so several documents can run independent
/// tracking configurations in one process; there is no global state.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    pub enabled: bool,
    pub author: String,
}

impl TrackingConfig {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            enabled: true,
            author: author.into(),
        }
    }

    pub fn disabled(author: impl Into<String>) -> Self {
        Self {
            enabled: false,
            author: author.into(),
        }
    }
}

/// Transforms raw edit batches into tracked, reviewable revisions.
///
/// One tracker owns one document's tracking configuration. `process` either
/// commits the batch untouched (guard-filtered) or commits the synthesized
/// replacement; in both cases exactly one version is produced and the
/// returned [`Patch`] lists any allocated revision marks directly.
///
/// ```rust
/// use redline_engine::editing::{ChangeTracker, Document, EditBatch, TrackingConfig};
///
/// let mut doc = Document::from_paragraphs(["a."]);
/// let tracker = ChangeTracker::new(TrackingConfig::new("alice"));
/// let patch = tracker.process(&mut doc, EditBatch::insert(1, "b")).unwrap();
///
/// assert_eq!(doc.text(), "ab.");
/// assert_eq!(patch.new_marks.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    pub config: TrackingConfig,
}

impl ChangeTracker {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    /// Process one batch with the current wall-clock timestamp
    pub fn process(&self, doc: &mut Document, batch: EditBatch) -> Result<Patch, TrackError> {
        self.process_at(doc, batch, Utc::now())
    }

    /// Process one batch, attributing new marks to the given timestamp
    pub fn process_at(
        &self,
        doc: &mut Document,
        batch: EditBatch,
        now: DateTime<Utc>,
    ) -> Result<Patch, TrackError> {
        if !should_intercept(&self.config, &batch) {
            debug!(ops = batch.ops.len(), "batch exempt from tracking");
            return doc.commit(&batch);
        }
        match classify_batch(doc, &batch, &self.config.author) {
            Ok(pending) => {
                let (replacement, new_marks) =
                    synthesize(&batch, pending, &self.config.author, now);
                debug!(
                    raw_ops = batch.ops.len(),
                    replacement_ops = replacement.ops.len(),
                    marks = new_marks.len(),
                    "intercepted edit batch"
                );
                let mut patch = doc.commit(&replacement)?;
                patch.new_marks = new_marks;
                Ok(patch)
            }
            Err(TrackError::MalformedBatch(reason)) => {
                // The user's edit still applies, it just loses attribution.
                warn!(%reason, "malformed batch, degrading to untracked passthrough");
                doc.commit(&batch)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::batch::{BatchTags, EditOp};
    use crate::model::{Attribution, BlockNode, Mark, RevisionKind, Run};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
    }

    fn tracker(author: &str) -> ChangeTracker {
        ChangeTracker::new(TrackingConfig::new(author))
    }

    // ============ Tracked insertion ============

    #[test]
    fn test_tracked_insertion_wraps_typed_text() {
        let mut doc = Document::from_paragraphs(["a."]);
        let patch = tracker("alice")
            .process_at(&mut doc, EditBatch::insert(1, "b"), now())
            .expect("process");

        assert_eq!(doc.text(), "ab.");
        assert_eq!(patch.new_marks.len(), 1);
        let runs = &doc.leaf_blocks()[0].runs;
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].text, "a");
        assert_eq!(runs[1].text, "b");
        assert!(runs[1].has_revision(RevisionKind::Insertion));
        assert_eq!(runs[2].text, ".");
        assert!(runs[0].marks.is_empty() && runs[2].marks.is_empty());
    }

    // ============ Tracked deletion ============

    #[test]
    fn test_tracked_deletion_keeps_text_marked() {
        let mut doc = Document::from_paragraphs(["The cat sat."]);
        let patch = tracker("bob")
            .process_at(&mut doc, EditBatch::delete(4..7), now())
            .expect("process");

        assert_eq!(doc.text(), "The cat sat.", "Deleted text stays visible");
        assert_eq!(patch.new_marks.len(), 1);
        let runs = &doc.leaf_blocks()[0].runs;
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1].text, "cat");
        assert!(runs[1].has_revision(RevisionKind::Deletion));
        let spans = doc.revision_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].author, "bob");
        assert_eq!(spans[0].range, 4..7);
    }

    // ============ Cross-author interaction ============

    #[test]
    fn test_deleting_foreign_insertion_flips_the_mark() {
        let mut doc = Document::new(vec![BlockNode::paragraph(vec![
            Run::plain("a "),
            Run::new("red", vec![Mark::Insertion(Attribution::new("alice", now()))]),
            Run::plain(" b"),
        ])]);
        tracker("bob")
            .process_at(&mut doc, EditBatch::delete(2..5), now())
            .expect("process");

        assert_eq!(doc.text(), "a red b", "Never silently dropped");
        let spans = doc.revision_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, RevisionKind::Deletion);
        assert_eq!(spans[0].author, "bob");
        assert_eq!(spans[0].text, "red");
    }

    // ============ Self-undo collapse ============

    #[test]
    fn test_own_insertion_then_deletion_collapses() {
        let mut doc = Document::from_paragraphs(["a."]);
        let t = tracker("alice");
        t.process_at(&mut doc, EditBatch::insert(1, "b"), now())
            .expect("insert");
        let patch = t
            .process_at(&mut doc, EditBatch::delete(1..2), now())
            .expect("delete");

        assert_eq!(doc.text(), "a.", "Back to the pre-insert state");
        assert!(doc.revision_spans().is_empty(), "No deletion mark left behind");
        assert!(patch.new_marks.is_empty());
        assert_eq!(doc.leaf_blocks()[0].runs.len(), 1);
    }

    // ============ Typing inside deleted text ============

    #[test]
    fn test_typing_inside_deletion_resolves_as_insertion() {
        let del = Mark::Deletion(Attribution::new("bob", now()));
        let mut doc = Document::new(vec![BlockNode::paragraph(vec![
            Run::plain("The "),
            Run::new("cat", vec![del.clone()]),
            Run::plain(" sat."),
        ])]);
        // The host surface inherits context marks, so the typed content
        // arrives carrying bob's deletion mark.
        let batch = EditBatch::replace(7..7, vec![Run::new("dog", vec![del])]);
        tracker("alice")
            .process_at(&mut doc, batch, now())
            .expect("process");

        assert_eq!(doc.text(), "The catdog sat.");
        let spans = doc.revision_spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].kind, RevisionKind::Deletion);
        assert_eq!(spans[0].text, "cat");
        assert_eq!(spans[1].kind, RevisionKind::Insertion);
        assert_eq!(spans[1].text, "dog");
        assert_eq!(spans[1].author, "alice", "Stale deletion replaced by a new insertion");
    }

    // ============ Replacement (delete + insert in one op) ============

    #[test]
    fn test_replacement_shows_deletion_before_insertion() {
        let mut doc = Document::from_paragraphs(["Hello World"]);
        let batch = EditBatch::replace(0..5, vec![Run::plain("Goodbye")]);
        tracker("alice")
            .process_at(&mut doc, batch, now())
            .expect("process");

        assert_eq!(doc.text(), "HelloGoodbye World");
        let spans = doc.revision_spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Hello");
        assert_eq!(spans[0].kind, RevisionKind::Deletion);
        assert_eq!(spans[1].text, "Goodbye");
        assert_eq!(spans[1].kind, RevisionKind::Insertion);
    }

    // ============ Content conservation ============

    #[test]
    fn test_content_conservation() {
        let mut doc = Document::from_paragraphs(["Hello World"]);
        let before = doc.char_len();
        let inserted = "Goodbye".chars().count();
        tracker("alice")
            .process_at(
                &mut doc,
                EditBatch::replace(0..5, vec![Run::plain("Goodbye")]),
                now(),
            )
            .expect("process");
        assert_eq!(
            doc.char_len(),
            before + inserted,
            "Nothing touched may be dropped while marks are unresolved"
        );
    }

    // ============ Guard filter behaviour ============

    #[test]
    fn test_processed_batch_reentry_adds_no_marks() {
        let mut doc = Document::from_paragraphs(["abc"]);
        let batch = EditBatch::insert(0, "x").with_tags(BatchTags {
            processed: true,
            ..Default::default()
        });
        let patch = tracker("alice")
            .process_at(&mut doc, batch, now())
            .expect("process");
        assert_eq!(doc.text(), "xabc", "The edit still applies");
        assert!(patch.new_marks.is_empty());
        assert!(doc.revision_spans().is_empty());
    }

    #[test]
    fn test_disabled_tracking_applies_unmarked() {
        let mut doc = Document::from_paragraphs(["abc"]);
        let t = ChangeTracker::new(TrackingConfig::disabled("alice"));
        t.process_at(&mut doc, EditBatch::delete(0..1), now())
            .expect("process");
        assert_eq!(doc.text(), "bc");
        assert!(doc.revision_spans().is_empty());
    }

    #[test]
    fn test_malformed_batch_degrades_to_passthrough() {
        let mut doc = Document::from_paragraphs(["abc"]);
        let patch = tracker("alice")
            .process_at(&mut doc, EditBatch::delete(0..99), now())
            .expect("process");
        assert_eq!(doc.text(), "abc", "Out-of-range op skipped by the commit");
        assert!(patch.new_marks.is_empty());
        assert!(doc.revision_spans().is_empty());
    }

    // ============ Cursor reconciliation ============

    #[test]
    fn test_cursor_lands_after_typed_text() {
        let mut doc = Document::from_paragraphs(["The sat."]);
        doc.set_selection(4..4);
        let patch = tracker("alice")
            .process_at(&mut doc, EditBatch::insert(4, "cat"), now())
            .expect("process");
        assert_eq!(doc.text(), "The cat sat.");
        assert_eq!(patch.new_selection, 7..7, "Cursor sits at the end of the insertion");
    }

    #[test]
    fn test_cursor_after_tracked_deletion() {
        let mut doc = Document::from_paragraphs(["The cat sat."]);
        doc.set_selection(7..7);
        let patch = tracker("bob")
            .process_at(&mut doc, EditBatch::delete(4..7), now())
            .expect("process");
        assert_eq!(
            patch.new_selection,
            7..7,
            "Cursor ends up after the struck-through text"
        );
    }

    // ============ Multi-operation batches ============

    #[test]
    fn test_multi_op_batch_tracks_each_span() {
        let mut doc = Document::from_paragraphs(["The cat sat"]);
        let batch = EditBatch::new(vec![
            EditOp::Replace {
                range: 0..3,
                content: vec![Run::plain("Their")],
            },
            // Post-op-0 coordinates for "sat".
            EditOp::Replace {
                range: 10..13,
                content: vec![Run::plain("dogs")],
            },
        ]);
        let patch = tracker("alice")
            .process_at(&mut doc, batch, now())
            .expect("process");

        assert_eq!(doc.text(), "TheTheir cat satdogs");
        assert_eq!(patch.new_marks.len(), 4);
        let spans = doc.revision_spans();
        let texts: Vec<(&str, RevisionKind)> = spans
            .iter()
            .map(|s| (s.text.as_str(), s.kind))
            .collect();
        assert_eq!(
            texts,
            vec![
                ("The", RevisionKind::Deletion),
                ("Their", RevisionKind::Insertion),
                ("sat", RevisionKind::Deletion),
                ("dogs", RevisionKind::Insertion),
            ]
        );
    }
}

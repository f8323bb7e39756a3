//! Edit operations and batches.
//!
//! A raw batch from the host carries only `Replace` operations; the
//! synthesizer's replacement batch may additionally carry the mark-level
//! operations, which are position-map identities.

use crate::editing::mapping::PosMap;
use crate::model::{Mark, RevisionKind, Run};

/// One operation of an edit batch. Ranges are in the coordinate space
/// produced by the preceding operations of the same batch.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    /// Replace a span with a run sequence (either side may be empty)
    Replace {
        range: std::ops::Range<usize>,
        content: Vec<Run>,
    },
    /// Apply a mark across a span
    AddMark {
        range: std::ops::Range<usize>,
        mark: Mark,
    },
    /// Remove revision marks of one kind across a span
    StripRevision {
        range: std::ops::Range<usize>,
        kind: RevisionKind,
    },
}

impl EditOp {
    /// The forward position map of this operation
    pub fn pos_map(&self) -> PosMap {
        match self {
            EditOp::Replace { range, content } => PosMap {
                start: range.start,
                old_len: range.len(),
                new_len: content_char_len(content),
            },
            EditOp::AddMark { .. } | EditOp::StripRevision { .. } => PosMap::identity(),
        }
    }

    /// Whether this operation changes document content (not just marks)
    pub fn is_structural(&self) -> bool {
        match self {
            EditOp::Replace { range, content } => {
                !range.is_empty() || content_char_len(content) > 0
            }
            _ => false,
        }
    }
}

/// Total char length of a run sequence
pub fn content_char_len(content: &[Run]) -> usize {
    content.iter().map(Run::char_len).sum()
}

/// Flattened literal text of a run sequence
pub fn content_text(content: &[Run]) -> String {
    content.iter().map(|r| r.text.as_str()).collect()
}

/// Boolean flags the Guard Filter reads to decide whether a batch may be
/// intercepted at all
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BatchTags {
    /// Already went through the synthesizer; never re-track
    pub processed: bool,
    /// Produced by an accept/reject resolution command
    pub resolution: bool,
    /// Produced by undo/redo; must not be re-annotated as a new edit
    pub history: bool,
}

impl BatchTags {
    /// Whether any exemption flag is set
    pub fn exempt(&self) -> bool {
        self.processed || self.resolution || self.history
    }
}

/// One atomic set of operations submitted together
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditBatch {
    pub ops: Vec<EditOp>,
    pub tags: BatchTags,
}

impl EditBatch {
    pub fn new(ops: Vec<EditOp>) -> Self {
        Self {
            ops,
            tags: BatchTags::default(),
        }
    }

    /// Single-operation batch inserting text at a position
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(vec![EditOp::Replace {
            range: at..at,
            content: vec![Run::plain(text)],
        }])
    }

    /// Single-operation batch deleting a range
    pub fn delete(range: std::ops::Range<usize>) -> Self {
        Self::new(vec![EditOp::Replace {
            range,
            content: Vec::new(),
        }])
    }

    /// Single-operation batch replacing a range with a run sequence
    pub fn replace(range: std::ops::Range<usize>, content: Vec<Run>) -> Self {
        Self::new(vec![EditOp::Replace { range, content }])
    }

    pub fn with_tags(mut self, tags: BatchTags) -> Self {
        self.tags = tags;
        self
    }

    /// Whether any operation changes document content
    pub fn has_content_change(&self) -> bool {
        self.ops.iter().any(EditOp::is_structural)
    }
}

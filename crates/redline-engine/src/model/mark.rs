use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Unique identifier for a revision mark or format-change snapshot
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub struct MarkId(pub Uuid);

impl MarkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MarkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The two run-level revision kinds
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub enum RevisionKind {
    Insertion,
    Deletion,
}

/// Who made a pending revision, and when
#[derive(Clone, Debug, PartialEq)]
pub struct Attribution {
    pub id: MarkId,
    pub author: String,
    pub date: DateTime<Utc>,
}

impl Attribution {
    /// Create an attribution with a freshly allocated mark id
    pub fn new(author: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: MarkId::new(),
            author: author.into(),
            date,
        }
    }
}

/// Inline mark attached to a run (ADR: closed set, no string-typed marks)
///
/// A run may carry any number of formatting marks but at most one revision
/// mark (`Insertion` or `Deletion`); `Document` mutations enforce that
/// invariant when marks are applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Mark {
    Bold,
    Italic,
    Insertion(Attribution),
    Deletion(Attribution),
}

impl Mark {
    /// Whether this is a revision mark rather than plain formatting
    pub fn is_revision(&self) -> bool {
        matches!(self, Mark::Insertion(_) | Mark::Deletion(_))
    }

    /// The revision kind, if this is a revision mark
    pub fn revision_kind(&self) -> Option<RevisionKind> {
        match self {
            Mark::Insertion(_) => Some(RevisionKind::Insertion),
            Mark::Deletion(_) => Some(RevisionKind::Deletion),
            _ => None,
        }
    }

    /// The attribution carried by a revision mark
    pub fn attribution(&self) -> Option<&Attribution> {
        match self {
            Mark::Insertion(attr) | Mark::Deletion(attr) => Some(attr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
    }

    #[test]
    fn test_mark_ids_are_unique() {
        let a = MarkId::new();
        let b = MarkId::new();
        assert_ne!(a, b, "Two allocated mark ids should differ");
    }

    #[test]
    fn test_revision_kind_classification() {
        let attr = Attribution::new("alice", date());
        assert_eq!(
            Mark::Insertion(attr.clone()).revision_kind(),
            Some(RevisionKind::Insertion)
        );
        assert_eq!(
            Mark::Deletion(attr).revision_kind(),
            Some(RevisionKind::Deletion)
        );
        assert_eq!(Mark::Bold.revision_kind(), None);
        assert_eq!(Mark::Italic.revision_kind(), None);
    }

    #[test]
    fn test_formatting_marks_are_not_revisions() {
        assert!(!Mark::Bold.is_revision());
        assert!(!Mark::Italic.is_revision());
        assert!(Mark::Insertion(Attribution::new("a", date())).is_revision());
    }

    #[test]
    fn test_attribution_allocates_fresh_id() {
        let a = Attribution::new("alice", date());
        let b = Attribution::new("alice", date());
        assert_ne!(a.id, b.id);
        assert_eq!(a.author, "alice");
    }
}

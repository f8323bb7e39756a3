use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::mark::{Mark, MarkId, RevisionKind};

/// Stable identifier for a block node, assigned at creation and never
/// reassigned while the node's content exists
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct BlockId(pub Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier shared by every member of a numbering series
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SeriesId(pub Uuid);

impl SeriesId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SeriesId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A maximal contiguous span of inline text sharing one mark set
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub text: String,
    pub marks: Vec<Mark>,
}

impl Run {
    pub fn new(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// A run with no marks at all
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The single revision mark this run carries, if any
    pub fn revision(&self) -> Option<&Mark> {
        self.marks.iter().find(|m| m.is_revision())
    }

    /// Whether this run carries a revision mark of the given kind
    pub fn has_revision(&self, kind: RevisionKind) -> bool {
        self.revision().and_then(Mark::revision_kind) == Some(kind)
    }

    /// Marks with every revision mark removed (formatting survives)
    pub fn formatting_marks(&self) -> Vec<Mark> {
        self.marks
            .iter()
            .filter(|m| !m.is_revision())
            .cloned()
            .collect()
    }
}

/// Block node type; `Paragraph` and `Heading` are the leaf kinds that carry
/// runs, the table kinds are containers
#[derive(Clone, Debug, PartialEq)]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    Table,
    TableRow,
    TableCell,
}

impl BlockKind {
    pub fn is_leaf(&self) -> bool {
        matches!(self, BlockKind::Paragraph | BlockKind::Heading { .. })
    }
}

/// Numbering assignment: which series a block belongs to and at which
/// indentation level it is numbered
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Numbering {
    pub series: SeriesId,
    pub level: u8,
}

/// Pending format change, snapshotted before new attributes were applied.
/// A node holds at most one; a newer tracked change replaces it.
#[derive(Clone, Debug, PartialEq)]
pub struct FormatSnapshot {
    pub id: MarkId,
    pub author: String,
    pub date: DateTime<Utc>,
    pub old_style: Option<String>,
    pub old_level: Option<u8>,
}

/// Block-level attributes
#[derive(Clone, Debug, PartialEq, Default)]
pub struct BlockAttrs {
    /// Named paragraph style, e.g. "Heading 1"
    pub style: Option<String>,
    /// Numbering series membership
    pub numbering: Option<Numbering>,
    /// Computed numbering label, e.g. "2.a." (written by renumbering)
    pub label: Option<String>,
    /// At most one unresolved format change
    pub pending_format: Option<FormatSnapshot>,
}

/// A node in the document tree. Leaf kinds hold `runs`; container kinds hold
/// `children` and keep `runs` empty.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockNode {
    pub id: BlockId,
    pub kind: BlockKind,
    pub attrs: BlockAttrs,
    pub runs: Vec<Run>,
    pub children: Vec<BlockNode>,
}

impl BlockNode {
    pub fn paragraph(runs: Vec<Run>) -> Self {
        Self {
            id: BlockId::new(),
            kind: BlockKind::Paragraph,
            attrs: BlockAttrs::default(),
            runs,
            children: Vec::new(),
        }
    }

    pub fn heading(level: u8, runs: Vec<Run>) -> Self {
        Self {
            id: BlockId::new(),
            kind: BlockKind::Heading { level },
            attrs: BlockAttrs::default(),
            runs,
            children: Vec::new(),
        }
    }

    pub fn table(rows: Vec<BlockNode>) -> Self {
        Self::container(BlockKind::Table, rows)
    }

    pub fn table_row(cells: Vec<BlockNode>) -> Self {
        Self::container(BlockKind::TableRow, cells)
    }

    pub fn table_cell(content: Vec<BlockNode>) -> Self {
        Self::container(BlockKind::TableCell, content)
    }

    fn container(kind: BlockKind, children: Vec<BlockNode>) -> Self {
        Self {
            id: BlockId::new(),
            kind,
            attrs: BlockAttrs::default(),
            runs: Vec::new(),
            children,
        }
    }

    /// Attach a named style
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.attrs.style = Some(style.into());
        self
    }

    /// Join a numbering series at the given level
    pub fn with_numbering(mut self, series: SeriesId, level: u8) -> Self {
        self.attrs.numbering = Some(Numbering { series, level });
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    /// Concatenated run text of a leaf (empty for containers)
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn char_len(&self) -> usize {
        self.runs.iter().map(Run::char_len).sum()
    }

    /// Merge adjacent runs with identical mark sets and drop empty runs
    pub fn coalesce(&mut self) {
        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }
}

/// Substring of `text` by char offsets (positions are chars, not bytes)
pub(crate) fn char_slice(text: &str, from: usize, to: usize) -> String {
    text.chars().skip(from).take(to.saturating_sub(from)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mark::Attribution;
    use chrono::DateTime;

    fn insertion(author: &str) -> Mark {
        let date = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        Mark::Insertion(Attribution::new(author, date))
    }

    // ============ Run tests ============

    #[test]
    fn test_run_char_len_counts_chars_not_bytes() {
        assert_eq!(Run::plain("héllo").char_len(), 5);
        assert_eq!(Run::plain("世界").char_len(), 2);
    }

    #[test]
    fn test_run_revision_lookup() {
        let run = Run::new("x", vec![Mark::Bold, insertion("alice")]);
        assert!(run.revision().is_some());
        assert!(run.has_revision(RevisionKind::Insertion));
        assert!(!run.has_revision(RevisionKind::Deletion));
        assert_eq!(run.formatting_marks(), vec![Mark::Bold]);
    }

    // ============ BlockNode tests ============

    #[test]
    fn test_leaf_text_concatenates_runs() {
        let para = BlockNode::paragraph(vec![Run::plain("Hello "), Run::plain("world")]);
        assert_eq!(para.text(), "Hello world");
        assert_eq!(para.char_len(), 11);
        assert!(para.is_leaf());
    }

    #[test]
    fn test_container_kinds_are_not_leaves() {
        let cell = BlockNode::table_cell(vec![BlockNode::paragraph(vec![])]);
        let row = BlockNode::table_row(vec![cell]);
        let table = BlockNode::table(vec![row]);
        assert!(!table.is_leaf());
        assert_eq!(table.text(), "");
    }

    #[test]
    fn test_coalesce_merges_equal_mark_sets() {
        let mark = insertion("alice");
        let mut para = BlockNode::paragraph(vec![
            Run::plain("a"),
            Run::plain("b"),
            Run::new("c", vec![mark.clone()]),
            Run::new("d", vec![mark]),
            Run::plain(""),
        ]);
        para.coalesce();
        assert_eq!(para.runs.len(), 2);
        assert_eq!(para.runs[0].text, "ab");
        assert_eq!(para.runs[1].text, "cd");
    }

    #[test]
    fn test_coalesce_keeps_distinct_attributions_apart() {
        let mut para = BlockNode::paragraph(vec![
            Run::new("a", vec![insertion("alice")]),
            Run::new("b", vec![insertion("bob")]),
        ]);
        para.coalesce();
        assert_eq!(para.runs.len(), 2, "Different mark ids should not merge");
    }

    #[test]
    fn test_char_slice_is_char_based() {
        assert_eq!(char_slice("héllo", 1, 3), "él");
        assert_eq!(char_slice("abc", 0, 10), "abc");
        assert_eq!(char_slice("abc", 2, 1), "");
    }
}

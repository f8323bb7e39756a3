use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::editing::batch::{EditBatch, EditOp};
use crate::editing::mapping::{Assoc, Mapping, PosMap};
use crate::editing::numbering::SeriesFormat;
use crate::editing::patch::Patch;
use crate::error::TrackError;
use crate::model::node::char_slice;
use crate::model::{
    BlockAttrs, BlockId, BlockNode, Mark, MarkId, RevisionKind, Run, SeriesId,
};

/// The tracked document: a tree of block nodes addressed through flattened
/// coordinates.
///
/// ## Flattened coordinates
///
/// Every position, range and position map in this crate is a char offset
/// into the concatenation of the leaf blocks' texts joined by a single
/// block-break character. A break between two leaves therefore occupies
/// exactly one position, which is what lets a removed paragraph break be
/// carried as a literal `\n` inside a pending deletion without shifting any
/// coordinate.
///
/// ## Literal break invariant
///
/// A literal `\n` may appear inside a run's text only under a Deletion mark.
/// `normalize` (run after every operation) expands any other literal `\n`
/// into a real block split, so rejecting a multi-paragraph deletion restores
/// the original block structure as a side effect of stripping the mark.
///
/// ## Committing
///
/// `commit` applies a whole batch to a scratch copy of the tree and swaps it
/// in only if every non-skippable operation succeeded, so a failed batch
/// leaves the prior document intact. Out-of-range operations are skipped
/// with a warning rather than failing the batch (§ error design).
///
/// ```rust
/// use redline_engine::editing::{Document, EditBatch};
///
/// let mut doc = Document::from_paragraphs(["Hello", "World"]);
/// assert_eq!(doc.text(), "Hello\nWorld");
///
/// let patch = doc.commit(&EditBatch::insert(5, "!")).unwrap();
/// assert_eq!(doc.text(), "Hello!\nWorld");
/// assert_eq!(patch.version, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub(crate) blocks: Vec<BlockNode>,
    /// Current selection as flattened char offsets
    pub(crate) selection: std::ops::Range<usize>,
    /// Version counter incremented on each commit
    pub(crate) version: u64,
    /// Per-series numbering label formats
    pub(crate) series_formats: HashMap<SeriesId, SeriesFormat>,
}

/// Location and extent of one leaf in flattened coordinates
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LeafSpan {
    pub path: Vec<usize>,
    pub start: usize,
    pub len: usize,
}

impl LeafSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// One classified piece of a flattened slice: run content or a block break
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SliceItem {
    Piece { text: String, marks: Vec<Mark> },
    Break,
}

/// A maximal group of adjacent runs sharing one revision mark, in document
/// order; the raw material of the ChangeRecord projection and the
/// resolution engine's per-query index
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionSpan {
    pub id: MarkId,
    pub kind: RevisionKind,
    pub author: String,
    pub date: DateTime<Utc>,
    pub text: String,
    pub range: std::ops::Range<usize>,
}

impl Document {
    pub fn new(blocks: Vec<BlockNode>) -> Self {
        Self {
            blocks,
            selection: 0..0,
            version: 0,
            series_formats: HashMap::new(),
        }
    }

    /// Convenience constructor: one unmarked paragraph per string
    pub fn from_paragraphs<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            texts
                .into_iter()
                .map(|t| BlockNode::paragraph(vec![Run::plain(t)]))
                .collect(),
        )
    }

    pub fn blocks(&self) -> &[BlockNode] {
        &self.blocks
    }

    /// All leaf blocks in document order
    pub fn leaf_blocks(&self) -> Vec<&BlockNode> {
        self.leaf_spans()
            .iter()
            .map(|span| self.node(&span.path))
            .collect()
    }

    /// Flattened document text, leaves joined by block breaks
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (k, span) in self.leaf_spans().iter().enumerate() {
            if k > 0 {
                out.push('\n');
            }
            out.push_str(&self.node(&span.path).text());
        }
        out
    }

    /// Total char length in flattened coordinates
    pub fn char_len(&self) -> usize {
        self.leaf_spans().last().map(LeafSpan::end).unwrap_or(0)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> std::ops::Range<usize> {
        self.selection.clone()
    }

    pub fn set_selection(&mut self, selection: std::ops::Range<usize>) {
        self.selection = selection;
    }

    /// Configure the label formats of a numbering series
    pub fn set_series_format(&mut self, series: SeriesId, format: SeriesFormat) {
        self.series_formats.insert(series, format);
    }

    pub(crate) fn series_format(&self, series: SeriesId) -> SeriesFormat {
        self.series_formats.get(&series).cloned().unwrap_or_default()
    }

    // ---- tree addressing ----------------------------------------------

    pub(crate) fn node(&self, path: &[usize]) -> &BlockNode {
        let mut node = &self.blocks[path[0]];
        for &i in &path[1..] {
            node = &node.children[i];
        }
        node
    }

    pub(crate) fn node_mut(&mut self, path: &[usize]) -> &mut BlockNode {
        let mut node = &mut self.blocks[path[0]];
        for &i in &path[1..] {
            node = &mut node.children[i];
        }
        node
    }

    fn children_of_mut(&mut self, parent: &[usize]) -> &mut Vec<BlockNode> {
        if parent.is_empty() {
            &mut self.blocks
        } else {
            &mut self.node_mut(parent).children
        }
    }

    /// Leaves in document order with their flattened spans
    pub(crate) fn leaf_spans(&self) -> Vec<LeafSpan> {
        fn walk(nodes: &[BlockNode], path: &mut Vec<usize>, pos: &mut usize, out: &mut Vec<LeafSpan>) {
            for (i, node) in nodes.iter().enumerate() {
                path.push(i);
                if node.is_leaf() {
                    if !out.is_empty() {
                        *pos += 1; // block break before this leaf
                    }
                    let len = node.char_len();
                    out.push(LeafSpan {
                        path: path.clone(),
                        start: *pos,
                        len,
                    });
                    *pos += len;
                } else {
                    walk(&node.children, path, pos, out);
                }
                path.pop();
            }
        }
        let mut out = Vec::new();
        let mut path = Vec::new();
        let mut pos = 0;
        walk(&self.blocks, &mut path, &mut pos, &mut out);
        out
    }

    pub(crate) fn leaf_span_by_id(&self, id: BlockId) -> Option<LeafSpan> {
        self.leaf_spans()
            .into_iter()
            .find(|span| self.node(&span.path).id == id)
    }

    pub(crate) fn leaf_mut_by_id(&mut self, id: BlockId) -> Option<&mut BlockNode> {
        let span = self.leaf_span_by_id(id)?;
        Some(self.node_mut(&span.path))
    }

    // ---- read access for the classifier and resolution index ----------

    /// Walk the flattened slice `[from, to)` run by run, with a `Break`
    /// item for every crossed block boundary
    pub(crate) fn slice_items(&self, from: usize, to: usize) -> Vec<SliceItem> {
        let mut items = Vec::new();
        let spans = self.leaf_spans();
        for (k, span) in spans.iter().enumerate() {
            let ov_start = from.max(span.start);
            let ov_end = to.min(span.end());
            if ov_start < ov_end {
                let leaf = self.node(&span.path);
                let mut offset = span.start;
                for run in &leaf.runs {
                    let run_start = offset;
                    let run_end = offset + run.char_len();
                    offset = run_end;
                    let s = ov_start.max(run_start);
                    let e = ov_end.min(run_end);
                    if s < e {
                        items.push(SliceItem::Piece {
                            text: char_slice(&run.text, s - run_start, e - run_start),
                            marks: run.marks.clone(),
                        });
                    }
                }
            }
            if k + 1 < spans.len() {
                let break_pos = span.end();
                if break_pos >= from && break_pos < to {
                    items.push(SliceItem::Break);
                }
            }
        }
        items
    }

    /// Every revision in document order, adjacent same-id runs merged.
    /// Rebuilt from a fresh walk on every call; nothing stores locations.
    pub fn revision_spans(&self) -> Vec<RevisionSpan> {
        let mut out: Vec<RevisionSpan> = Vec::new();
        for span in &self.leaf_spans() {
            let leaf = self.node(&span.path);
            let mut offset = span.start;
            for run in &leaf.runs {
                let range = offset..offset + run.char_len();
                offset = range.end;
                let (kind, attr) = match run.revision() {
                    Some(Mark::Insertion(attr)) => (RevisionKind::Insertion, attr),
                    Some(Mark::Deletion(attr)) => (RevisionKind::Deletion, attr),
                    _ => continue,
                };
                // Contiguous continuation, or continuation across the block
                // break: the previous run ended the previous leaf and this
                // one opens the current leaf.
                let crosses_break = range.start == span.start
                    && out
                        .last()
                        .is_some_and(|last| last.range.end + 1 == range.start);
                match out.last_mut() {
                    Some(last)
                        if last.id == attr.id
                            && (last.range.end == range.start || crosses_break) =>
                    {
                        if crosses_break {
                            last.text.push('\n');
                        }
                        last.text.push_str(&run.text);
                        last.range.end = range.end;
                    }
                    _ => out.push(RevisionSpan {
                        id: attr.id,
                        kind,
                        author: attr.author.clone(),
                        date: attr.date,
                        text: run.text.clone(),
                        range,
                    }),
                }
            }
        }
        out
    }

    /// Ranges of one revision, or `MarkNotFound`
    pub(crate) fn revision_ranges(
        &self,
        id: MarkId,
    ) -> Result<(RevisionKind, Vec<std::ops::Range<usize>>), TrackError> {
        let ranges: Vec<_> = self
            .revision_spans()
            .into_iter()
            .filter(|s| s.id == id)
            .collect();
        match ranges.first() {
            Some(first) => {
                let kind = first.kind;
                Ok((kind, ranges.into_iter().map(|s| s.range).collect()))
            }
            None => Err(TrackError::MarkNotFound(id)),
        }
    }

    // ---- committing ----------------------------------------------------

    /// Apply a batch atomically: every operation lands on a scratch copy,
    /// which replaces the document only on success. Out-of-range operations
    /// are skipped with a warning; any other failure aborts the whole batch.
    pub fn commit(&mut self, batch: &EditBatch) -> Result<Patch, TrackError> {
        let mut next = self.clone();
        let mut applied: Vec<PosMap> = Vec::new();
        let mut touched: Vec<(usize, std::ops::Range<usize>)> = Vec::new();
        for op in &batch.ops {
            match next.apply_op(op) {
                Ok(()) => {
                    let map = op.pos_map();
                    let immediate = match op {
                        EditOp::Replace { .. } => map.start..map.start + map.new_len,
                        EditOp::AddMark { range, .. }
                        | EditOp::StripRevision { range, .. } => range.clone(),
                    };
                    touched.push((applied.len() + 1, immediate));
                    applied.push(map);
                }
                Err(e @ TrackError::PositionOutOfRange { .. }) => {
                    warn!(error = %e, "skipping out-of-range operation");
                }
                Err(e) => return Err(e),
            }
        }

        let mut changed = Vec::new();
        for (after, range) in touched {
            let later = Mapping::from_maps(applied[after.min(applied.len())..].to_vec());
            let mapped = later.map_range(range);
            if !mapped.is_empty() {
                changed.push(mapped);
            }
        }

        // Cursor reconciliation: carry the selection through everything the
        // batch did, clamped to the new bounds.
        let mapping = Mapping::from_maps(applied);
        let len = next.char_len();
        let start = mapping.map(self.selection.start, Assoc::After).min(len);
        let end = mapping.map(self.selection.end, Assoc::After).clamp(start, len);
        next.selection = start..end;
        next.version = self.version + 1;

        let patch = Patch {
            changed,
            new_selection: next.selection.clone(),
            version: next.version,
            new_marks: Vec::new(),
        };
        *self = next;
        Ok(patch)
    }

    fn apply_op(&mut self, op: &EditOp) -> Result<(), TrackError> {
        match op {
            EditOp::Replace { range, content } => self.splice(range.clone(), content)?,
            EditOp::AddMark { range, mark } => self.add_mark(range.clone(), mark)?,
            EditOp::StripRevision { range, kind } => self.strip_revision(range.clone(), *kind)?,
        }
        self.normalize();
        Ok(())
    }

    fn splice(
        &mut self,
        range: std::ops::Range<usize>,
        content: &[Run],
    ) -> Result<(), TrackError> {
        let len = self.char_len();
        if range.start > range.end || range.end > len {
            return Err(TrackError::PositionOutOfRange {
                pos: range.end,
                len,
            });
        }
        if !range.is_empty() {
            self.delete_range(range.start, range.end)?;
        }
        if !content.is_empty() {
            self.insert_runs(range.start, content)?;
        }
        Ok(())
    }

    fn delete_range(&mut self, from: usize, to: usize) -> Result<(), TrackError> {
        let spans = self.leaf_spans();

        // Text deletions first; they shift nothing structural.
        for span in &spans {
            let ov_start = from.max(span.start);
            let ov_end = to.min(span.end());
            if ov_start < ov_end {
                let local_start = ov_start - span.start;
                let local_end = ov_end - span.start;
                let leaf = self.node_mut(&span.path);
                remove_text_range(&mut leaf.runs, local_start, local_end);
                leaf.coalesce();
            }
        }

        // Then merge leaves whose separating break fell inside the range,
        // back to front so earlier paths stay valid.
        for k in (0..spans.len().saturating_sub(1)).rev() {
            let break_pos = spans[k].end();
            if break_pos < from || break_pos >= to {
                continue;
            }
            let Some((&b_idx, b_parent)) = spans[k + 1].path.split_last() else {
                continue;
            };
            let Some((_, a_parent)) = spans[k].path.split_last() else {
                continue;
            };
            if a_parent != b_parent {
                return Err(TrackError::MalformedBatch(
                    "deletion crosses a container boundary".into(),
                ));
            }
            let b_parent = b_parent.to_vec();
            let moved = self.children_of_mut(&b_parent).remove(b_idx);
            let a = self.node_mut(&spans[k].path);
            a.runs.extend(moved.runs);
            a.coalesce();
        }
        Ok(())
    }

    /// Literal insertion: `\n` chars in the content stay in run text here
    /// and become real splits during `normalize` unless deletion-marked
    fn insert_runs(&mut self, pos: usize, content: &[Run]) -> Result<(), TrackError> {
        let len = self.char_len();
        if pos > len {
            return Err(TrackError::PositionOutOfRange { pos, len });
        }
        if self.leaf_spans().is_empty() {
            self.blocks.push(BlockNode::paragraph(Vec::new()));
        }
        let spans = self.leaf_spans();
        // Favor-left: a position sitting on a break belongs to the leaf
        // before it.
        let Some(span) = spans.iter().find(|s| pos <= s.end()) else {
            return Err(TrackError::PositionOutOfRange { pos, len });
        };
        let local = pos - span.start;
        let path = span.path.clone();
        let leaf = self.node_mut(&path);
        insert_into_runs(&mut leaf.runs, local, content);
        leaf.coalesce();
        Ok(())
    }

    fn add_mark(&mut self, range: std::ops::Range<usize>, mark: &Mark) -> Result<(), TrackError> {
        self.for_runs_in_range(range, |run| {
            if mark.is_revision() {
                // A run carries at most one revision mark.
                run.marks.retain(|m| !m.is_revision());
            }
            if !run.marks.contains(mark) {
                run.marks.push(mark.clone());
            }
        })
    }

    fn strip_revision(
        &mut self,
        range: std::ops::Range<usize>,
        kind: RevisionKind,
    ) -> Result<(), TrackError> {
        self.for_runs_in_range(range, |run| {
            run.marks.retain(|m| m.revision_kind() != Some(kind));
        })
    }

    fn for_runs_in_range(
        &mut self,
        range: std::ops::Range<usize>,
        mut f: impl FnMut(&mut Run),
    ) -> Result<(), TrackError> {
        let len = self.char_len();
        if range.start > range.end || range.end > len {
            return Err(TrackError::PositionOutOfRange {
                pos: range.end,
                len,
            });
        }
        if range.is_empty() {
            return Ok(());
        }
        let spans = self.leaf_spans();
        for span in &spans {
            let ov_start = range.start.max(span.start);
            let ov_end = range.end.min(span.end());
            if ov_start >= ov_end {
                continue;
            }
            let local_start = ov_start - span.start;
            let local_end = ov_end - span.start;
            let leaf = self.node_mut(&span.path);
            split_runs_at(&mut leaf.runs, local_end);
            split_runs_at(&mut leaf.runs, local_start);
            let mut offset = 0;
            for run in leaf.runs.iter_mut() {
                let l = run.char_len();
                if offset >= local_start && offset + l <= local_end && l > 0 {
                    f(run);
                }
                offset += l;
            }
            leaf.coalesce();
        }
        Ok(())
    }

    // ---- normalization --------------------------------------------------

    /// Enforce the literal-break invariant and coalesce runs
    pub(crate) fn normalize(&mut self) {
        while let Some((path, run_idx, char_idx)) = self.find_unprotected_break() {
            self.split_leaf_at(&path, run_idx, char_idx);
        }
        let spans = self.leaf_spans();
        for span in &spans {
            self.node_mut(&span.path).coalesce();
        }
    }

    fn find_unprotected_break(&self) -> Option<(Vec<usize>, usize, usize)> {
        for span in self.leaf_spans() {
            let leaf = self.node(&span.path);
            for (run_idx, run) in leaf.runs.iter().enumerate() {
                if run.has_revision(RevisionKind::Deletion) {
                    continue;
                }
                if let Some(char_idx) = run.text.chars().position(|c| c == '\n') {
                    return Some((span.path, run_idx, char_idx));
                }
            }
        }
        None
    }

    /// Split one leaf at a literal break; the tail becomes a fresh sibling
    /// inheriting kind and visual attributes but never pending state
    fn split_leaf_at(&mut self, path: &[usize], run_idx: usize, char_idx: usize) {
        let sibling = {
            let leaf = self.node_mut(path);
            let run = leaf.runs[run_idx].clone();
            let head_text = char_slice(&run.text, 0, char_idx);
            let tail_text = char_slice(&run.text, char_idx + 1, run.char_len());

            let mut tail_runs: Vec<Run> = Vec::new();
            if !tail_text.is_empty() {
                tail_runs.push(Run::new(tail_text, run.marks.clone()));
            }
            tail_runs.extend(leaf.runs.drain(run_idx + 1..));
            leaf.runs.truncate(run_idx);
            if !head_text.is_empty() {
                leaf.runs.push(Run::new(head_text, run.marks));
            }
            leaf.coalesce();

            BlockNode {
                id: BlockId::new(),
                kind: leaf.kind.clone(),
                attrs: BlockAttrs {
                    style: leaf.attrs.style.clone(),
                    numbering: leaf.attrs.numbering,
                    label: None,
                    pending_format: None,
                },
                runs: tail_runs,
                children: Vec::new(),
            }
        };
        let Some((&idx, parent)) = path.split_last() else {
            return;
        };
        let parent = parent.to_vec();
        self.children_of_mut(&parent).insert(idx + 1, sibling);
    }
}

// ---- run-level splicing helpers ----------------------------------------

fn remove_text_range(runs: &mut Vec<Run>, from: usize, to: usize) {
    let mut out = Vec::with_capacity(runs.len());
    let mut offset = 0;
    for run in runs.drain(..) {
        let l = run.char_len();
        let start = offset;
        let end = offset + l;
        offset = end;
        if end <= from || start >= to {
            out.push(run);
            continue;
        }
        let keep_head = from.saturating_sub(start);
        if keep_head > 0 {
            out.push(Run::new(char_slice(&run.text, 0, keep_head), run.marks.clone()));
        }
        if to < end {
            out.push(Run::new(char_slice(&run.text, to - start, l), run.marks));
        }
    }
    *runs = out;
}

fn insert_into_runs(runs: &mut Vec<Run>, at: usize, content: &[Run]) {
    let mut idx = 0;
    let mut offset = 0;
    while idx < runs.len() {
        let l = runs[idx].char_len();
        if at <= offset + l {
            break;
        }
        offset += l;
        idx += 1;
    }
    if idx == runs.len() {
        runs.extend(content.iter().cloned());
        return;
    }
    let local = at - offset;
    let run_len = runs[idx].char_len();
    if local == 0 {
        runs.splice(idx..idx, content.iter().cloned());
    } else if local == run_len {
        runs.splice(idx + 1..idx + 1, content.iter().cloned());
    } else {
        let run = runs[idx].clone();
        let head = Run::new(char_slice(&run.text, 0, local), run.marks.clone());
        let tail = Run::new(char_slice(&run.text, local, run_len), run.marks);
        let mut replacement = vec![head];
        replacement.extend(content.iter().cloned());
        replacement.push(tail);
        runs.splice(idx..idx + 1, replacement);
    }
}

fn split_runs_at(runs: &mut Vec<Run>, at: usize) {
    let mut offset = 0;
    for idx in 0..runs.len() {
        let l = runs[idx].char_len();
        if at > offset && at < offset + l {
            let run = runs[idx].clone();
            let local = at - offset;
            let head = Run::new(char_slice(&run.text, 0, local), run.marks.clone());
            let tail = Run::new(char_slice(&run.text, local, l), run.marks);
            runs.splice(idx..idx + 1, [head, tail]);
            return;
        }
        offset += l;
    }
}

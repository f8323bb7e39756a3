//! Position mapping across structural edits.
//!
//! Every structural operation replaces one span, so its position map is the
//! single-span `PosMap`. A `Mapping` composes several of them, and the two
//! batch views translate any position between "before the whole batch" and
//! the coordinate space an individual operation sees.

use crate::editing::batch::EditOp;

/// Which side a position associates with when it sits on an edit boundary.
///
/// `Before` keeps the position left of content inserted at that point;
/// `After` places it at the end of such insertions. Range starts map with
/// `Before` (favor-left) and range ends with `After` (favor-right) so edit
/// boundaries never pull neighbouring content into a range by one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// Position map of a single span replacement: `old_len` chars starting at
/// `start` become `new_len` chars.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PosMap {
    pub start: usize,
    pub old_len: usize,
    pub new_len: usize,
}

impl PosMap {
    /// Map that leaves every position unchanged
    pub fn identity() -> Self {
        Self {
            start: 0,
            old_len: 0,
            new_len: 0,
        }
    }

    /// Translate a position across this replacement
    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        if pos < self.start {
            pos
        } else if pos > self.start + self.old_len {
            pos - self.old_len + self.new_len
        } else {
            // On or inside the replaced span: collapse to the chosen side.
            match assoc {
                Assoc::Before => self.start,
                Assoc::After => self.start + self.new_len,
            }
        }
    }

    /// The map translating positions the opposite way
    pub fn invert(&self) -> PosMap {
        PosMap {
            start: self.start,
            old_len: self.new_len,
            new_len: self.old_len,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.old_len == 0 && self.new_len == 0
    }
}

/// An ordered composition of position maps
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    maps: Vec<PosMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_maps(maps: Vec<PosMap>) -> Self {
        Self { maps }
    }

    pub fn push(&mut self, map: PosMap) {
        if !map.is_identity() {
            self.maps.push(map);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Translate a position through every map in order
    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.maps.iter().fold(pos, |p, m| m.map(p, assoc))
    }

    /// Translate a range, favor-left at the start and favor-right at the end
    pub fn map_range(&self, range: std::ops::Range<usize>) -> std::ops::Range<usize> {
        let start = self.map(range.start, Assoc::Before);
        let end = self.map(range.end, Assoc::After).max(start);
        start..end
    }
}

/// Map from "before the whole batch" to "immediately before operation `i`":
/// the composed inversion of operations `[0..i)`, applied newest first.
pub fn map_to_pre_batch(ops: &[EditOp], i: usize) -> Mapping {
    let mut mapping = Mapping::new();
    for op in ops[..i].iter().rev() {
        mapping.push(op.pos_map().invert());
    }
    mapping
}

/// Map from "immediately after operation `i`" to "after the whole batch":
/// the composition of operations `(i..N)`.
pub fn map_to_post_batch(ops: &[EditOp], i: usize) -> Mapping {
    let mut mapping = Mapping::new();
    for op in &ops[i + 1..] {
        mapping.push(op.pos_map());
    }
    mapping
}

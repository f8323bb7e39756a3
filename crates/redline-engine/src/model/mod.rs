//! Document model: block nodes, inline runs and revision marks.

pub mod mark;
pub mod node;

pub use mark::{Attribution, Mark, MarkId, RevisionKind};
pub use node::{BlockAttrs, BlockId, BlockKind, BlockNode, FormatSnapshot, Numbering, Run, SeriesId};

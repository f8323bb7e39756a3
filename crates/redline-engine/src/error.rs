use crate::model::{BlockId, MarkId};

/// Failure taxonomy of the tracking core.
///
/// Everything here is local and recoverable: `PositionOutOfRange` skips the
/// offending operation during commit, `MarkNotFound` surfaces as `false` at
/// the resolution API, and `MalformedBatch` degrades interception to an
/// untracked passthrough. Nothing is fatal to the host process.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("position {pos} is out of bounds for document length {len}")]
    PositionOutOfRange { pos: usize, len: usize },
    #[error("no unresolved revision with id {0}")]
    MarkNotFound(MarkId),
    #[error("malformed batch: {0}")]
    MalformedBatch(String),
    #[error("no block with id {0}")]
    BlockNotFound(BlockId),
}

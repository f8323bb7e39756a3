pub mod editing;
pub mod error;
pub mod model;

// Re-export key types for easier usage
pub use editing::{
    accept_deletion, accept_format_change, accept_insertion, change_records, reject_deletion,
    reject_format_change, reject_insertion, renumber, suggestion_batch, BlockSuggestion,
    ChangeKind, ChangeRecord, ChangeTracker, Document, EditBatch, EditOp, FormatCommand, Patch,
    TrackingConfig,
};
pub use error::TrackError;
pub use model::{
    Attribution, BlockAttrs, BlockId, BlockKind, BlockNode, FormatSnapshot, Mark, MarkId,
    Numbering, RevisionKind, Run, SeriesId,
};

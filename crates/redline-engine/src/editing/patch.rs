use crate::model::MarkId;

/// Result of committing an edit batch
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Patch {
    /// Ranges the batch touched, in post-commit coordinates
    pub changed: Vec<std::ops::Range<usize>>,
    /// Selection after cursor reconciliation
    pub new_selection: std::ops::Range<usize>,
    /// Document version after the commit
    pub version: u64,
    /// Revision marks the synthesizer allocated for this batch, so callers
    /// never have to diff id sets before and after
    pub new_marks: Vec<MarkId>,
}

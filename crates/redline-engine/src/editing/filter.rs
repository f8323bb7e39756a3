//! Guard filter: should a batch be intercepted at all?

use crate::editing::batch::EditBatch;
use crate::editing::tracker::TrackingConfig;

/// A batch is intercepted only when tracking is enabled, no exemption tag is
/// set and at least one operation changes content. Processed batches never
/// re-enter, resolution commands stay structurally simple, and undo/redo is
/// not re-annotated as a new edit.
pub fn should_intercept(config: &TrackingConfig, batch: &EditBatch) -> bool {
    config.enabled && !batch.tags.exempt() && batch.has_content_change()
}

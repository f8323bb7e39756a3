//! Format-revision tracking: the node-attribute analogue of run tracking.
//!
//! An attribute-changing command snapshots the old style and numbering
//! level into the node's single format-change slot before applying the new
//! attributes; only the latest unresolved snapshot per node survives.
//! Attribute-only commands carry no structural content change, so the guard
//! filter never re-intercepts them.

use chrono::{DateTime, Utc};

use crate::editing::document::Document;
use crate::editing::numbering::renumber;
use crate::editing::tracker::ChangeTracker;
use crate::error::TrackError;
use crate::model::{BlockId, FormatSnapshot, MarkId};

/// An attribute-changing command against one block. `None` fields leave the
/// attribute unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatCommand {
    pub block: BlockId,
    pub new_style: Option<String>,
    pub new_level: Option<u8>,
}

impl ChangeTracker {
    /// Apply a format command with the current wall-clock timestamp
    pub fn format(
        &self,
        doc: &mut Document,
        cmd: FormatCommand,
    ) -> Result<Option<MarkId>, TrackError> {
        self.format_at(doc, cmd, Utc::now())
    }

    /// Apply a format command. With tracking enabled the old attributes are
    /// snapshotted first and the snapshot id is returned; disabled tracking
    /// applies the attributes without a trace.
    pub fn format_at(
        &self,
        doc: &mut Document,
        cmd: FormatCommand,
        now: DateTime<Utc>,
    ) -> Result<Option<MarkId>, TrackError> {
        let Some(leaf) = doc.leaf_mut_by_id(cmd.block) else {
            return Err(TrackError::BlockNotFound(cmd.block));
        };

        let mut mark_id = None;
        if self.config.enabled {
            let id = MarkId::new();
            leaf.attrs.pending_format = Some(FormatSnapshot {
                id,
                author: self.config.author.clone(),
                date: now,
                old_style: leaf.attrs.style.clone(),
                old_level: leaf.attrs.numbering.map(|n| n.level),
            });
            mark_id = Some(id);
        }

        if let Some(style) = cmd.new_style {
            leaf.attrs.style = Some(style);
        }
        let mut series = None;
        if let Some(level) = cmd.new_level
            && let Some(numbering) = leaf.attrs.numbering.as_mut()
        {
            numbering.level = level;
            series = Some(numbering.series);
        }

        doc.version += 1;
        // Labels must never go stale while a level change is pending.
        if let Some(series) = series {
            renumber(doc, series);
        }
        Ok(mark_id)
    }
}

/// Accept a format change: clear the snapshot, keep the current attributes
pub fn accept_format_change(doc: &mut Document, id: MarkId) -> Result<bool, TrackError> {
    let Some(path) = pending_format_path(doc, id) else {
        return Ok(false);
    };
    doc.node_mut(&path).attrs.pending_format = None;
    doc.version += 1;
    Ok(true)
}

/// Reject a format change: restore the snapshotted attributes, clear the
/// snapshot and renumber the affected series
pub fn reject_format_change(doc: &mut Document, id: MarkId) -> Result<bool, TrackError> {
    let Some(path) = pending_format_path(doc, id) else {
        return Ok(false);
    };
    let node = doc.node_mut(&path);
    let Some(snapshot) = node.attrs.pending_format.take() else {
        return Ok(false);
    };
    node.attrs.style = snapshot.old_style;
    let mut series = None;
    if let (Some(level), Some(numbering)) = (snapshot.old_level, node.attrs.numbering.as_mut()) {
        numbering.level = level;
        series = Some(numbering.series);
    }
    doc.version += 1;
    if let Some(series) = series {
        renumber(doc, series);
    }
    Ok(true)
}

fn pending_format_path(doc: &Document, id: MarkId) -> Option<Vec<usize>> {
    doc.leaf_spans().into_iter().find_map(|span| {
        let pending = doc.node(&span.path).attrs.pending_format.as_ref()?;
        (pending.id == id).then_some(span.path)
    })
}

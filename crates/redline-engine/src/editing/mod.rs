/*!
 * # Tracked-Change Editing Core
 *
 * This module implements the interception pipeline that turns raw edit
 * batches into durable, reviewable revisions.
 *
 * ## Architecture Overview
 *
 * ### 1. Flattened Coordinates over a Block Tree
 * - The document is a tree of block nodes whose leaves carry runs of marked
 *   text (`Document`, `model::BlockNode`, `model::Run`)
 * - Positions are char offsets into the leaf texts joined by single
 *   block-break characters, so every range and position map shares one
 *   coordinate space
 *
 * ### 2. Position Mapping
 * - Each operation's remap is the single-span `PosMap`; `Mapping` composes
 *   them (`mapping`)
 * - Batch views translate between pre-batch, per-operation and post-batch
 *   coordinates via composed inversion and composition
 * - Boundary bias is explicit: favor-left at range starts, favor-right at
 *   range ends (`Assoc`)
 *
 * ### 3. Interception Pipeline
 * - The guard filter (`filter`) skips exempt batches: already processed,
 *   resolution commands, undo/redo, tracking disabled
 * - The classifier (`classify`) walks the touched pre-batch content run by
 *   run and resolves each piece's provenance once
 * - The synthesizer (`synthesize`) builds the replacement batch in strictly
 *   descending anchor order and reports allocated mark ids directly
 * - `Document::commit` applies the whole batch to a scratch copy and swaps
 *   on success, then reconciles the cursor
 *
 * ### 4. Resolution and Attribute Tracking
 * - Accept/reject by mark id (`resolve`) works off a per-query index
 *   rebuilt from a fresh walk; resulting batches are tagged so the guard
 *   filter never re-tracks them
 * - Format changes snapshot style/level into the node's single pending slot
 *   (`format`); rejecting restores the snapshot and renumbers the series
 *   (`numbering`)
 *
 * ### 5. Outward Surfaces
 * - `records` projects every unresolved revision into serializable
 *   `ChangeRecord`s in document order
 * - `suggest` adapts `{blockId, newFullText}` proposals into ordinary raw
 *   batches via a word-level diff
 *
 * ## Usage Pattern
 *
 * ```rust
 * use redline_engine::editing::{
 *     accept_insertion, change_records, ChangeTracker, Document, EditBatch, TrackingConfig,
 * };
 *
 * let mut doc = Document::from_paragraphs(["The cat sat."]);
 * let tracker = ChangeTracker::new(TrackingConfig::new("alice"));
 *
 * // Raw edits become reviewable revisions.
 * let patch = tracker.process(&mut doc, EditBatch::insert(4, "fat ")).unwrap();
 * assert_eq!(doc.text(), "The fat cat sat.");
 * assert_eq!(change_records(&doc).len(), 1);
 *
 * // Resolving a mark by id commits or discards it.
 * assert!(accept_insertion(&mut doc, patch.new_marks[0]).unwrap());
 * assert!(change_records(&doc).is_empty());
 * ```
 */

pub mod batch;
pub mod classify;
pub mod document;
pub mod filter;
pub mod format;
pub mod mapping;
pub mod numbering;
pub mod patch;
pub mod records;
pub mod resolve;
pub mod suggest;
pub mod synthesize;
pub mod tracker;

pub use batch::{BatchTags, EditBatch, EditOp};
pub use classify::{Fragment, PendingChange};
pub use document::{Document, RevisionSpan};
pub use filter::should_intercept;
pub use format::{accept_format_change, reject_format_change, FormatCommand};
pub use mapping::{map_to_post_batch, map_to_pre_batch, Assoc, Mapping, PosMap};
pub use numbering::{renumber, NumberFormat, SeriesFormat};
pub use patch::Patch;
pub use records::{change_records, ChangeKind, ChangeRecord};
pub use resolve::{accept_deletion, accept_insertion, reject_deletion, reject_insertion};
pub use suggest::{suggestion_batch, BlockSuggestion};
pub use tracker::{ChangeTracker, TrackingConfig};

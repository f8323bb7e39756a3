//! AI suggestion adapter: block-level rewrites as ordinary edit batches.
//!
//! A collaborator proposes `{blockId, newFullText}` pairs; this adapter
//! word-diffs the proposal against the block's current text and emits
//! disjoint ascending `Replace` operations in document coordinates. Fed
//! through the tracker with the AI as configured author, the proposal
//! surfaces as ordinary reviewable insertions and deletions.

use imara_diff::{Algorithm, Diff, Hunk, InternedInput};

use crate::editing::batch::{EditBatch, EditOp};
use crate::editing::document::Document;
use crate::error::TrackError;
use crate::model::{BlockId, Run};

/// A proposed full-text replacement for one block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSuggestion {
    pub block: BlockId,
    pub text: String,
}

/// Word-diff a suggestion against the block's current text and build the
/// raw batch that realizes it
pub fn suggestion_batch(
    doc: &Document,
    suggestion: &BlockSuggestion,
) -> Result<EditBatch, TrackError> {
    let Some(span) = doc.leaf_span_by_id(suggestion.block) else {
        return Err(TrackError::BlockNotFound(suggestion.block));
    };
    let before_text = doc.node(&span.path).text();
    let before = tokenize_words(&before_text);
    let after = tokenize_words(&suggestion.text);

    let mut input = InternedInput::default();
    input.update_before(before.tokens.iter().cloned());
    input.update_after(after.tokens.iter().cloned());
    let diff = Diff::compute(Algorithm::Histogram, &input);

    let mut ops = Vec::new();
    // Hunk ranges are all in before-coordinates; operation ranges are
    // sequential, so carry the length delta of the preceding operations.
    let mut shift = 0isize;
    for Hunk { before: old, after: new } in diff.hunks() {
        let from = span.start + before.char_offset(old.start);
        let to = span.start + before.char_offset(old.end);
        let text: String = after.tokens[new.start as usize..new.end as usize]
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        let new_len = text.chars().count();
        let range = from.saturating_add_signed(shift)..to.saturating_add_signed(shift);
        shift += new_len as isize - (to - from) as isize;
        let content = if text.is_empty() {
            Vec::new()
        } else {
            vec![Run::plain(text)]
        };
        ops.push(EditOp::Replace { range, content });
    }
    Ok(EditBatch::new(ops))
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
struct WordToken {
    text: String,
}

struct Tokenized {
    tokens: Vec<WordToken>,
    /// Cumulative char lengths; `prefix_chars[i]` is the char offset of
    /// token `i`
    prefix_chars: Vec<usize>,
}

impl Tokenized {
    fn char_offset(&self, token_index: u32) -> usize {
        self.prefix_chars[token_index as usize]
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum TokenClass {
    Whitespace,
    Word,
    Other,
}

fn token_class(ch: char) -> TokenClass {
    if ch.is_whitespace() {
        TokenClass::Whitespace
    } else if ch.is_alphanumeric() || ch == '_' {
        TokenClass::Word
    } else {
        TokenClass::Other
    }
}

fn tokenize_words(text: &str) -> Tokenized {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut class = None;
    for ch in text.chars() {
        let next = token_class(ch);
        if class == Some(next) {
            buf.push(ch);
            continue;
        }
        if !buf.is_empty() {
            tokens.push(WordToken {
                text: std::mem::take(&mut buf),
            });
        }
        buf.push(ch);
        class = Some(next);
    }
    if !buf.is_empty() {
        tokens.push(WordToken { text: buf });
    }

    let mut prefix_chars = Vec::with_capacity(tokens.len() + 1);
    let mut total = 0;
    prefix_chars.push(0);
    for token in &tokens {
        total += token.text.chars().count();
        prefix_chars.push(total);
    }
    Tokenized {
        tokens,
        prefix_chars,
    }
}

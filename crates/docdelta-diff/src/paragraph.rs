//! Paragraph diff: block granularity over a sequence of paragraph-like
//! nodes.
//!
//! Paragraphs are matched by their stable identifier when both sides carry
//! one, otherwise by full text. A deleted and an inserted paragraph that are
//! similar enough are reported as one modified paragraph whose content diff
//! comes from [`crate::inline`].

use docdelta_types::Node;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::attributes::{diff_attributes_with, AttributesDiff};
use crate::config::DiffConfig;
use crate::inline::{diff_inline, tokenize_inline, InlineDiff, InlineToken};
use crate::myers::EditOp;
use crate::position::{insertion_anchor, Positioned};
use crate::sequence::{diff_sequences, interleave_changes, DiffAction, SequenceHooks};
use crate::similarity::similarity;

/// A paragraph flattened once for comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct ParagraphSnapshot<'a> {
    pub node: &'a Node,
    /// Absolute position of the paragraph's opening token.
    pub pos: usize,
    pub depth: usize,
    pub tokens: Vec<InlineToken<'a>>,
    /// Concatenated characters of the text tokens.
    pub text: String,
    /// Absolute position of the paragraph's closing token.
    pub end_pos: usize,
}

impl Positioned for ParagraphSnapshot<'_> {
    fn pos(&self) -> usize {
        self.pos
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn node_size(&self) -> usize {
        self.node.node_size()
    }
}

/// Build the snapshot of a paragraph located at `pos`.
pub fn snapshot_paragraph<'a>(
    node: &'a Node,
    pos: usize,
    depth: usize,
    config: &DiffConfig,
) -> ParagraphSnapshot<'a> {
    let tokens = tokenize_inline(node, pos + 1, config);
    let text = tokens.iter().filter_map(InlineToken::as_char).collect();
    ParagraphSnapshot {
        node,
        pos,
        depth,
        tokens,
        text,
        end_pos: pos + node.node_size() - 1,
    }
}

/// A paragraph-level change.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ParagraphDiff {
    Added {
        node: Node,
        text: String,
        /// Insertion anchor in the old document.
        pos: usize,
    },
    Deleted {
        node: Node,
        text: String,
        pos: usize,
    },
    Modified {
        old_node: Node,
        new_node: Node,
        old_text: String,
        new_text: String,
        pos: usize,
        content_diff: Vec<InlineDiff>,
        attrs_diff: Option<AttributesDiff>,
    },
}

impl ParagraphDiff {
    pub fn action(&self) -> DiffAction {
        match self {
            Self::Added { .. } => DiffAction::Added,
            Self::Deleted { .. } => DiffAction::Deleted,
            Self::Modified { .. } => DiffAction::Modified,
        }
    }
}

fn paragraph_id<'n>(node: &'n Node, config: &DiffConfig) -> Option<&'n Value> {
    node.attr(&config.paragraph_id_attr)
}

/// Same paragraph: equal ids when both have one, else equal text.
pub(crate) fn paragraphs_match(
    old: &ParagraphSnapshot<'_>,
    new: &ParagraphSnapshot<'_>,
    config: &DiffConfig,
) -> bool {
    match (paragraph_id(old.node, config), paragraph_id(new.node, config)) {
        (Some(a), Some(b)) => a == b,
        _ => old.text == new.text,
    }
}

/// Whether a deleted and an inserted paragraph describe one edited paragraph.
pub(crate) fn paragraphs_pair(
    deleted: &ParagraphSnapshot<'_>,
    inserted: &ParagraphSnapshot<'_>,
    config: &DiffConfig,
) -> bool {
    if paragraphs_match(deleted, inserted, config) {
        return true;
    }
    let longest = deleted.text.chars().count().max(inserted.text.chars().count());
    longest >= config.min_similarity_length
        && similarity(&deleted.text, &inserted.text) >= config.similarity_threshold
}

pub(crate) fn added_paragraph(new: &ParagraphSnapshot<'_>, pos: usize) -> ParagraphDiff {
    ParagraphDiff::Added {
        node: new.node.clone(),
        text: new.text.clone(),
        pos,
    }
}

pub(crate) fn deleted_paragraph(old: &ParagraphSnapshot<'_>) -> ParagraphDiff {
    ParagraphDiff::Deleted {
        node: old.node.clone(),
        text: old.text.clone(),
        pos: old.pos,
    }
}

/// Content and attribute diff of two paragraphs; `None` when both are empty.
pub(crate) fn modified_paragraph(
    old: &ParagraphSnapshot<'_>,
    new: &ParagraphSnapshot<'_>,
    config: &DiffConfig,
) -> Option<ParagraphDiff> {
    let content_diff = diff_inline(&old.tokens, &new.tokens, old.end_pos, config);
    let attrs_diff =
        diff_attributes_with(&old.node.attrs, &new.node.attrs, &config.ignored_attributes, &[]);
    if content_diff.is_empty() && attrs_diff.is_none() {
        return None;
    }
    Some(ParagraphDiff::Modified {
        old_node: old.node.clone(),
        new_node: new.node.clone(),
        old_text: old.text.clone(),
        new_text: new.text.clone(),
        pos: old.pos,
        content_diff,
        attrs_diff,
    })
}

struct ParagraphHooks<'c> {
    config: &'c DiffConfig,
}

impl<'a> SequenceHooks<ParagraphSnapshot<'a>> for ParagraphHooks<'_> {
    type Record = ParagraphDiff;

    fn matches(&self, old: &ParagraphSnapshot<'a>, new: &ParagraphSnapshot<'a>) -> bool {
        paragraphs_match(old, new, self.config)
    }

    fn build_added(
        &mut self,
        item: &ParagraphSnapshot<'a>,
        _old_index: usize,
        previous_old: Option<&ParagraphSnapshot<'a>>,
    ) -> Option<ParagraphDiff> {
        Some(added_paragraph(item, insertion_anchor(previous_old, item.depth)))
    }

    fn build_deleted(
        &mut self,
        item: &ParagraphSnapshot<'a>,
        _old_index: usize,
    ) -> Option<ParagraphDiff> {
        Some(deleted_paragraph(item))
    }

    fn build_modified(
        &mut self,
        old: &ParagraphSnapshot<'a>,
        new: &ParagraphSnapshot<'a>,
        _old_index: usize,
    ) -> Option<ParagraphDiff> {
        modified_paragraph(old, new, self.config)
    }

    fn equal_is_modification(
        &self,
        old: &ParagraphSnapshot<'a>,
        new: &ParagraphSnapshot<'a>,
    ) -> bool {
        old.node != new.node
    }

    fn can_pair(&self, deleted: &ParagraphSnapshot<'a>, inserted: &ParagraphSnapshot<'a>) -> bool {
        paragraphs_pair(deleted, inserted, self.config)
    }

    fn reorder(&self, ops: Vec<EditOp>) -> Vec<EditOp> {
        interleave_changes(ops)
    }
}

/// Diff two sequences of paragraph snapshots.
pub fn diff_paragraphs<'a>(
    old: &[ParagraphSnapshot<'a>],
    new: &[ParagraphSnapshot<'a>],
    config: &DiffConfig,
) -> Vec<ParagraphDiff> {
    let records = diff_sequences(old, new, &mut ParagraphHooks { config });
    debug!(old = old.len(), new = new.len(), records = records.len(), "paragraph diff");
    records
}

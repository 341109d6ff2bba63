//! Inline diff: character and inline-node granularity inside one block.
//!
//! A block is flattened into [`InlineToken`]s, diffed with the sequence
//! orchestrator, and the per-token records are then coalesced into runs by
//! [`group_diffs`].

use std::sync::LazyLock;

use docdelta_types::{Attrs, Mark, Node};
use serde::Serialize;
use tracing::trace;

use crate::attributes::{diff_attributes_with, diff_marks_with, AttributesDiff, MarksDiff};
use crate::config::DiffConfig;
use crate::position::index_to_offset;
use crate::sequence::{diff_sequences, DiffAction, SequenceHooks};

static NO_RUN_ATTRS: LazyLock<Attrs> = LazyLock::new(Attrs::new);

/// One comparable unit of inline content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InlineToken<'a> {
    /// A single character with the formatting in effect at it.
    Text {
        ch: char,
        /// Attributes of the nearest enclosing run (empty outside runs).
        run_attrs: &'a Attrs,
        /// Marks on the enclosing text node.
        marks: &'a [Mark],
        offset: usize,
    },
    /// An inline element with no decomposable text (image, break, ...).
    Node { node: &'a Node, offset: usize },
}

impl InlineToken<'_> {
    /// Absolute document offset of the token.
    pub fn offset(&self) -> usize {
        match self {
            Self::Text { offset, .. } | Self::Node { offset, .. } => *offset,
        }
    }

    /// The character of a text token.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Text { ch, .. } => Some(*ch),
            Self::Node { .. } => None,
        }
    }
}

/// Flatten the inline content of `block` into tokens.
///
/// `base_offset` is the absolute position of the block's first content
/// position, i.e. the block's own position plus one.
pub fn tokenize_inline<'a>(
    block: &'a Node,
    base_offset: usize,
    config: &DiffConfig,
) -> Vec<InlineToken<'a>> {
    let mut tokens = Vec::with_capacity(block.content_size());
    collect_tokens(block, base_offset, &NO_RUN_ATTRS, config, &mut tokens);
    tokens
}

fn collect_tokens<'a>(
    parent: &'a Node,
    start: usize,
    run_attrs: &'a Attrs,
    config: &DiffConfig,
    out: &mut Vec<InlineToken<'a>>,
) {
    let mut pos = start;
    for child in parent.children() {
        if let Some(text) = &child.text {
            out.extend(text.chars().enumerate().map(|(i, ch)| InlineToken::Text {
                ch,
                run_attrs,
                marks: &child.marks,
                offset: pos + i,
            }));
        } else if child.content.is_none() {
            out.push(InlineToken::Node { node: child, offset: pos });
        } else if child.kind == config.run_type {
            collect_tokens(child, pos + 1, &child.attrs, config, out);
        } else if has_text(child) {
            collect_tokens(child, pos + 1, run_attrs, config, out);
        } else {
            out.push(InlineToken::Node { node: child, offset: pos });
        }
        pos += child.node_size();
    }
}

fn has_text(node: &Node) -> bool {
    node.text.as_deref().is_some_and(|t| !t.is_empty()) || node.children().iter().any(has_text)
}

/// A change to a span of text.
///
/// `end_pos` is inclusive: a one-character record has `start_pos == end_pos`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum TextDiff {
    Added {
        text: String,
        /// Old-document offset the text is inserted at.
        pos: usize,
        run_attrs: Attrs,
        marks: Vec<Mark>,
    },
    Deleted {
        text: String,
        start_pos: usize,
        end_pos: usize,
        run_attrs: Attrs,
        marks: Vec<Mark>,
    },
    /// Same characters, different formatting.
    Modified {
        text: String,
        start_pos: usize,
        end_pos: usize,
        run_attrs_diff: Option<AttributesDiff>,
        marks_diff: Option<MarksDiff>,
    },
}

impl TextDiff {
    /// Append `next` to this record if they form one contiguous run with
    /// identical formatting payloads.
    fn try_extend(&mut self, next: &TextDiff) -> bool {
        match (self, next) {
            (
                Self::Added { text, pos, run_attrs, marks },
                Self::Added {
                    text: next_text,
                    pos: next_pos,
                    run_attrs: next_attrs,
                    marks: next_marks,
                },
            ) if *pos == *next_pos && *run_attrs == *next_attrs && *marks == *next_marks => {
                text.push_str(next_text);
                true
            }
            (
                Self::Deleted { text, end_pos, run_attrs, marks, .. },
                Self::Deleted {
                    text: next_text,
                    start_pos: next_start,
                    end_pos: next_end,
                    run_attrs: next_attrs,
                    marks: next_marks,
                },
            ) if *end_pos + 1 == *next_start
                && *run_attrs == *next_attrs
                && *marks == *next_marks =>
            {
                text.push_str(next_text);
                *end_pos = *next_end;
                true
            }
            (
                Self::Modified { text, end_pos, run_attrs_diff, marks_diff, .. },
                Self::Modified {
                    text: next_text,
                    start_pos: next_start,
                    end_pos: next_end,
                    run_attrs_diff: next_attrs_diff,
                    marks_diff: next_marks_diff,
                },
            ) if *end_pos + 1 == *next_start
                && *run_attrs_diff == *next_attrs_diff
                && *marks_diff == *next_marks_diff =>
            {
                text.push_str(next_text);
                *end_pos = *next_end;
                true
            }
            _ => false,
        }
    }
}

/// A change to a non-text inline element.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum InlineNodeDiff {
    Added {
        node: Node,
        pos: usize,
    },
    Deleted {
        node: Node,
        pos: usize,
    },
    Modified {
        old_node: Node,
        new_node: Node,
        pos: usize,
        attrs_diff: Option<AttributesDiff>,
        marks_diff: Option<MarksDiff>,
    },
}

/// A record produced by [`diff_inline`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InlineDiff {
    Text(TextDiff),
    Node(InlineNodeDiff),
}

impl InlineDiff {
    pub fn action(&self) -> DiffAction {
        match self {
            Self::Text(TextDiff::Added { .. }) => DiffAction::Added,
            Self::Text(TextDiff::Deleted { .. }) => DiffAction::Deleted,
            Self::Text(TextDiff::Modified { .. }) => DiffAction::Modified,
            Self::Node(InlineNodeDiff::Added { .. }) => DiffAction::Added,
            Self::Node(InlineNodeDiff::Deleted { .. }) => DiffAction::Deleted,
            Self::Node(InlineNodeDiff::Modified { .. }) => DiffAction::Modified,
        }
    }
}

struct InlineHooks<'t, 'a> {
    old: &'t [InlineToken<'a>],
    old_block_end: usize,
    config: &'t DiffConfig,
}

impl<'a> SequenceHooks<InlineToken<'a>> for InlineHooks<'_, 'a> {
    type Record = InlineDiff;

    fn matches(&self, old: &InlineToken<'a>, new: &InlineToken<'a>) -> bool {
        match (old, new) {
            (InlineToken::Text { ch: a, .. }, InlineToken::Text { ch: b, .. }) => a == b,
            (InlineToken::Node { node: a, .. }, InlineToken::Node { node: b, .. }) => {
                a.kind == b.kind
            }
            _ => false,
        }
    }

    fn build_added(
        &mut self,
        item: &InlineToken<'a>,
        old_index: usize,
        _previous_old: Option<&InlineToken<'a>>,
    ) -> Option<InlineDiff> {
        let pos = index_to_offset(self.old, old_index, self.old_block_end, |t| t.offset());
        Some(match *item {
            InlineToken::Text { ch, run_attrs, marks, .. } => InlineDiff::Text(TextDiff::Added {
                text: ch.to_string(),
                pos,
                run_attrs: run_attrs.clone(),
                marks: marks.to_vec(),
            }),
            InlineToken::Node { node, .. } => InlineDiff::Node(InlineNodeDiff::Added {
                node: node.clone(),
                pos,
            }),
        })
    }

    fn build_deleted(&mut self, item: &InlineToken<'a>, _old_index: usize) -> Option<InlineDiff> {
        Some(match *item {
            InlineToken::Text {
                ch,
                run_attrs,
                marks,
                offset,
            } => InlineDiff::Text(TextDiff::Deleted {
                text: ch.to_string(),
                start_pos: offset,
                end_pos: offset,
                run_attrs: run_attrs.clone(),
                marks: marks.to_vec(),
            }),
            InlineToken::Node { node, offset } => InlineDiff::Node(InlineNodeDiff::Deleted {
                node: node.clone(),
                pos: offset,
            }),
        })
    }

    fn build_modified(
        &mut self,
        old: &InlineToken<'a>,
        new: &InlineToken<'a>,
        _old_index: usize,
    ) -> Option<InlineDiff> {
        let ignored = &self.config.ignored_attributes;
        match (*old, *new) {
            (
                InlineToken::Text { ch, run_attrs: old_attrs, marks: old_marks, offset },
                InlineToken::Text { run_attrs: new_attrs, marks: new_marks, .. },
            ) => {
                let run_attrs_diff = diff_attributes_with(old_attrs, new_attrs, ignored, &[]);
                let marks_diff = diff_marks_with(old_marks, new_marks, ignored);
                if run_attrs_diff.is_none() && marks_diff.is_none() {
                    return None;
                }
                Some(InlineDiff::Text(TextDiff::Modified {
                    text: ch.to_string(),
                    start_pos: offset,
                    end_pos: offset,
                    run_attrs_diff,
                    marks_diff,
                }))
            }
            (
                InlineToken::Node { node: old_node, offset },
                InlineToken::Node { node: new_node, .. },
            ) => {
                let attrs_diff =
                    diff_attributes_with(&old_node.attrs, &new_node.attrs, ignored, &[]);
                let marks_diff = diff_marks_with(&old_node.marks, &new_node.marks, ignored);
                if attrs_diff.is_none() && marks_diff.is_none() {
                    return None;
                }
                Some(InlineDiff::Node(InlineNodeDiff::Modified {
                    old_node: old_node.clone(),
                    new_node: new_node.clone(),
                    pos: offset,
                    attrs_diff,
                    marks_diff,
                }))
            }
            _ => None,
        }
    }

    // The builder drops matches whose differences are all in ignored keys.
    fn equal_is_modification(&self, old: &InlineToken<'a>, new: &InlineToken<'a>) -> bool {
        match (old, new) {
            (
                InlineToken::Text { run_attrs: a, marks: m, .. },
                InlineToken::Text { run_attrs: b, marks: n, .. },
            ) => a != b || m != n,
            (InlineToken::Node { node: a, .. }, InlineToken::Node { node: b, .. }) => {
                a.attrs != b.attrs || a.marks != b.marks
            }
            _ => false,
        }
    }

    fn can_pair(&self, deleted: &InlineToken<'a>, inserted: &InlineToken<'a>) -> bool {
        match (deleted, inserted) {
            (InlineToken::Node { node: a, .. }, InlineToken::Node { node: b, .. }) => {
                a.kind == b.kind
            }
            _ => false,
        }
    }
}

/// Diff two token lists of one block.
///
/// `old_block_end` anchors insertions after the last old token.
pub fn diff_inline<'a>(
    old: &[InlineToken<'a>],
    new: &[InlineToken<'a>],
    old_block_end: usize,
    config: &DiffConfig,
) -> Vec<InlineDiff> {
    let mut hooks = InlineHooks {
        old,
        old_block_end,
        config,
    };
    let raw = diff_sequences(old, new, &mut hooks);
    let raw_len = raw.len();
    let grouped = group_diffs(raw);
    trace!(
        old = old.len(),
        new = new.len(),
        raw = raw_len,
        grouped = grouped.len(),
        "inline diff"
    );
    grouped
}

/// Coalesce consecutive text records into runs.
///
/// Added records group when they insert at the same point; deleted and
/// modified records group when their spans touch. Formatting payloads must
/// be identical. Node records never group.
pub fn group_diffs(diffs: Vec<InlineDiff>) -> Vec<InlineDiff> {
    let mut grouped: Vec<InlineDiff> = Vec::with_capacity(diffs.len());
    for diff in diffs {
        if let (Some(InlineDiff::Text(last)), InlineDiff::Text(next)) = (grouped.last_mut(), &diff)
        {
            if last.try_extend(next) {
                continue;
            }
        }
        grouped.push(diff);
    }
    grouped
}

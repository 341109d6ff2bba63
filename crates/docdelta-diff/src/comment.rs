//! Comment diff: comments matched by their resolved identifier.
//!
//! Identity is authoritative. Two comments with different ids are never
//! re-paired, however similar their bodies are. A matched pair is compared
//! on its body (through [`crate::node::diff_nodes`]) and on its metadata.

use docdelta_types::{Comment, Node};
use serde::Serialize;
use tracing::debug;

use crate::attributes::{diff_attributes_with, AttributesDiff};
use crate::config::DiffConfig;
use crate::node::{diff_nodes, normalize_tree, NodeDiff, TreeEntry};
use crate::paragraph::snapshot_paragraph;
use crate::sequence::{diff_sequences, DiffAction, SequenceHooks};

/// Comment keys that are identity or body rather than metadata.
///
/// Deserialized comments never carry the typed keys in `metadata`; they are
/// listed for metadata maps built by hand.
const COMMENT_STRUCTURE_KEYS: &[&str] =
    &["commentJSON", "elements", "importedId", "id", "commentId"];

/// A comment prepared for comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct CommentEntry<'a> {
    pub id: &'a str,
    pub comment: &'a Comment,
    /// Normalized body; empty when the comment has no body.
    pub entries: Vec<TreeEntry<'a>>,
    /// Plain text of the body.
    pub text: String,
}

/// Prepare comments for comparison, dropping those without any identifier.
pub fn build_comment_entries<'a>(
    comments: &'a [Comment],
    config: &DiffConfig,
) -> Vec<CommentEntry<'a>> {
    comments
        .iter()
        .filter_map(|comment| {
            let Some(id) = comment.resolved_id() else {
                debug!(metadata = ?comment.metadata, "skipping comment without an identifier");
                return None;
            };
            Some(CommentEntry {
                id,
                comment,
                entries: body_entries(comment.body.as_ref(), config),
                text: comment.body_text(),
            })
        })
        .collect()
}

fn body_entries<'a>(body: Option<&'a Node>, config: &DiffConfig) -> Vec<TreeEntry<'a>> {
    match body {
        None => Vec::new(),
        Some(node) if node.kind == config.paragraph_type => {
            vec![TreeEntry::Paragraph(snapshot_paragraph(node, 0, 0, config))]
        }
        Some(node) => normalize_tree(node, config),
    }
}

/// A comment-level change.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum CommentDiff {
    Added {
        comment_id: String,
        comment: Comment,
        text: String,
    },
    Deleted {
        comment_id: String,
        comment: Comment,
        text: String,
    },
    Modified {
        comment_id: String,
        old_comment: Comment,
        new_comment: Comment,
        old_text: String,
        new_text: String,
        content_diff: Vec<NodeDiff>,
        attrs_diff: Option<AttributesDiff>,
    },
}

impl CommentDiff {
    pub fn action(&self) -> DiffAction {
        match self {
            Self::Added { .. } => DiffAction::Added,
            Self::Deleted { .. } => DiffAction::Deleted,
            Self::Modified { .. } => DiffAction::Modified,
        }
    }

    /// The resolved identifier of the comment.
    pub fn comment_id(&self) -> &str {
        match self {
            Self::Added { comment_id, .. }
            | Self::Deleted { comment_id, .. }
            | Self::Modified { comment_id, .. } => comment_id,
        }
    }
}

struct CommentHooks<'c> {
    config: &'c DiffConfig,
}

impl CommentHooks<'_> {
    fn metadata_diff(&self, old: &Comment, new: &Comment) -> Option<AttributesDiff> {
        diff_attributes_with(
            &old.metadata,
            &new.metadata,
            &self.config.ignored_attributes,
            COMMENT_STRUCTURE_KEYS,
        )
    }
}

impl<'a> SequenceHooks<CommentEntry<'a>> for CommentHooks<'_> {
    type Record = CommentDiff;

    fn matches(&self, old: &CommentEntry<'a>, new: &CommentEntry<'a>) -> bool {
        old.id == new.id
    }

    fn build_added(
        &mut self,
        item: &CommentEntry<'a>,
        _old_index: usize,
        _previous_old: Option<&CommentEntry<'a>>,
    ) -> Option<CommentDiff> {
        Some(CommentDiff::Added {
            comment_id: item.id.to_string(),
            comment: item.comment.clone(),
            text: item.text.clone(),
        })
    }

    fn build_deleted(&mut self, item: &CommentEntry<'a>, _old_index: usize) -> Option<CommentDiff> {
        Some(CommentDiff::Deleted {
            comment_id: item.id.to_string(),
            comment: item.comment.clone(),
            text: item.text.clone(),
        })
    }

    fn build_modified(
        &mut self,
        old: &CommentEntry<'a>,
        new: &CommentEntry<'a>,
        _old_index: usize,
    ) -> Option<CommentDiff> {
        let content_diff = diff_nodes(&old.entries, &new.entries, self.config);
        let attrs_diff = self.metadata_diff(old.comment, new.comment);
        if content_diff.is_empty() && attrs_diff.is_none() {
            return None;
        }
        Some(CommentDiff::Modified {
            comment_id: old.id.to_string(),
            old_comment: old.comment.clone(),
            new_comment: new.comment.clone(),
            old_text: old.text.clone(),
            new_text: new.text.clone(),
            content_diff,
            attrs_diff,
        })
    }

    fn equal_is_modification(&self, old: &CommentEntry<'a>, new: &CommentEntry<'a>) -> bool {
        old.comment.body != new.comment.body
            || self.metadata_diff(old.comment, new.comment).is_some()
    }
}

/// Diff two comment collections.
///
/// Order is significant: a comment that moves relative to its neighbours is
/// reported as deleted at its old place and added at its new one.
pub fn diff_comments(old: &[Comment], new: &[Comment], config: &DiffConfig) -> Vec<CommentDiff> {
    let old_entries = build_comment_entries(old, config);
    let new_entries = build_comment_entries(new, config);
    let records = diff_sequences(&old_entries, &new_entries, &mut CommentHooks { config });
    debug!(
        old = old_entries.len(),
        new = new_entries.len(),
        records = records.len(),
        "comment diff"
    );
    records
}

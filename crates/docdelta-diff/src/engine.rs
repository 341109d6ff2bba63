//! The configured entry point: diff a document tree and its comments in one
//! call.

use docdelta_types::{Comment, Node};
use serde::Serialize;
use tracing::debug;

use crate::comment::{diff_comments, CommentDiff};
use crate::config::DiffConfig;
use crate::error::DiffResult;
use crate::node::{diff_nodes, normalize_tree, NodeDiff};
use crate::sequence::DiffAction;

/// Diff engine holding a validated configuration.
#[derive(Clone, Debug, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    /// Create an engine, rejecting invalid configuration.
    pub fn new(config: DiffConfig) -> DiffResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create an engine from a TOML configuration fragment.
    pub fn from_toml_str(source: &str) -> DiffResult<Self> {
        Ok(Self {
            config: DiffConfig::from_toml_str(source)?,
        })
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Diff two document trees.
    pub fn diff_trees(&self, old_root: &Node, new_root: &Node) -> Vec<NodeDiff> {
        let old_entries = normalize_tree(old_root, &self.config);
        let new_entries = normalize_tree(new_root, &self.config);
        diff_nodes(&old_entries, &new_entries, &self.config)
    }

    /// Diff two comment collections.
    pub fn diff_comments(&self, old: &[Comment], new: &[Comment]) -> Vec<CommentDiff> {
        diff_comments(old, new, &self.config)
    }

    /// Diff two document versions: their trees and their comments.
    pub fn diff_documents(
        &self,
        old_root: &Node,
        new_root: &Node,
        old_comments: &[Comment],
        new_comments: &[Comment],
    ) -> DocumentDiff {
        let diff = DocumentDiff {
            doc_diffs: self.diff_trees(old_root, new_root),
            comment_diffs: self.diff_comments(old_comments, new_comments),
        };
        let counts = diff.counts();
        debug!(
            doc_records = diff.doc_diffs.len(),
            comment_records = diff.comment_diffs.len(),
            added = counts.added,
            deleted = counts.deleted,
            modified = counts.modified,
            "document diff"
        );
        diff
    }
}

/// Record counts per action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub added: usize,
    pub deleted: usize,
    pub modified: usize,
}

impl ActionCounts {
    fn record(&mut self, action: DiffAction) {
        match action {
            DiffAction::Added => self.added += 1,
            DiffAction::Deleted => self.deleted += 1,
            DiffAction::Modified => self.modified += 1,
        }
    }
}

/// The result of [`DiffEngine::diff_documents`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDiff {
    /// Records for the document tree.
    pub doc_diffs: Vec<NodeDiff>,
    /// Records for the comment collection.
    pub comment_diffs: Vec<CommentDiff>,
}

impl DocumentDiff {
    /// Returns `true` if the two versions are equivalent.
    pub fn is_empty(&self) -> bool {
        self.doc_diffs.is_empty() && self.comment_diffs.is_empty()
    }

    /// Total number of top-level records.
    pub fn len(&self) -> usize {
        self.doc_diffs.len() + self.comment_diffs.len()
    }

    /// Count top-level records by action.
    pub fn counts(&self) -> ActionCounts {
        let mut counts = ActionCounts::default();
        let actions = self
            .doc_diffs
            .iter()
            .map(NodeDiff::action)
            .chain(self.comment_diffs.iter().map(CommentDiff::action));
        for action in actions {
            counts.record(action);
        }
        counts
    }
}

//! Structural diff engine for docdelta documents.
//!
//! Compares two versions of a document tree, and of its comment collection,
//! producing added, deleted, and modified records at four granularities:
//! nodes, paragraphs, inline content, and comments. Every granularity is a
//! specialization of one generic sequence diff ([`sequence::diff_sequences`])
//! driven by a Myers shortest edit script ([`myers::edit_script`]).
//!
//! # Key Types
//!
//! - [`DiffEngine`] / [`DocumentDiff`] -- Configured entry point and its result
//! - [`NodeDiff`] -- Tree-level records (paragraphs and other nodes)
//! - [`ParagraphDiff`] / [`InlineDiff`] -- Paragraph and inline records
//! - [`CommentDiff`] -- Comment records keyed by resolved id
//! - [`AttributesDiff`] / [`MarksDiff`] -- Attribute and mark changes
//! - [`DiffConfig`] -- Heuristic thresholds and node type names

pub mod attributes;
pub mod comment;
pub mod config;
pub mod engine;
pub mod error;
pub mod inline;
pub mod myers;
pub mod node;
pub mod paragraph;
pub mod position;
pub mod sequence;
pub mod similarity;

pub use attributes::{diff_attributes, diff_marks, AttributesDiff, MarksDiff};
pub use comment::{build_comment_entries, diff_comments, CommentDiff, CommentEntry};
pub use config::{DiffConfig, IGNORED_ATTRIBUTES};
pub use engine::{ActionCounts, DiffEngine, DocumentDiff};
pub use error::{DiffError, DiffResult};
pub use inline::{diff_inline, tokenize_inline, InlineDiff, InlineNodeDiff, InlineToken, TextDiff};
pub use node::{diff_nodes, normalize_tree, NodeChange, NodeDiff, NodeEntry, TreeEntry};
pub use paragraph::{diff_paragraphs, snapshot_paragraph, ParagraphDiff, ParagraphSnapshot};
pub use sequence::{diff_sequences, DiffAction, SequenceHooks};

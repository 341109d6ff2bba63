//! Document model for docdelta.
//!
//! This crate provides the tree, mark, and comment types consumed by the diff
//! engine. Positions follow a flat token model: a text node occupies one
//! position per character, a leaf node occupies one position, and a container
//! node occupies its content plus an opening and a closing position.
//!
//! # Key Types
//!
//! - [`Node`] — Block, inline, or text node with attributes and marks
//! - [`Mark`] — Named, attributed annotation applied to a text span
//! - [`Comment`] — Out-of-band comment with metadata and an optional body
//! - [`Attrs`] — Attribute map (JSON object)

pub mod comment;
pub mod error;
pub mod mark;
pub mod node;

pub use comment::Comment;
pub use error::TypeError;
pub use mark::Mark;
pub use node::{Attrs, Node, NodeVisit};

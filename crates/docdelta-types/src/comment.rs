use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::node::{Attrs, Node};

/// A document comment kept outside the main tree.
///
/// A comment may carry up to three identifiers depending on where it came
/// from; [`Comment::resolved_id`] picks the authoritative one. Every other
/// field lands in [`Comment::metadata`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Identifier assigned by the source file the comment was imported from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_id: Option<String>,
    /// Identifier assigned by the host application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Legacy comment identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
    /// Serialized comment body, in the same node shape as the document tree.
    #[serde(default, rename = "commentJSON", skip_serializing_if = "Option::is_none")]
    pub body: Option<Node>,
    /// Remaining comment fields (author, timestamps, resolution state, ...).
    #[serde(flatten)]
    pub metadata: Attrs,
}

impl Comment {
    /// Create a comment with the given host identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Builder: set the imported identifier.
    pub fn with_imported_id(mut self, id: impl Into<String>) -> Self {
        self.imported_id = Some(id.into());
        self
    }

    /// Builder: set the comment body.
    pub fn with_body(mut self, body: Node) -> Self {
        self.body = Some(body);
        self
    }

    /// Builder: set one metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Build a comment from its JSON shape, validating the body if present.
    pub fn from_value(value: Value) -> Result<Self, TypeError> {
        let comment: Comment =
            serde_json::from_value(value).map_err(|e| TypeError::Serialization(e.to_string()))?;
        if let Some(body) = &comment.body {
            body.validate()?;
        }
        Ok(comment)
    }

    /// The stable identifier: imported id, then id, then comment id.
    ///
    /// Empty strings are treated as missing.
    pub fn resolved_id(&self) -> Option<&str> {
        [&self.imported_id, &self.id, &self.comment_id]
            .into_iter()
            .filter_map(|id| id.as_deref())
            .find(|id| !id.is_empty())
    }

    /// Plain text of the body, or an empty string when there is none.
    pub fn body_text(&self) -> String {
        self.body.as_ref().map(Node::text_content).unwrap_or_default()
    }
}

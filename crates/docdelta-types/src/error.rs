use thiserror::Error;

/// Errors produced while building document model values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid {kind} node: {reason}")]
    InvalidNode { kind: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TypeError {
    pub(crate) fn invalid_node(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNode {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::Attrs;

/// A named annotation applied to a span of text (emphasis, a link, a
/// tracked-change wrapper, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    /// The mark type name, e.g. `bold`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Mark attributes.
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    /// Create a mark with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attrs::new(),
        }
    }

    /// Builder: set one attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_type_and_attrs() {
        let mark = Mark::new("bold").with_attr("level", 2);
        assert_eq!(
            serde_json::to_value(&mark).unwrap(),
            json!({"type": "bold", "attrs": {"level": 2}})
        );
    }

    #[test]
    fn missing_attrs_deserialize_empty() {
        let mark: Mark = serde_json::from_value(json!({"type": "italic"})).unwrap();
        assert_eq!(mark, Mark::new("italic"));
    }
}

//! Document tree nodes and position arithmetic.
//!
//! A [`Node`] is one of three shapes:
//!
//! - a text node (`text` is set) occupying one position per character,
//! - a leaf node (neither `text` nor `content`) occupying a single position,
//! - a container node (`content` is set, possibly empty) occupying its
//!   content size plus two positions for its opening and closing boundaries.
//!
//! Positions reported by [`Node::descendants`] are relative to the start of
//! the walked node's content, so walking a document root yields absolute
//! document positions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::mark::Mark;

/// Attribute map carried by nodes, marks, and comments.
pub type Attrs = Map<String, Value>;

/// A node in a document tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable type name, e.g. `paragraph`, `run`, `text`, `tableRow`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Node attributes.
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    /// Marks applied to this node (usually only on text nodes).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    /// Character data for text nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Children of container nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<Node>>,
}

/// One step of a [`Node::descendants`] walk.
#[derive(Clone, Copy, Debug)]
pub struct NodeVisit<'a> {
    /// The visited node.
    pub node: &'a Node,
    /// Position of the node, relative to the walked root's content start.
    pub pos: usize,
    /// The node's direct parent.
    pub parent: &'a Node,
    /// Nesting depth below the walked root (direct children are at depth 0).
    pub depth: usize,
}

impl Node {
    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Create a leaf (atom) node such as an image or a hard break.
    pub fn leaf(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Create a container node with the given children.
    pub fn element(kind: impl Into<String>, content: Vec<Node>) -> Self {
        Self {
            kind: kind.into(),
            content: Some(content),
            ..Default::default()
        }
    }

    /// Builder: set one attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Builder: replace the attribute map.
    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Builder: replace the mark list.
    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = marks;
        self
    }

    /// Build a node from its JSON shape, rejecting malformed nodes.
    pub fn from_value(value: Value) -> Result<Self, TypeError> {
        let node: Node =
            serde_json::from_value(value).map_err(|e| TypeError::Serialization(e.to_string()))?;
        node.validate()?;
        Ok(node)
    }

    /// Check the shape invariants of this node and all of its descendants.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.kind.is_empty() {
            return Err(TypeError::invalid_node("untyped", "missing type name"));
        }
        match (&self.text, &self.content) {
            (Some(_), Some(_)) => Err(TypeError::invalid_node(
                &self.kind,
                "text and content are mutually exclusive",
            )),
            (Some(text), None) if text.is_empty() => {
                Err(TypeError::invalid_node(&self.kind, "text nodes must not be empty"))
            }
            (None, Some(children)) => children.iter().try_for_each(Node::validate),
            _ => Ok(()),
        }
    }

    /// Returns `true` for text nodes.
    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    /// Returns `true` for leaf nodes (no text, no content).
    pub fn is_leaf(&self) -> bool {
        self.text.is_none() && self.content.is_none()
    }

    /// The node's children (empty for text and leaf nodes).
    pub fn children(&self) -> &[Node] {
        self.content.as_deref().unwrap_or_default()
    }

    /// Look up an attribute, treating JSON `null` as absent.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key).filter(|v| !v.is_null())
    }

    /// Sum of the sizes of this node's children.
    pub fn content_size(&self) -> usize {
        self.children().iter().map(Node::node_size).sum()
    }

    /// Number of positions this node occupies in its parent.
    pub fn node_size(&self) -> usize {
        match (&self.text, &self.content) {
            (Some(text), _) => text.chars().count(),
            (None, Some(_)) => self.content_size() + 2,
            (None, None) => 1,
        }
    }

    /// Concatenated text of this node and all of its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in self.children() {
            child.collect_text(out);
        }
    }

    /// Walk all descendants in document order.
    ///
    /// The callback returns whether the walk should descend into the visited
    /// node's children.
    pub fn descendants<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(NodeVisit<'a>) -> bool,
    {
        self.walk_children(0, 0, &mut f);
    }

    fn walk_children<'a, F>(&'a self, start: usize, depth: usize, f: &mut F)
    where
        F: FnMut(NodeVisit<'a>) -> bool,
    {
        let mut pos = start;
        for child in self.children() {
            let descend = f(NodeVisit {
                node: child,
                pos,
                parent: self,
                depth,
            });
            if descend && child.content.is_some() {
                child.walk_children(pos + 1, depth + 1, f);
            }
            pos += child.node_size();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample_doc() -> Node {
        Node::element(
            "doc",
            vec![
                Node::element(
                    "paragraph",
                    vec![Node::element("run", vec![Node::text("Hi")]), Node::leaf("image")],
                ),
                Node::element("paragraph", vec![]),
            ],
        )
    }

    #[test]
    fn node_sizes() {
        assert_eq!(Node::text("héllo").node_size(), 5);
        assert_eq!(Node::leaf("hardBreak").node_size(), 1);
        assert_eq!(Node::element("paragraph", vec![]).node_size(), 2);
        // paragraph(run("Hi"), image) = 1 + (2 + 2) + 1 + 1
        assert_eq!(sample_doc().children()[0].node_size(), 7);
        assert_eq!(sample_doc().content_size(), 9);
    }

    #[test]
    fn descendants_report_positions_and_depths() {
        let doc = sample_doc();
        let mut seen = Vec::new();
        doc.descendants(|visit| {
            seen.push((visit.node.kind.clone(), visit.pos, visit.depth, visit.parent.kind.clone()));
            true
        });
        assert_eq!(
            seen,
            vec![
                ("paragraph".into(), 0, 0, "doc".into()),
                ("run".into(), 1, 1, "paragraph".into()),
                ("text".into(), 2, 2, "run".into()),
                ("image".into(), 5, 1, "paragraph".into()),
                ("paragraph".into(), 7, 0, "doc".into()),
            ]
        );
    }

    #[test]
    fn descendants_can_skip_subtrees() {
        let doc = sample_doc();
        let mut kinds = Vec::new();
        doc.descendants(|visit| {
            kinds.push(visit.node.kind.clone());
            visit.node.kind != "paragraph"
        });
        assert_eq!(kinds, vec!["paragraph", "paragraph"]);
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let para = Node::element(
            "paragraph",
            vec![
                Node::element("run", vec![Node::text("Hello ")]),
                Node::leaf("image"),
                Node::element("run", vec![Node::text("world")]),
            ],
        );
        assert_eq!(para.text_content(), "Hello world");
    }

    #[test]
    fn from_value_accepts_json_shape() {
        let node = Node::from_value(json!({
            "type": "paragraph",
            "attrs": {"paraId": "p1"},
            "content": [{"type": "text", "text": "x", "marks": [{"type": "bold"}]}]
        }))
        .unwrap();
        assert_eq!(node.attr("paraId"), Some(&json!("p1")));
        assert_eq!(node.children()[0].marks[0].kind, "bold");
    }

    #[test]
    fn from_value_rejects_text_with_content() {
        let err = Node::from_value(json!({"type": "text", "text": "a", "content": []})).unwrap_err();
        assert!(matches!(err, TypeError::InvalidNode { .. }));
    }

    #[test]
    fn from_value_rejects_empty_text() {
        let err = Node::from_value(json!({
            "type": "paragraph",
            "content": [{"type": "text", "text": ""}]
        }))
        .unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidNode {
                kind: "text".into(),
                reason: "text nodes must not be empty".into()
            }
        );
    }

    #[test]
    fn null_attributes_are_absent() {
        let node = Node::leaf("image").with_attr("src", Value::Null);
        assert!(node.attr("src").is_none());
    }

    fn tree_strategy() -> impl Strategy<Value = Node> {
        let leaf = prop_oneof![
            "[a-zé ]{1,6}".prop_map(Node::text),
            Just(Node::leaf("image")),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            proptest::collection::vec(inner, 0..4).prop_map(|children| Node::element("block", children))
        })
    }

    proptest! {
        #[test]
        fn descendant_positions_increase_and_fit(children in proptest::collection::vec(tree_strategy(), 0..4)) {
            let root = Node::element("doc", children);
            let end = root.content_size();
            let mut last = None;
            let mut ok = true;
            root.descendants(|visit| {
                ok &= last.map_or(true, |prev| visit.pos > prev);
                ok &= visit.pos + visit.node.node_size() <= end;
                last = Some(visit.pos);
                true
            });
            prop_assert!(ok);
            prop_assert_eq!(root.node_size(), end + 2);
        }
    }
}

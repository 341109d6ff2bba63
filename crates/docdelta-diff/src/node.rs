//! Tree-level diff: compare two normalized document trees.
//!
//! A tree is flattened into [`TreeEntry`]s in document order. Paragraphs
//! become snapshots and are diffed by [`crate::paragraph`]; every other node
//! is matched by type name (or by stable row id for table rows) and compared
//! on its attributes only.
//!
//! When a non-paragraph node is added or deleted, its descendants are
//! recorded as consumed so that they do not produce records of their own.
//! A consumed entry matched or re-paired with an entry that is not consumed
//! on the other side still reports that other entry, as an addition or a
//! deletion.

use std::collections::HashSet;

use docdelta_types::Node;
use serde::Serialize;
use tracing::{debug, trace};

use crate::attributes::{diff_attributes_with, AttributesDiff};
use crate::config::DiffConfig;
use crate::myers::EditOp;
use crate::paragraph::{
    added_paragraph, deleted_paragraph, modified_paragraph, paragraphs_match, paragraphs_pair,
    snapshot_paragraph, ParagraphDiff, ParagraphSnapshot,
};
use crate::position::{insertion_anchor, Positioned};
use crate::sequence::{diff_sequences, interleave_changes, DiffAction, SequenceHooks};

/// A non-paragraph node located in the document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeEntry<'a> {
    pub node: &'a Node,
    pub pos: usize,
    pub depth: usize,
}

/// One entry of a normalized tree.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeEntry<'a> {
    Paragraph(ParagraphSnapshot<'a>),
    Node(NodeEntry<'a>),
}

impl<'a> TreeEntry<'a> {
    /// The underlying document node.
    pub fn node(&self) -> &'a Node {
        match self {
            Self::Paragraph(paragraph) => paragraph.node,
            Self::Node(entry) => entry.node,
        }
    }
}

impl Positioned for TreeEntry<'_> {
    fn pos(&self) -> usize {
        match self {
            Self::Paragraph(paragraph) => paragraph.pos,
            Self::Node(entry) => entry.pos,
        }
    }

    fn depth(&self) -> usize {
        match self {
            Self::Paragraph(paragraph) => paragraph.depth,
            Self::Node(entry) => entry.depth,
        }
    }

    fn node_size(&self) -> usize {
        self.node().node_size()
    }
}

/// Flatten the descendants of `root` into entries, in document order.
///
/// Positions are relative to the start of `root`'s content. Paragraphs are
/// not descended: their inline content lives in the snapshot's tokens.
pub fn normalize_tree<'a>(root: &'a Node, config: &DiffConfig) -> Vec<TreeEntry<'a>> {
    let mut entries = Vec::new();
    root.descendants(|visit| {
        if visit.node.kind == config.paragraph_type {
            entries.push(TreeEntry::Paragraph(snapshot_paragraph(
                visit.node,
                visit.pos,
                visit.depth,
                config,
            )));
            false
        } else {
            entries.push(TreeEntry::Node(NodeEntry {
                node: visit.node,
                pos: visit.pos,
                depth: visit.depth,
            }));
            true
        }
    });
    entries
}

/// A change to a non-paragraph node.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum NodeChange {
    Added {
        node_type: String,
        node: Node,
        pos: usize,
    },
    Deleted {
        node_type: String,
        node: Node,
        pos: usize,
    },
    /// Attribute change only; content changes surface on descendants.
    Modified {
        node_type: String,
        old_node: Node,
        new_node: Node,
        pos: usize,
        attrs_diff: AttributesDiff,
    },
}

/// A record produced by [`diff_nodes`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeDiff {
    Paragraph(ParagraphDiff),
    Node(NodeChange),
}

impl NodeDiff {
    pub fn action(&self) -> DiffAction {
        match self {
            Self::Paragraph(diff) => diff.action(),
            Self::Node(NodeChange::Added { .. }) => DiffAction::Added,
            Self::Node(NodeChange::Deleted { .. }) => DiffAction::Deleted,
            Self::Node(NodeChange::Modified { .. }) => DiffAction::Modified,
        }
    }
}

fn nodes_match(old: &Node, new: &Node, config: &DiffConfig) -> bool {
    if old.kind != new.kind {
        return false;
    }
    if old.kind != config.row_type {
        return true;
    }
    match (old.attr(&config.row_id_attr), new.attr(&config.row_id_attr)) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Record the absolute positions of every descendant of `entry`.
fn consume_descendants(consumed: &mut HashSet<usize>, entry: &NodeEntry<'_>) {
    entry.node.descendants(|visit| {
        consumed.insert(entry.pos + 1 + visit.pos);
        true
    });
}

struct NodeHooks<'c, 's, 'a> {
    config: &'c DiffConfig,
    old: &'s [TreeEntry<'a>],
    consumed_old: HashSet<usize>,
    consumed_new: HashSet<usize>,
}

impl<'a> NodeHooks<'_, '_, 'a> {
    fn consumed(&self, old: &TreeEntry<'a>, new: &TreeEntry<'a>) -> (bool, bool) {
        (
            self.consumed_old.contains(&old.pos()),
            self.consumed_new.contains(&new.pos()),
        )
    }
}

impl<'a> SequenceHooks<TreeEntry<'a>> for NodeHooks<'_, '_, 'a> {
    type Record = NodeDiff;

    fn matches(&self, old: &TreeEntry<'a>, new: &TreeEntry<'a>) -> bool {
        match (old, new) {
            (TreeEntry::Paragraph(a), TreeEntry::Paragraph(b)) => {
                paragraphs_match(a, b, self.config)
            }
            (TreeEntry::Node(a), TreeEntry::Node(b)) => nodes_match(a.node, b.node, self.config),
            _ => false,
        }
    }

    fn build_added(
        &mut self,
        item: &TreeEntry<'a>,
        _old_index: usize,
        previous_old: Option<&TreeEntry<'a>>,
    ) -> Option<NodeDiff> {
        if self.consumed_new.contains(&item.pos()) {
            trace!(pos = item.pos(), "skipping addition covered by an ancestor");
            return None;
        }
        let pos = insertion_anchor(previous_old, item.depth());
        Some(match item {
            TreeEntry::Paragraph(paragraph) => NodeDiff::Paragraph(added_paragraph(paragraph, pos)),
            TreeEntry::Node(entry) => {
                consume_descendants(&mut self.consumed_new, entry);
                NodeDiff::Node(NodeChange::Added {
                    node_type: entry.node.kind.clone(),
                    node: entry.node.clone(),
                    pos,
                })
            }
        })
    }

    fn build_deleted(&mut self, item: &TreeEntry<'a>, _old_index: usize) -> Option<NodeDiff> {
        if self.consumed_old.contains(&item.pos()) {
            trace!(pos = item.pos(), "skipping deletion covered by an ancestor");
            return None;
        }
        Some(match item {
            TreeEntry::Paragraph(paragraph) => NodeDiff::Paragraph(deleted_paragraph(paragraph)),
            TreeEntry::Node(entry) => {
                consume_descendants(&mut self.consumed_old, entry);
                NodeDiff::Node(NodeChange::Deleted {
                    node_type: entry.node.kind.clone(),
                    node: entry.node.clone(),
                    pos: entry.pos,
                })
            }
        })
    }

    fn build_modified(
        &mut self,
        old: &TreeEntry<'a>,
        new: &TreeEntry<'a>,
        old_index: usize,
    ) -> Option<NodeDiff> {
        match self.consumed(old, new) {
            (true, true) => return None,
            (true, false) => {
                let old_entries = self.old;
                let previous = old_index.checked_sub(1).map(|p| &old_entries[p]);
                return self.build_added(new, old_index, previous);
            }
            (false, true) => return self.build_deleted(old, old_index),
            (false, false) => {}
        }
        match (old, new) {
            (TreeEntry::Paragraph(a), TreeEntry::Paragraph(b)) => {
                modified_paragraph(a, b, self.config).map(NodeDiff::Paragraph)
            }
            (TreeEntry::Node(a), TreeEntry::Node(b)) => {
                let attrs_diff = diff_attributes_with(
                    &a.node.attrs,
                    &b.node.attrs,
                    &self.config.ignored_attributes,
                    &[],
                )?;
                Some(NodeDiff::Node(NodeChange::Modified {
                    node_type: a.node.kind.clone(),
                    old_node: a.node.clone(),
                    new_node: b.node.clone(),
                    pos: a.pos,
                    attrs_diff,
                }))
            }
            _ => None,
        }
    }

    fn equal_is_modification(&self, old: &TreeEntry<'a>, new: &TreeEntry<'a>) -> bool {
        let (old_consumed, new_consumed) = self.consumed(old, new);
        if old_consumed != new_consumed {
            return true;
        }
        match (old, new) {
            (TreeEntry::Paragraph(a), TreeEntry::Paragraph(b)) => a.node != b.node,
            (TreeEntry::Node(a), TreeEntry::Node(b)) => a.node.attrs != b.node.attrs,
            _ => false,
        }
    }

    fn can_pair(&self, deleted: &TreeEntry<'a>, inserted: &TreeEntry<'a>) -> bool {
        match (deleted, inserted) {
            (TreeEntry::Paragraph(a), TreeEntry::Paragraph(b)) => {
                paragraphs_pair(a, b, self.config)
            }
            _ => false,
        }
    }

    fn reorder(&self, ops: Vec<EditOp>) -> Vec<EditOp> {
        interleave_changes(ops)
    }
}

/// Diff two normalized trees.
pub fn diff_nodes<'a>(
    old: &[TreeEntry<'a>],
    new: &[TreeEntry<'a>],
    config: &DiffConfig,
) -> Vec<NodeDiff> {
    let mut hooks = NodeHooks {
        config,
        old,
        consumed_old: HashSet::new(),
        consumed_new: HashSet::new(),
    };
    let records = diff_sequences(old, new, &mut hooks);
    debug!(
        old = old.len(),
        new = new.len(),
        records = records.len(),
        consumed_old = hooks.consumed_old.len(),
        consumed_new = hooks.consumed_new.len(),
        "node diff"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::{InlineDiff, TextDiff};
    use proptest::prelude::*;
    use serde_json::json;

    fn para(text: &str) -> Node {
        Node::element("paragraph", vec![Node::element("run", vec![Node::text(text)])])
    }

    fn row(id: &str, text: &str) -> Node {
        Node::element("tableRow", vec![Node::element("tableCell", vec![para(text)])])
            .with_attr("paraId", id)
    }

    fn doc(content: Vec<Node>) -> Node {
        Node::element("doc", content)
    }

    fn diff(old: &Node, new: &Node) -> Vec<NodeDiff> {
        let config = DiffConfig::default();
        diff_nodes(&normalize_tree(old, &config), &normalize_tree(new, &config), &config)
    }

    fn actions(diffs: &[NodeDiff]) -> Vec<DiffAction> {
        diffs.iter().map(NodeDiff::action).collect()
    }

    #[test]
    fn normalize_stops_at_paragraphs() {
        let root = doc(vec![
            Node::element(
                "table",
                vec![Node::element("tableRow", vec![Node::element("tableCell", vec![para("a")])])],
            ),
            para("b"),
        ]);
        let entries = normalize_tree(&root, &DiffConfig::default());

        let summary: Vec<(&str, usize, usize)> = entries
            .iter()
            .map(|e| (e.node().kind.as_str(), e.pos(), e.depth()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("table", 0, 0),
                ("tableRow", 1, 1),
                ("tableCell", 2, 2),
                ("paragraph", 3, 3),
                ("paragraph", 11, 0),
            ]
        );
        assert!(matches!(&entries[3], TreeEntry::Paragraph(p) if p.text == "a"));
    }

    #[test]
    fn identical_trees_have_no_diff() {
        let root = doc(vec![para("one"), Node::leaf("pageBreak"), Node::element("table", vec![row("r1", "x")])]);
        assert!(diff(&root, &root).is_empty());
        assert!(diff(&root, &root.clone()).is_empty());
    }

    #[test]
    fn paragraph_edit_inside_tree() {
        let old = doc(vec![para("Hello world").with_attr("paraId", "p1")]);
        let new = doc(vec![para("Hello brave new world").with_attr("paraId", "p1")]);

        let diffs = diff(&old, &new);
        match &diffs[..] {
            [NodeDiff::Paragraph(ParagraphDiff::Modified { content_diff, .. })] => {
                assert!(matches!(
                    &content_diff[..],
                    [InlineDiff::Text(TextDiff::Added { text, pos: 8, .. })] if text == "brave new "
                ));
            }
            other => panic!("expected one paragraph modification, got {other:?}"),
        }
    }

    #[test]
    fn attribute_change_on_container() {
        let old = doc(vec![Node::element("table", vec![row("r1", "x")]).with_attr("width", 100)]);
        let new = doc(vec![Node::element("table", vec![row("r1", "x")]).with_attr("width", 200)]);

        match &diff(&old, &new)[..] {
            [NodeDiff::Node(NodeChange::Modified { node_type, pos, attrs_diff, .. })] => {
                assert_eq!(node_type, "table");
                assert_eq!(*pos, 0);
                assert_eq!(attrs_diff.modified["width"].to, json!(200));
            }
            other => panic!("expected table modification, got {other:?}"),
        }
    }

    #[test]
    fn added_row_consumes_its_descendants() {
        let old = doc(vec![Node::element("table", vec![row("r1", "one"), row("r2", "two")])]);
        let new = doc(vec![Node::element(
            "table",
            vec![row("r1", "one"), row("rN", "new"), row("r2", "two")],
        )]);

        let diffs = diff(&old, &new);
        match &diffs[..] {
            [NodeDiff::Node(NodeChange::Added { node_type, node, .. })] => {
                assert_eq!(node_type, "tableRow");
                assert_eq!(node.attr("paraId"), Some(&json!("rN")));
            }
            other => panic!("expected one row addition, got {other:?}"),
        }
    }

    #[test]
    fn rows_with_different_ids_do_not_match() {
        let old = doc(vec![Node::element("table", vec![row("r1", "x")])]);
        let new = doc(vec![Node::element("table", vec![row("r2", "x")])]);
        assert_eq!(actions(&diff(&old, &new)), vec![DiffAction::Deleted, DiffAction::Added]);
    }

    #[test]
    fn rows_without_ids_match_by_type() {
        let plain = |text: &str| Node::element("tableRow", vec![Node::element("tableCell", vec![para(text)])]);
        let old = doc(vec![Node::element("table", vec![plain("same")])]);
        let new = doc(vec![Node::element("table", vec![plain("same").with_attr("height", 2)])]);
        assert_eq!(actions(&diff(&old, &new)), vec![DiffAction::Modified]);
    }

    #[test]
    fn deleted_section_consumes_its_paragraphs() {
        let old = doc(vec![
            Node::element("section", vec![para("a long paragraph"), para("another one")]),
            para("tail"),
        ]);
        let new = doc(vec![para("tail")]);

        let diffs = diff(&old, &new);
        assert_eq!(actions(&diffs), vec![DiffAction::Deleted]);
        assert!(matches!(
            &diffs[0],
            NodeDiff::Node(NodeChange::Deleted { node_type, pos: 0, .. }) if node_type == "section"
        ));
    }

    #[test]
    fn hoisted_paragraph_edit_is_reported_as_added() {
        let old = doc(vec![Node::element("section", vec![para("shared paragraph text")])]);
        let new = doc(vec![Node::leaf("pageBreak"), para("shared paragraph text!")]);

        let diffs = diff(&old, &new);
        assert_eq!(
            actions(&diffs),
            vec![DiffAction::Deleted, DiffAction::Added, DiffAction::Added]
        );
        assert!(matches!(
            &diffs[2],
            NodeDiff::Paragraph(ParagraphDiff::Added { text, .. }) if text == "shared paragraph text!"
        ));
    }

    #[test]
    fn hoisted_unchanged_paragraph_is_reported_as_added() {
        let old = doc(vec![Node::element("section", vec![para("kept text")])]);
        let new = doc(vec![Node::leaf("pageBreak"), para("kept text")]);

        let diffs = diff(&old, &new);
        assert_eq!(
            actions(&diffs),
            vec![DiffAction::Deleted, DiffAction::Added, DiffAction::Added]
        );
        // Anchored after the deleted section (paragraph 13 + 2).
        assert!(matches!(
            &diffs[2],
            NodeDiff::Paragraph(ParagraphDiff::Added { text, pos: 15, .. }) if text == "kept text"
        ));
    }

    #[test]
    fn wrapped_paragraph_is_reported_as_deleted() {
        let old = doc(vec![para("kept text")]);
        let new = doc(vec![Node::element("section", vec![para("kept text")])]);

        let diffs = diff(&old, &new);
        assert_eq!(actions(&diffs), vec![DiffAction::Added, DiffAction::Deleted]);
        assert!(matches!(
            &diffs[0],
            NodeDiff::Node(NodeChange::Added { node_type, .. }) if node_type == "section"
        ));
        assert!(matches!(
            &diffs[1],
            NodeDiff::Paragraph(ParagraphDiff::Deleted { text, pos: 0, .. }) if text == "kept text"
        ));
    }

    #[test]
    fn different_kinds_never_match() {
        let old = doc(vec![para("x")]);
        let new = doc(vec![Node::leaf("image")]);
        assert_eq!(actions(&diff(&old, &new)), vec![DiffAction::Deleted, DiffAction::Added]);
    }

    #[test]
    fn node_records_serialize_flat() {
        let diffs = diff(&doc(vec![]), &doc(vec![Node::leaf("pageBreak")]));
        assert_eq!(
            serde_json::to_value(&diffs).unwrap(),
            json!([{"action": "added", "nodeType": "pageBreak", "node": {"type": "pageBreak"}, "pos": 0}])
        );
    }

    fn paragraph_strategy() -> impl Strategy<Value = Node> {
        proptest::collection::vec("[a-z ]{1,8}", 0..3).prop_map(|texts| {
            Node::element(
                "paragraph",
                texts
                    .into_iter()
                    .map(|t| Node::element("run", vec![Node::text(t)]))
                    .collect(),
            )
        })
    }

    fn tree_strategy() -> impl Strategy<Value = Node> {
        let leaf = prop_oneof![paragraph_strategy(), Just(Node::leaf("pageBreak"))];
        let block = leaf.prop_recursive(3, 24, 4, |inner| {
            proptest::collection::vec(inner, 0..4)
                .prop_map(|children| Node::element("section", children))
        });
        proptest::collection::vec(block, 0..5).prop_map(|children| Node::element("doc", children))
    }

    proptest! {
        #[test]
        fn tree_diffed_against_itself_is_empty(root in tree_strategy()) {
            prop_assert!(diff(&root, &root.clone()).is_empty());
        }

        #[test]
        fn unwrapping_a_section_reports_every_child(
            children in proptest::collection::vec(
                prop_oneof![paragraph_strategy(), Just(Node::leaf("pageBreak"))],
                0..6,
            )
        ) {
            let old = doc(vec![Node::element("section", children.clone())]);
            let new = doc(children.clone());

            let diffs = diff(&old, &new);
            let counts = actions(&diffs);
            prop_assert_eq!(counts.first(), Some(&DiffAction::Deleted));
            prop_assert_eq!(counts.iter().filter(|a| **a == DiffAction::Deleted).count(), 1);
            prop_assert_eq!(counts.iter().filter(|a| **a == DiffAction::Added).count(), children.len());
            prop_assert!(!counts.contains(&DiffAction::Modified));
        }
    }
}

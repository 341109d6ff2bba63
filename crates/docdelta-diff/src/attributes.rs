//! Attribute and mark diff: structural comparison of attribute maps.
//!
//! Nested objects are flattened into dotted paths (`spacing.before`), while
//! arrays and primitives are compared as opaque values. Keys in the ignore
//! set are skipped at every nesting level.

use std::collections::{BTreeMap, BTreeSet};

use docdelta_types::{Attrs, Mark};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::IGNORED_ATTRIBUTES;

/// Old and new value of a modified attribute path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModifiedValue {
    pub from: Value,
    pub to: Value,
}

/// The result of comparing two attribute maps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AttributesDiff {
    /// Paths present only in the new map.
    pub added: BTreeMap<String, Value>,
    /// Paths present only in the old map.
    pub deleted: BTreeMap<String, Value>,
    /// Paths present in both maps with different values.
    pub modified: BTreeMap<String, ModifiedValue>,
}

impl AttributesDiff {
    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    /// Total number of changed paths.
    pub fn len(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len()
    }
}

/// Old and new attributes of a mark present on both sides.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModifiedMark {
    pub from: Attrs,
    pub to: Attrs,
    /// Path-level description of the attribute change.
    pub attrs_diff: AttributesDiff,
}

/// The result of comparing two mark collections, keyed by mark type.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MarksDiff {
    /// Marks present only on the new side.
    pub added: BTreeMap<String, Attrs>,
    /// Marks present only on the old side.
    pub deleted: BTreeMap<String, Attrs>,
    /// Marks present on both sides with different attributes.
    pub modified: BTreeMap<String, ModifiedMark>,
}

impl MarksDiff {
    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }
}

/// Compare two attribute maps using the default ignore set plus
/// `extra_ignored`.
///
/// Returns `None` when the maps are equivalent.
pub fn diff_attributes(old: &Attrs, new: &Attrs, extra_ignored: &[&str]) -> Option<AttributesDiff> {
    diff_attributes_with(old, new, IGNORED_ATTRIBUTES, extra_ignored)
}

/// Compare two attribute maps with an explicit ignore set.
pub fn diff_attributes_with<S: AsRef<str>>(
    old: &Attrs,
    new: &Attrs,
    ignored: &[S],
    extra_ignored: &[&str],
) -> Option<AttributesDiff> {
    let filter = KeyFilter {
        ignored,
        extra: extra_ignored,
    };
    let mut diff = AttributesDiff::default();
    diff_objects("", old, new, &filter, &mut diff);
    (!diff.is_empty()).then_some(diff)
}

/// Compare two mark collections using the default ignore set.
pub fn diff_marks(old: &[Mark], new: &[Mark]) -> Option<MarksDiff> {
    diff_marks_with(old, new, IGNORED_ATTRIBUTES)
}

/// Compare two mark collections with an explicit ignore set.
///
/// Each side is treated as a mapping from mark type to its attributes; if a
/// type appears more than once, the last occurrence wins.
pub fn diff_marks_with<S: AsRef<str>>(
    old: &[Mark],
    new: &[Mark],
    ignored: &[S],
) -> Option<MarksDiff> {
    let filter = KeyFilter { ignored, extra: &[] };
    let old_map = marks_by_type(old, &filter);
    let new_map = marks_by_type(new, &filter);

    let mut diff = MarksDiff::default();
    for (kind, old_attrs) in &old_map {
        match new_map.get(kind) {
            None => {
                diff.deleted.insert((*kind).to_string(), old_attrs.clone());
            }
            Some(new_attrs) => {
                if let Some(attrs_diff) = diff_attributes_with(old_attrs, new_attrs, ignored, &[]) {
                    diff.modified.insert(
                        (*kind).to_string(),
                        ModifiedMark {
                            from: old_attrs.clone(),
                            to: new_attrs.clone(),
                            attrs_diff,
                        },
                    );
                }
            }
        }
    }
    for (kind, new_attrs) in &new_map {
        if !old_map.contains_key(kind) {
            diff.added.insert((*kind).to_string(), new_attrs.clone());
        }
    }

    (!diff.is_empty()).then_some(diff)
}

struct KeyFilter<'a, S> {
    ignored: &'a [S],
    extra: &'a [&'a str],
}

impl<S: AsRef<str>> KeyFilter<'_, S> {
    fn skips(&self, key: &str) -> bool {
        self.ignored.iter().any(|k| k.as_ref() == key) || self.extra.contains(&key)
    }
}

fn marks_by_type<'m, S: AsRef<str>>(
    marks: &'m [Mark],
    filter: &KeyFilter<'_, S>,
) -> BTreeMap<&'m str, Attrs> {
    marks
        .iter()
        .map(|mark| (mark.kind.as_str(), strip_ignored(&mark.attrs, filter)))
        .collect()
}

fn strip_ignored<S: AsRef<str>>(attrs: &Attrs, filter: &KeyFilter<'_, S>) -> Attrs {
    attrs
        .iter()
        .filter(|(key, _)| !filter.skips(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn diff_objects<S: AsRef<str>>(
    prefix: &str,
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    filter: &KeyFilter<'_, S>,
    diff: &mut AttributesDiff,
) {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    for key in keys {
        if filter.skips(key) {
            continue;
        }
        let path = join_path(prefix, key);
        match (old.get(key.as_str()), new.get(key.as_str())) {
            (Some(old_value), None) => flatten_into(&path, old_value, filter, &mut diff.deleted),
            (None, Some(new_value)) => flatten_into(&path, new_value, filter, &mut diff.added),
            (Some(Value::Object(old_obj)), Some(Value::Object(new_obj))) => {
                diff_objects(&path, old_obj, new_obj, filter, diff);
            }
            (Some(old_value), Some(new_value)) => {
                // Arrays land here too: same length and deep-equal, or replaced wholesale.
                if old_value != new_value {
                    diff.modified.insert(
                        path,
                        ModifiedValue {
                            from: old_value.clone(),
                            to: new_value.clone(),
                        },
                    );
                }
            }
            (None, None) => {}
        }
    }
}

/// Record `value` under `path`, expanding non-empty objects into one entry
/// per leaf.
fn flatten_into<S: AsRef<str>>(
    path: &str,
    value: &Value,
    filter: &KeyFilter<'_, S>,
    into: &mut BTreeMap<String, Value>,
) {
    match value {
        Value::Object(obj) if !obj.is_empty() => {
            for (key, child) in obj {
                if !filter.skips(key) {
                    flatten_into(&join_path(path, key), child, filter, into);
                }
            }
        }
        _ => {
            into.insert(path.to_string(), value.clone());
        }
    }
}

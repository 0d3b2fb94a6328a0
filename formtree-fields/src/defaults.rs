//! Values shaped like a field tree.
//!
//! Groups become objects, repeatables arrays, leaves primitives. Every value
//! handed to a validator or submit handler has this shape.

use serde_json::{Map, Value};

use crate::types::{FieldNode, GroupNode, LeafConfig, Widget};

/// The empty value for `tree`: leaf defaults where given, otherwise the
/// widget's zero value, and `min_items` default items per repeatable.
pub fn default_value(tree: &FieldNode) -> Value {
    match tree {
        FieldNode::Leaf(leaf) => leaf_default(leaf),
        FieldNode::Group(group) => group_default(group),
        FieldNode::Repeatable(repeatable) => {
            let count = repeatable.min_items.unwrap_or(0);
            Value::Array((0..count).map(|_| group_default(&repeatable.item)).collect())
        }
    }
}

/// Default value for one new item of a repeatable.
pub fn item_default(group: &GroupNode) -> Value {
    group_default(group)
}

fn group_default(group: &GroupNode) -> Value {
    Value::Object(
        group
            .fields
            .iter()
            .map(|(name, child)| (name.clone(), default_value(child)))
            .collect(),
    )
}

fn leaf_default(leaf: &LeafConfig) -> Value {
    if let Some(value) = &leaf.default {
        return value.clone();
    }
    match leaf.widget {
        Widget::Text { .. } => Value::String(String::new()),
        Widget::Boolean => Value::Bool(false),
        Widget::MultiSelect { .. } => Value::Array(Vec::new()),
        Widget::Number { .. } | Widget::Select { .. } | Widget::Hidden => Value::Null,
    }
}

/// Overlay an existing record onto the shape of `tree`.
///
/// Known keys keep the record's value, missing keys are filled from
/// defaults and keys the tree does not know are dropped. A repeatable whose
/// record value is not an array becomes empty.
pub fn conform(tree: &FieldNode, record: &Value) -> Value {
    match tree {
        FieldNode::Leaf(leaf) => {
            if record.is_null() {
                leaf_default(leaf)
            } else {
                record.clone()
            }
        }
        FieldNode::Group(group) => conform_group(group, record),
        FieldNode::Repeatable(repeatable) => match record.as_array() {
            Some(items) => Value::Array(
                items
                    .iter()
                    .map(|item| conform_group(&repeatable.item, item))
                    .collect(),
            ),
            None => Value::Array(Vec::new()),
        },
    }
}

fn conform_group(group: &GroupNode, record: &Value) -> Value {
    let mut out = Map::new();
    for (name, child) in &group.fields {
        let value = record.get(name).unwrap_or(&Value::Null);
        out.insert(name.clone(), conform(child, value));
    }
    Value::Object(out)
}

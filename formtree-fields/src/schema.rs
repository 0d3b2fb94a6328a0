//! JSON Schema derived from a field tree.
//!
//! The schema is built from the same [`FieldNode`] the paths and lookup come
//! from, so validation cannot disagree with what is rendered.

use serde_json::{json, Map, Value};

use crate::types::{FieldNode, GroupNode, LeafConfig, RepeatableNode, Widget};

/// Derive a JSON Schema describing every valid value of `tree`.
pub fn json_schema(tree: &FieldNode) -> Value {
    match tree {
        FieldNode::Leaf(leaf) => leaf_schema(leaf),
        FieldNode::Group(group) => group_schema(group),
        FieldNode::Repeatable(repeatable) => repeatable_schema(repeatable),
    }
}

fn group_schema(group: &GroupNode) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for (name, child) in &group.fields {
        properties.insert(name.clone(), json_schema(child));
        let is_required = match child {
            FieldNode::Leaf(leaf) => leaf.required,
            FieldNode::Group(_) | FieldNode::Repeatable(_) => true,
        };
        if is_required {
            required.push(Value::String(name.clone()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn repeatable_schema(repeatable: &RepeatableNode) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), json!("array"));
    schema.insert("items".into(), group_schema(&repeatable.item));
    if let Some(min) = repeatable.min_items {
        schema.insert("minItems".into(), json!(min));
    }
    if let Some(max) = repeatable.max_items {
        schema.insert("maxItems".into(), json!(max));
    }
    Value::Object(schema)
}

fn option_values(options: &[crate::types::SelectOption]) -> Vec<Value> {
    options.iter().map(|o| Value::String(o.value.clone())).collect()
}

fn leaf_schema(leaf: &LeafConfig) -> Value {
    let mut schema = Map::new();
    match &leaf.widget {
        Widget::Text { max_length, .. } => {
            schema.insert("type".into(), json!("string"));
            if let Some(max) = max_length {
                schema.insert("maxLength".into(), json!(max));
            }
            if leaf.required {
                schema.insert("minLength".into(), json!(1));
            }
        }
        Widget::Number { min, max } => {
            schema.insert("type".into(), json!("number"));
            if let Some(min) = min {
                schema.insert("minimum".into(), json!(min));
            }
            if let Some(max) = max {
                schema.insert("maximum".into(), json!(max));
            }
        }
        Widget::Boolean => {
            schema.insert("type".into(), json!("boolean"));
        }
        Widget::Select { options } => {
            // an empty option list is filled in at show time, accept any string
            if options.is_empty() {
                schema.insert("type".into(), json!("string"));
            } else {
                schema.insert("enum".into(), Value::Array(option_values(options)));
            }
        }
        Widget::MultiSelect { options } => {
            schema.insert("type".into(), json!("array"));
            schema.insert("uniqueItems".into(), json!(true));
            let items = if options.is_empty() {
                json!({"type": "string"})
            } else {
                json!({"enum": option_values(options)})
            };
            schema.insert("items".into(), items);
            if leaf.required {
                schema.insert("minItems".into(), json!(1));
            }
        }
        Widget::Hidden => {}
    }

    if leaf.required || matches!(leaf.widget, Widget::Hidden) {
        Value::Object(schema)
    } else {
        json!({ "anyOf": [Value::Object(schema), {"type": "null"}] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RepeatableNode, SelectOption};

    #[test]
    fn group_lists_required_children() {
        let tree: FieldNode = GroupNode::new()
            .field("name", LeafConfig::text().required())
            .field("notes", LeafConfig::textarea())
            .field("meta", GroupNode::new())
            .into();
        let schema = json_schema(&tree);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["name", "meta"]));
        assert_eq!(schema["properties"]["name"]["minLength"], 1);
        assert_eq!(schema["properties"]["notes"]["anyOf"][1]["type"], "null");
    }

    #[test]
    fn repeatable_carries_bounds() {
        let tree: FieldNode = RepeatableNode::new(
            GroupNode::new().field("label", LeafConfig::text().required()),
        )
        .min_items(1)
        .max_items(3)
        .into();
        let schema = json_schema(&tree);
        assert_eq!(schema["type"], "array");
        assert_eq!(schema["minItems"], 1);
        assert_eq!(schema["maxItems"], 3);
        assert_eq!(schema["items"]["required"], json!(["label"]));
    }

    #[test]
    fn select_uses_option_values() {
        let leaf = LeafConfig::select(vec![SelectOption::new("GET"), SelectOption::new("POST")])
            .required();
        let schema = json_schema(&leaf.into());
        assert_eq!(schema["enum"], json!(["GET", "POST"]));
    }

    #[test]
    fn number_bounds() {
        let leaf = LeafConfig::new(Widget::Number {
            min: Some(0.0),
            max: Some(10.0),
        })
        .required();
        let schema = json_schema(&leaf.into());
        assert_eq!(schema["type"], "number");
        assert_eq!(schema["minimum"], 0.0);
        assert_eq!(schema["maximum"], 10.0);
    }

    #[test]
    fn hidden_accepts_anything() {
        assert_eq!(json_schema(&LeafConfig::hidden().into()), json!({}));
    }
}

//! Core field tree types.
//!
//! A form's shape is a tree of [`FieldNode`]s: leaves carry a widget and its
//! presentation metadata, groups map names to children, repeatables hold one
//! item template group. All types serialize to/from YAML via serde.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{FieldsError, Result};
use crate::path::{FieldPath, SEPARATOR};

/// A single option in a select or multi-select field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub order: i32,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
            order: 0,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Label if set, otherwise the raw value.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

/// The widget a leaf is edited with, including kind-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Widget {
    Text {
        #[serde(default)]
        multiline: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Boolean,
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    MultiSelect {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    /// Carried through the form but never shown.
    Hidden,
}

impl Widget {
    pub fn kind(&self) -> WidgetKind {
        match self {
            Widget::Text { .. } => WidgetKind::Text,
            Widget::Number { .. } => WidgetKind::Number,
            Widget::Boolean => WidgetKind::Boolean,
            Widget::Select { .. } => WidgetKind::Select,
            Widget::MultiSelect { .. } => WidgetKind::MultiSelect,
            Widget::Hidden => WidgetKind::Hidden,
        }
    }

    /// Options for select widgets, `None` for every other kind.
    pub fn options(&self) -> Option<&[SelectOption]> {
        match self {
            Widget::Select { options } | Widget::MultiSelect { options } => Some(options),
            _ => None,
        }
    }
}

/// The bare widget tag without settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    Text,
    Number,
    Boolean,
    Select,
    MultiSelect,
    Hidden,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Text => "text",
            WidgetKind::Number => "number",
            WidgetKind::Boolean => "boolean",
            WidgetKind::Select => "select",
            WidgetKind::MultiSelect => "multi-select",
            WidgetKind::Hidden => "hidden",
        }
    }
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a form runs its validator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationMode {
    /// Only when the user submits.
    #[default]
    OnSubmit,
    /// On every field change as well as on submit.
    OnChange,
}

/// Configuration of a terminal, directly editable field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeafConfig {
    pub widget: Widget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl LeafConfig {
    pub fn new(widget: Widget) -> Self {
        Self {
            widget,
            label: None,
            placeholder: None,
            tooltip: None,
            required: false,
            default: None,
        }
    }

    pub fn text() -> Self {
        Self::new(Widget::Text {
            multiline: false,
            max_length: None,
        })
    }

    pub fn textarea() -> Self {
        Self::new(Widget::Text {
            multiline: true,
            max_length: None,
        })
    }

    pub fn number() -> Self {
        Self::new(Widget::Number {
            min: None,
            max: None,
        })
    }

    pub fn boolean() -> Self {
        Self::new(Widget::Boolean)
    }

    pub fn select(options: Vec<SelectOption>) -> Self {
        Self::new(Widget::Select { options })
    }

    pub fn multi_select(options: Vec<SelectOption>) -> Self {
        Self::new(Widget::MultiSelect { options })
    }

    pub fn hidden() -> Self {
        Self::new(Widget::Hidden)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn kind(&self) -> WidgetKind {
        self.widget.kind()
    }
}

/// A nested object of named fields. Insertion order is the render order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "unique_fields")]
    pub fields: IndexMap<String, FieldNode>,
    /// Names passed to [`GroupNode::field`] more than once; reported by `check`.
    #[serde(skip)]
    duplicates: Vec<String>,
}

/// Deserialize a group's fields, failing on a repeated name instead of
/// letting the later entry replace the earlier one.
fn unique_fields<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, FieldNode>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FieldsVisitor;

    impl<'de> Visitor<'de> for FieldsVisitor {
        type Value = IndexMap<String, FieldNode>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of uniquely named fields")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut fields = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(name) = map.next_key::<String>()? {
                if fields.contains_key(&name) {
                    return Err(de::Error::custom(format!("duplicate field name: {name}")));
                }
                let node = map.next_value::<FieldNode>()?;
                fields.insert(name, node);
            }
            Ok(fields)
        }
    }

    deserializer.deserialize_map(FieldsVisitor)
}

impl GroupNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a child field. Registering a name twice keeps the first child and
    /// makes [`FieldNode::check`] fail with `DuplicateFieldName`.
    pub fn field(mut self, name: impl Into<String>, node: impl Into<FieldNode>) -> Self {
        let name = name.into();
        if self.fields.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.fields.insert(name, node.into());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldNode> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A variable-length list of groups that all share one item template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepeatableNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub item: GroupNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

impl RepeatableNode {
    pub fn new(item: GroupNode) -> Self {
        Self {
            label: None,
            item,
            min_items: None,
            max_items: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }
}

/// One node of a field tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldNode {
    Leaf(LeafConfig),
    Group(GroupNode),
    Repeatable(RepeatableNode),
}

impl From<LeafConfig> for FieldNode {
    fn from(leaf: LeafConfig) -> Self {
        FieldNode::Leaf(leaf)
    }
}

impl From<GroupNode> for FieldNode {
    fn from(group: GroupNode) -> Self {
        FieldNode::Group(group)
    }
}

impl From<RepeatableNode> for FieldNode {
    fn from(repeatable: RepeatableNode) -> Self {
        FieldNode::Repeatable(repeatable)
    }
}

impl FieldNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldNode::Leaf(_) => "leaf",
            FieldNode::Group(_) => "group",
            FieldNode::Repeatable(_) => "repeatable",
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafConfig> {
        match self {
            FieldNode::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            FieldNode::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_repeatable(&self) -> Option<&RepeatableNode> {
        match self {
            FieldNode::Repeatable(repeatable) => Some(repeatable),
            _ => None,
        }
    }

    /// Verify the tree can be addressed by paths.
    ///
    /// Rejects duplicate sibling names, names that are empty, contain the
    /// separator or are purely numeric, and repeatables whose bounds cross.
    pub fn check(&self) -> Result<()> {
        check_node(self, &FieldPath::root())
    }
}

fn check_node(node: &FieldNode, at: &FieldPath) -> Result<()> {
    match node {
        FieldNode::Leaf(_) => Ok(()),
        FieldNode::Group(group) => check_group(group, at),
        FieldNode::Repeatable(repeatable) => {
            if let (Some(min), Some(max)) = (repeatable.min_items, repeatable.max_items) {
                if min > max {
                    return Err(FieldsError::InvalidItemBounds {
                        path: at.to_string(),
                        min,
                        max,
                    });
                }
            }
            check_group(&repeatable.item, at)
        }
    }
}

fn check_group(group: &GroupNode, at: &FieldPath) -> Result<()> {
    if let Some(name) = group.duplicates.first() {
        return Err(FieldsError::DuplicateFieldName {
            name: at.child(name.as_str()).to_string(),
        });
    }
    for (name, child) in &group.fields {
        check_name(name)?;
        check_node(child, &at.child(name.as_str()))?;
    }
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FieldsError::invalid_name(name, "must not be empty"));
    }
    if name.contains(SEPARATOR) {
        return Err(FieldsError::invalid_name(
            name,
            format!("must not contain '{SEPARATOR}'"),
        ));
    }
    if name.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldsError::invalid_name(name, "must not be purely numeric"));
    }
    Ok(())
}

/// A named, persisted form: the tree plus the mode it validates in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub mode: ValidationMode,
    pub tree: FieldNode,
}

impl FormDefinition {
    pub fn new(name: impl Into<String>, tree: impl Into<FieldNode>) -> Self {
        Self {
            name: name.into(),
            description: None,
            mode: ValidationMode::default(),
            tree: tree.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }
}

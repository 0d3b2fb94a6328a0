//! Field paths and the path tree derived from a field tree.
//!
//! A [`FieldPath`] is the structural address of one field (`tags`, `0`,
//! `label`); its flattened form (`tags.0.label`) is the key the rendering
//! layer binds values and errors to. [`resolve_paths`] walks a [`FieldNode`]
//! and produces a [`PathTree`] of the same shape holding those keys.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{FieldNode, GroupNode};

/// Separator between segments in a flattened path.
pub const SEPARATOR: char = '.';

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Name(String),
    /// Position inside a repeatable.
    Index(usize),
}

impl Segment {
    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Segment::Name(name) => Some(name),
            Segment::Index(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => f.write_str(name),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// True when a flattened segment addresses a list element: a canonical
/// decimal, so `0` and `12` but not `007`.
pub fn is_index_segment(segment: &str) -> bool {
    match segment.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    }
}

fn segment_from(raw: String) -> Segment {
    match raw.parse::<usize>() {
        Ok(index) if is_index_segment(&raw) => Segment::Index(index),
        _ => Segment::Name(raw),
    }
}

/// Join two flattened paths, treating the empty string as the root.
pub fn join(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}{SEPARATOR}{rest}"),
    }
}

/// Structural address of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a flattened path. Canonical decimal segments become indexes.
    ///
    /// The empty string is the root. Empty segments (`name.`, `a..b`) are
    /// kept as empty names so the path prints back exactly as given.
    pub fn parse(flat: &str) -> Self {
        if flat.is_empty() {
            return Self::root();
        }
        let segments = flat
            .split(SEPARATOR)
            .map(|s| segment_from(s.to_string()))
            .collect();
        Self { segments }
    }

    /// Convert a JSON pointer (`/tags/0/label`) into a field path.
    pub fn from_pointer(pointer: &str) -> Self {
        let segments = pointer
            .split('/')
            .skip(1)
            .map(|raw| segment_from(raw.replace("~1", "/").replace("~0", "~")))
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Name(name.into()));
        next
    }

    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Index(index));
        next
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn join(&self, other: &FieldPath) -> Self {
        let mut next = self.clone();
        next.segments.extend(other.segments.iter().cloned());
        next
    }

    /// The named segments only; these are what select a node in the tree.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::as_name)
    }

    pub fn flatten(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// The path identifiers of a field tree, shaped like the tree itself.
///
/// Repeatable item templates hold paths relative to one item; use
/// [`PathTree::item`] to get the template re-rooted at a concrete index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathTree {
    Leaf(String),
    Group(IndexMap<String, PathTree>),
    Repeatable {
        list_path: String,
        item: Box<PathTree>,
    },
}

/// Resolve every field of `tree` to its path, starting at the root.
pub fn resolve_paths(tree: &FieldNode) -> PathTree {
    resolve_paths_at(tree, &FieldPath::root())
}

/// Resolve every field of `tree` to its path below `prefix`.
pub fn resolve_paths_at(tree: &FieldNode, prefix: &FieldPath) -> PathTree {
    match tree {
        FieldNode::Leaf(_) => PathTree::Leaf(prefix.to_string()),
        FieldNode::Group(group) => resolve_group(group, prefix),
        FieldNode::Repeatable(repeatable) => PathTree::Repeatable {
            list_path: prefix.to_string(),
            item: Box::new(resolve_group(&repeatable.item, &FieldPath::root())),
        },
    }
}

fn resolve_group(group: &GroupNode, prefix: &FieldPath) -> PathTree {
    PathTree::Group(
        group
            .fields
            .iter()
            .map(|(name, child)| {
                let path = prefix.child(name.as_str());
                (name.clone(), resolve_paths_at(child, &path))
            })
            .collect(),
    )
}

impl PathTree {
    /// The flattened path of a leaf.
    pub fn path(&self) -> Option<&str> {
        match self {
            PathTree::Leaf(path) => Some(path),
            _ => None,
        }
    }

    /// Child of a group by name.
    pub fn get(&self, name: &str) -> Option<&PathTree> {
        match self {
            PathTree::Group(children) => children.get(name),
            _ => None,
        }
    }

    pub fn list_path(&self) -> Option<&str> {
        match self {
            PathTree::Repeatable { list_path, .. } => Some(list_path),
            _ => None,
        }
    }

    /// The unindexed item template of a repeatable.
    pub fn item_template(&self) -> Option<&PathTree> {
        match self {
            PathTree::Repeatable { item, .. } => Some(item),
            _ => None,
        }
    }

    /// The item template re-rooted at `list_path.index`.
    pub fn item(&self, index: usize) -> Option<PathTree> {
        match self {
            PathTree::Repeatable { list_path, item } => {
                Some(item.reroot(&join(list_path, &index.to_string())))
            }
            _ => None,
        }
    }

    /// Prefix every path in this tree with `prefix`.
    ///
    /// Nested item templates stay relative to their own item.
    pub fn reroot(&self, prefix: &str) -> PathTree {
        match self {
            PathTree::Leaf(path) => PathTree::Leaf(join(prefix, path)),
            PathTree::Group(children) => PathTree::Group(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.reroot(prefix)))
                    .collect(),
            ),
            PathTree::Repeatable { list_path, item } => PathTree::Repeatable {
                list_path: join(prefix, list_path),
                item: item.clone(),
            },
        }
    }

    /// Follow `path` down this tree. Index segments select a concrete item
    /// of a repeatable; a named segment on a repeatable finds nothing.
    pub fn find(&self, path: &FieldPath) -> Option<PathTree> {
        let mut current = self.clone();
        for segment in path.segments() {
            current = match (segment, &current) {
                (Segment::Name(name), PathTree::Group(_)) => current.get(name)?.clone(),
                (Segment::Index(index), PathTree::Repeatable { .. }) => current.item(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Every leaf path with repeatable items left unindexed (`tags.label`).
    ///
    /// These are the schema-level paths; [`crate::lookup`] accepts them as well
    /// as their indexed forms.
    pub fn template_leaf_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_template(self, &mut out);
        out
    }

    /// Every concrete leaf path for `value`, indexing repeatables by the
    /// items actually present (`tags.0.label`, `tags.1.label`).
    pub fn concrete_leaf_paths(&self, value: &Value) -> Vec<String> {
        let mut out = Vec::new();
        collect_concrete(self, value, &mut out);
        out
    }
}

fn collect_template(tree: &PathTree, out: &mut Vec<String>) {
    match tree {
        PathTree::Leaf(path) => out.push(path.clone()),
        PathTree::Group(children) => {
            for child in children.values() {
                collect_template(child, out);
            }
        }
        PathTree::Repeatable { list_path, item } => {
            collect_template(&item.reroot(list_path), out);
        }
    }
}

fn collect_concrete(tree: &PathTree, value: &Value, out: &mut Vec<String>) {
    match tree {
        PathTree::Leaf(path) => out.push(path.clone()),
        PathTree::Group(children) => {
            for (name, child) in children {
                collect_concrete(child, value.get(name).unwrap_or(&Value::Null), out);
            }
        }
        PathTree::Repeatable { .. } => {
            let count = value.as_array().map_or(0, Vec::len);
            for index in 0..count {
                if let Some(item) = tree.item(index) {
                    collect_concrete(&item, &value[index], out);
                }
            }
        }
    }
}

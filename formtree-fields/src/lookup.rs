//! Resolve a flattened path back to the leaf configuration it addresses.
//!
//! Numeric segments are skipped: every item of a repeatable shares one item
//! template, so `requests.0.endpoint`, `requests.7.endpoint` and the
//! unindexed `requests.endpoint` all land on the same leaf.

use tracing::trace;

use crate::error::{FieldsError, Result};
use crate::path::{is_index_segment, SEPARATOR};
use crate::types::{FieldNode, LeafConfig, SelectOption, Widget};

/// Named segments of `path`, in order. The empty path is the root; an empty
/// segment anywhere else is an error.
fn named_segments(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for segment in path.split(SEPARATOR) {
        if segment.is_empty() {
            return Err(FieldsError::FieldNotFound {
                path: path.to_string(),
                segment: String::new(),
            });
        }
        if !is_index_segment(segment) {
            names.push(segment);
        }
    }
    Ok(names)
}

fn child<'a>(node: &'a FieldNode, name: &str) -> Option<&'a FieldNode> {
    match node {
        FieldNode::Group(group) => group.fields.get(name),
        FieldNode::Repeatable(repeatable) => repeatable.item.fields.get(name),
        FieldNode::Leaf(_) => None,
    }
}

fn child_mut<'a>(node: &'a mut FieldNode, name: &str) -> Option<&'a mut FieldNode> {
    match node {
        FieldNode::Group(group) => group.fields.get_mut(name),
        FieldNode::Repeatable(repeatable) => repeatable.item.fields.get_mut(name),
        FieldNode::Leaf(_) => None,
    }
}

/// The node addressed by `path`, which may be a group or repeatable.
pub fn node_at<'a>(path: &str, tree: &'a FieldNode) -> Result<&'a FieldNode> {
    let mut scope = tree;
    for segment in named_segments(path)? {
        scope = child(scope, segment).ok_or_else(|| FieldsError::FieldNotFound {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;
    }
    Ok(scope)
}

/// The leaf configuration addressed by `path`.
pub fn lookup<'a>(path: &str, tree: &'a FieldNode) -> Result<&'a LeafConfig> {
    match node_at(path, tree)? {
        FieldNode::Leaf(leaf) => {
            trace!(path, kind = %leaf.kind(), "resolved leaf");
            Ok(leaf)
        }
        _ => Err(FieldsError::InvalidLeafReference {
            path: path.to_string(),
        }),
    }
}

/// Mutable form of [`lookup`].
pub fn lookup_mut<'a>(path: &str, tree: &'a mut FieldNode) -> Result<&'a mut LeafConfig> {
    let mut scope = tree;
    for segment in named_segments(path)? {
        scope = child_mut(scope, segment).ok_or_else(|| FieldsError::FieldNotFound {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;
    }
    match scope {
        FieldNode::Leaf(leaf) => Ok(leaf),
        _ => Err(FieldsError::InvalidLeafReference {
            path: path.to_string(),
        }),
    }
}

impl FieldNode {
    /// See [`lookup`].
    pub fn lookup(&self, path: &str) -> Result<&LeafConfig> {
        lookup(path, self)
    }

    /// See [`lookup_mut`].
    pub fn lookup_mut(&mut self, path: &str) -> Result<&mut LeafConfig> {
        lookup_mut(path, self)
    }

    /// See [`node_at`].
    pub fn node_at(&self, path: &str) -> Result<&FieldNode> {
        node_at(path, self)
    }

    /// Replace the options of a select or multi-select leaf, for option lists
    /// that are only known when the form is shown.
    pub fn set_options(&mut self, path: &str, options: Vec<SelectOption>) -> Result<()> {
        let leaf = self.lookup_mut(path)?;
        match &mut leaf.widget {
            Widget::Select { options: current } | Widget::MultiSelect { options: current } => {
                *current = options;
                Ok(())
            }
            _ => Err(FieldsError::NotSelectable {
                path: path.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroupNode, RepeatableNode, WidgetKind};
    use rstest::rstest;

    fn requests_tree() -> FieldNode {
        GroupNode::new()
            .field("name", LeafConfig::text().label("Name"))
            .field(
                "requests",
                RepeatableNode::new(
                    GroupNode::new()
                        .field("endpoint", LeafConfig::text().label("Endpoint"))
                        .field("requestType", LeafConfig::select(vec![]))
                        .field(
                            "headers",
                            RepeatableNode::new(
                                GroupNode::new()
                                    .field("key", LeafConfig::text())
                                    .field("value", LeafConfig::text()),
                            ),
                        ),
                ),
            )
            .field(
                "settings",
                GroupNode::new().field("retries", LeafConfig::number()),
            )
            .into()
    }

    #[rstest]
    #[case("name", WidgetKind::Text)]
    #[case("requests.0.endpoint", WidgetKind::Text)]
    #[case("requests.3.requestType", WidgetKind::Select)]
    #[case("requests.1.headers.4.value", WidgetKind::Text)]
    #[case("requests.headers.key", WidgetKind::Text)]
    #[case("settings.retries", WidgetKind::Number)]
    fn lookup_finds_leaf(#[case] path: &str, #[case] kind: WidgetKind) {
        let tree = requests_tree();
        assert_eq!(tree.lookup(path).unwrap().kind(), kind);
    }

    #[test]
    fn index_value_does_not_matter() {
        let tree = requests_tree();
        let first = lookup("requests.0.endpoint", &tree).unwrap();
        let seventh = lookup("requests.7.endpoint", &tree).unwrap();
        assert!(std::ptr::eq(first, seventh));
        assert_eq!(first.label.as_deref(), Some("Endpoint"));
    }

    #[test]
    fn missing_segment_is_field_not_found() {
        let tree = requests_tree();
        let err = lookup("requests.0.method", &tree).unwrap_err();
        assert!(matches!(
            err,
            FieldsError::FieldNotFound { ref segment, ref path }
                if segment == "method" && path == "requests.0.method"
        ));
    }

    #[test]
    fn descending_past_a_leaf_is_field_not_found() {
        let tree = requests_tree();
        let err = lookup("name.first", &tree).unwrap_err();
        assert!(matches!(err, FieldsError::FieldNotFound { ref segment, .. } if segment == "first"));
    }

    #[rstest]
    #[case("requests")]
    #[case("requests.2")]
    #[case("settings")]
    #[case("")]
    fn non_leaf_target_is_invalid_reference(#[case] path: &str) {
        let tree = requests_tree();
        assert!(matches!(
            lookup(path, &tree),
            Err(FieldsError::InvalidLeafReference { .. })
        ));
    }

    #[rstest]
    #[case("name.")]
    #[case(".name")]
    #[case("requests..endpoint")]
    #[case("requests.007.endpoint")]
    fn malformed_segments_are_field_not_found(#[case] path: &str) {
        let tree = requests_tree();
        assert!(matches!(
            lookup(path, &tree),
            Err(FieldsError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn node_at_returns_containers() {
        let tree = requests_tree();
        assert!(tree.node_at("requests").unwrap().as_repeatable().is_some());
        assert!(tree.node_at("settings").unwrap().as_group().is_some());
    }

    #[test]
    fn set_options_injects_into_item_template() {
        let mut tree = requests_tree();
        tree.set_options(
            "requests.0.requestType",
            vec![SelectOption::new("GET"), SelectOption::new("POST")],
        )
        .unwrap();
        let options = tree
            .lookup("requests.5.requestType")
            .unwrap()
            .widget
            .options()
            .unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].value, "POST");
    }

    #[test]
    fn set_options_rejects_non_select() {
        let mut tree = requests_tree();
        let err = tree.set_options("name", vec![]).unwrap_err();
        assert!(matches!(err, FieldsError::NotSelectable { .. }));
    }
}

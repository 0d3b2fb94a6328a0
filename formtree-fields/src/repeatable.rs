//! Editable ordered list behind a repeatable section.
//!
//! The controller owns the items' values and a key per item. Keys follow
//! their item through `move_item` and `remove`, so per-row UI state can be
//! keyed on them; paths are always index-based and are re-derived from the
//! item template for the row's current position.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use ulid::Ulid;

use crate::error::{FieldsError, Result};
use crate::path::{join, FieldPath, PathTree};

/// Identity of one item in a repeatable list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(Ulid);

impl ItemKey {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ItemKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One visible row of a repeatable section.
#[derive(Debug, Clone)]
pub struct Row<'a> {
    pub index: usize,
    pub key: ItemKey,
    /// Item template re-rooted at `list_path.index`.
    pub paths: PathTree,
    pub value: &'a Value,
}

/// Presents a repeatable node as an ordered list of items.
#[derive(Debug, Clone)]
pub struct RepeatableController {
    list_path: String,
    template: PathTree,
    keys: Vec<ItemKey>,
    values: Vec<Value>,
}

impl RepeatableController {
    /// Controller for the repeatable at path `at` within the form's `paths`.
    pub fn new(paths: &PathTree, at: &str, items: Vec<Value>) -> Result<Self> {
        let found = paths.find(&FieldPath::parse(at));
        let Some(PathTree::Repeatable { list_path, item }) = found else {
            return Err(FieldsError::NotRepeatable {
                path: at.to_string(),
            });
        };
        let keys = items.iter().map(|_| ItemKey::new()).collect();
        Ok(Self {
            list_path,
            template: *item,
            keys,
            values: items,
        })
    }

    pub fn list_path(&self) -> &str {
        &self.list_path
    }

    pub fn keys(&self) -> &[ItemKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn value_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.values.get_mut(index)
    }

    pub fn index_of(&self, key: ItemKey) -> Option<usize> {
        self.keys.iter().position(|k| *k == key)
    }

    /// Current items as the array the value shape expects.
    pub fn values(&self) -> Value {
        Value::Array(self.values.clone())
    }

    /// Add an item at the end.
    pub fn append(&mut self, item: Value) -> &[ItemKey] {
        let key = ItemKey::new();
        self.keys.push(key);
        self.values.push(item);
        debug!(list = %self.list_path, %key, len = self.keys.len(), "appended item");
        &self.keys
    }

    /// Remove the item at `index`; later items shift down one position.
    pub fn remove(&mut self, index: usize) -> Result<&[ItemKey]> {
        self.check_index(index)?;
        let key = self.keys.remove(index);
        self.values.remove(index);
        debug!(list = %self.list_path, %key, index, "removed item");
        Ok(&self.keys)
    }

    /// Move the item at `from` so that it ends up at `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<&[ItemKey]> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let key = self.keys.remove(from);
            let value = self.values.remove(from);
            self.keys.insert(to, key);
            self.values.insert(to, value);
            debug!(list = %self.list_path, %key, from, to, "moved item");
        }
        Ok(&self.keys)
    }

    /// Item template re-rooted at the item's current index.
    pub fn item_paths(&self, index: usize) -> Result<PathTree> {
        self.check_index(index)?;
        Ok(self.template.reroot(&join(&self.list_path, &index.to_string())))
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.keys
            .iter()
            .zip(&self.values)
            .enumerate()
            .map(|(index, (key, value))| Row {
                index,
                key: *key,
                paths: self
                    .template
                    .reroot(&join(&self.list_path, &index.to_string())),
                value,
            })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.keys.len() {
            Ok(())
        } else {
            Err(FieldsError::IndexOutOfRange {
                index,
                len: self.keys.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::resolve_paths;
    use crate::types::{FieldNode, GroupNode, LeafConfig, RepeatableNode};
    use serde_json::json;

    fn requests_paths() -> PathTree {
        let tree: FieldNode = GroupNode::new()
            .field(
                "requests",
                RepeatableNode::new(
                    GroupNode::new()
                        .field("endpoint", LeafConfig::text())
                        .field("requestType", LeafConfig::select(vec![])),
                ),
            )
            .field("title", LeafConfig::text())
            .into();
        resolve_paths(&tree)
    }

    fn request(endpoint: &str) -> Value {
        json!({"endpoint": endpoint, "requestType": "GET"})
    }

    fn three_requests() -> RepeatableController {
        RepeatableController::new(
            &requests_paths(),
            "requests",
            vec![request("/a"), request("/b"), request("/c")],
        )
        .unwrap()
    }

    #[test]
    fn append_then_remove_preserves_order() {
        let mut list = three_requests();
        let before: Vec<ItemKey> = list.keys().to_vec();

        let after_append = list.append(request("/d")).to_vec();
        assert_eq!(after_append.len(), 4);
        assert_eq!(&after_append[..3], before.as_slice());

        let after_remove = list.remove(1).unwrap().to_vec();
        assert_eq!(after_remove.len(), 3);
        assert_eq!(after_remove, vec![before[0], before[2], after_append[3]]);
        assert_eq!(
            list.values(),
            json!([request("/a"), request("/c"), request("/d")])
        );
    }

    #[test]
    fn move_keeps_identity_with_item() {
        let mut list = three_requests();
        let moved = list.keys()[0];
        list.move_item(0, 2).unwrap();
        assert_eq!(list.index_of(moved), Some(2));
        assert_eq!(list.value(2), Some(&request("/a")));
        assert_eq!(list.value(0), Some(&request("/b")));
    }

    #[test]
    fn move_to_same_index_is_noop() {
        let mut list = three_requests();
        let before = list.keys().to_vec();
        assert_eq!(list.move_item(1, 1).unwrap(), before.as_slice());
    }

    #[test]
    fn item_paths_follow_current_index() {
        let mut list = three_requests();
        let key = list.keys()[2];
        assert_eq!(
            list.item_paths(2).unwrap().get("endpoint").and_then(PathTree::path),
            Some("requests.2.endpoint")
        );
        list.remove(0).unwrap();
        let index = list.index_of(key).unwrap();
        assert_eq!(index, 1);
        assert_eq!(
            list.item_paths(index).unwrap().get("endpoint").and_then(PathTree::path),
            Some("requests.1.endpoint")
        );
    }

    #[test]
    fn rows_expose_concrete_paths() {
        let list = three_requests();
        let rows: Vec<Row<'_>> = list.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1].paths.get("requestType").and_then(PathTree::path),
            Some("requests.1.requestType")
        );
        assert_eq!(rows[1].value["endpoint"], "/b");
        assert_eq!(rows[1].key, list.keys()[1]);
    }

    #[test]
    fn out_of_range_is_reported() {
        let mut list = three_requests();
        assert!(matches!(
            list.remove(3),
            Err(FieldsError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            list.move_item(0, 9),
            Err(FieldsError::IndexOutOfRange { index: 9, len: 3 })
        ));
        assert!(list.item_paths(7).is_err());
    }

    #[test]
    fn non_repeatable_path_is_rejected() {
        let err = RepeatableController::new(&requests_paths(), "title", vec![]).unwrap_err();
        assert!(matches!(err, FieldsError::NotRepeatable { ref path } if path == "title"));
    }

    #[test]
    fn empty_list_starts_empty() {
        let mut list = RepeatableController::new(&requests_paths(), "requests", vec![]).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.list_path(), "requests");
        list.append(request("/x"));
        assert_eq!(list.len(), 1);
        *list.value_mut(0).unwrap() = request("/y");
        assert_eq!(list.values(), json!([request("/y")]));
    }
}

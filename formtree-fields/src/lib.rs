//! Field trees and the paths that address them
//!
//! `formtree-fields` describes a form's shape as a tree of [`FieldNode`]s and
//! derives everything the rendering layer needs to address it. It knows
//! nothing about projects, tasks or any particular form; consumers author
//! their own trees in code or as YAML.
//!
//! # Architecture
//!
//! - **One tree, three views**: paths ([`resolve_paths`]), render-time lookup
//!   ([`lookup`]) and the validation schema ([`json_schema`]) are all derived
//!   from the same [`FieldNode`], so they cannot drift apart
//! - **Index-blind lookup**: numeric path segments are skipped, every item of
//!   a repeatable shares one template
//! - **Values are JSON**: groups are objects, repeatables arrays, leaves
//!   primitives ([`default_value`], [`conform`])
//! - **YAML on disk**: [`FormDefinitions`] keeps one `.yaml` file per form

pub mod context;
pub mod defaults;
pub mod error;
pub mod lookup;
pub mod path;
pub mod repeatable;
pub mod schema;
pub mod types;

pub use context::{FormDefinitions, FormDefinitionsBuilder};
pub use defaults::{conform, default_value, item_default};
pub use error::{FieldsError, Result};
pub use lookup::{lookup, lookup_mut, node_at};
pub use path::{resolve_paths, resolve_paths_at, FieldPath, PathTree, Segment, SEPARATOR};
pub use repeatable::{ItemKey, RepeatableController, Row};
pub use schema::json_schema;
pub use types::{
    FieldNode, FormDefinition, GroupNode, LeafConfig, RepeatableNode, SelectOption,
    ValidationMode, Widget, WidgetKind,
};

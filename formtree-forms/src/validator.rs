//! Validators turn a whole form value into per-path messages.

use std::sync::Arc;

use formtree_fields::{json_schema, FieldNode, FieldPath};
use indexmap::IndexMap;
use jsonschema::error::ValidationErrorKind;
use serde_json::Value;
use tracing::trace;

use crate::error::{FormError, Result};

/// Flattened field path → message. An empty key is a form-level error.
pub type FieldErrors = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(FieldErrors),
}

impl ValidationOutcome {
    /// `Valid` when `errors` is empty.
    pub fn from_errors(errors: FieldErrors) -> Self {
        if errors.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Valid => None,
            Self::Invalid(errors) => Some(errors),
        }
    }

    /// Message for one flattened path, if any.
    pub fn error_at(&self, path: &str) -> Option<&str> {
        self.errors()?.get(path).map(String::as_str)
    }
}

/// Pure check of a complete form value.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Value) -> ValidationOutcome;
}

impl<F> Validator for F
where
    F: Fn(&Value) -> ValidationOutcome + Send + Sync,
{
    fn validate(&self, value: &Value) -> ValidationOutcome {
        self(value)
    }
}

/// Validates against the JSON Schema derived from a field tree.
pub struct SchemaValidator {
    schema: Value,
    compiled: jsonschema::Validator,
}

impl SchemaValidator {
    pub fn from_tree(tree: &FieldNode) -> Result<Self> {
        Self::from_schema(json_schema(tree))
    }

    pub fn from_schema(schema: Value) -> Result<Self> {
        let compiled = jsonschema::validator_for(&schema).map_err(|e| FormError::Schema {
            message: e.to_string(),
        })?;
        Ok(Self { schema, compiled })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, value: &Value) -> ValidationOutcome {
        let mut errors = FieldErrors::new();
        for error in self.compiled.iter_errors(value) {
            let mut path = FieldPath::from_pointer(&error.instance_path.to_string());
            // reported on the parent object; attribute it to the missing child
            if let ValidationErrorKind::Required { property } = &error.kind {
                if let Some(name) = property.as_str() {
                    path = path.child(name);
                }
            }
            let path = path.flatten();
            trace!(%path, %error, "schema violation");
            errors.entry(path).or_insert_with(|| error.to_string());
        }
        ValidationOutcome::from_errors(errors)
    }
}

/// Runs validators in order and merges their errors.
///
/// The first message reported for a path wins.
#[derive(Clone, Default)]
pub struct ValidatorChain {
    validators: Vec<Arc<dyn Validator>>,
}

impl ValidatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn with_shared(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Validator for ValidatorChain {
    fn validate(&self, value: &Value) -> ValidationOutcome {
        let mut merged = FieldErrors::new();
        for validator in &self.validators {
            if let ValidationOutcome::Invalid(errors) = validator.validate(value) {
                for (path, message) in errors {
                    merged.entry(path).or_insert(message);
                }
            }
        }
        ValidationOutcome::from_errors(merged)
    }
}

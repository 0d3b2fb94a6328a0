//! Error types for field trees and form definitions

use thiserror::Error;

/// Result type for field tree operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur while building, addressing or persisting a field tree
#[derive(Debug, Error)]
pub enum FieldsError {
    /// A named path segment does not exist in the scope being walked
    #[error("field not found: '{segment}' in path '{path}'")]
    FieldNotFound { path: String, segment: String },

    /// The path ends on a group or repeatable instead of a leaf
    #[error("path '{path}' does not address a leaf field")]
    InvalidLeafReference { path: String },

    /// Two siblings were registered under the same name
    #[error("duplicate field name: {name}")]
    DuplicateFieldName { name: String },

    /// A field name cannot be used as a path segment
    #[error("invalid field name '{name}': {reason}")]
    InvalidFieldName { name: String, reason: String },

    /// A repeatable declares min_items greater than max_items
    #[error("repeatable '{path}' has min_items {min} greater than max_items {max}")]
    InvalidItemBounds { path: String, min: usize, max: usize },

    /// A leaf was asked to take options but is not a select
    #[error("leaf '{path}' does not accept options")]
    NotSelectable { path: String },

    /// The path addresses something other than a repeatable
    #[error("path '{path}' does not address a repeatable")]
    NotRepeatable { path: String },

    /// Repeatable item index out of range
    #[error("item index {index} out of range for list of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Form definition not found by name
    #[error("form definition not found: {name}")]
    DefinitionNotFound { name: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FieldsError {
    pub(crate) fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFieldName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that can only come from a tree/path mismatch in code.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Self::FieldNotFound { .. }
                | Self::InvalidLeafReference { .. }
                | Self::DuplicateFieldName { .. }
                | Self::InvalidFieldName { .. }
                | Self::InvalidItemBounds { .. }
                | Self::NotSelectable { .. }
                | Self::NotRepeatable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::FieldNotFound {
            path: "tags.0.colour".into(),
            segment: "colour".into(),
        };
        assert_eq!(
            err.to_string(),
            "field not found: 'colour' in path 'tags.0.colour'"
        );
    }

    #[test]
    fn test_invalid_leaf_reference() {
        let err = FieldsError::InvalidLeafReference {
            path: "tags".into(),
        };
        assert!(err.to_string().contains("tags"));
        assert!(err.is_programmer_error());
    }

    #[test]
    fn test_io_is_not_programmer_error() {
        let err = FieldsError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!err.is_programmer_error());
    }
}

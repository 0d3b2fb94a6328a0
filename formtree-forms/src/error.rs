//! Error types for form configuration

use formtree_fields::FieldsError;
use thiserror::Error;

/// Result type for form configuration
pub type Result<T> = std::result::Result<T, FormError>;

/// Errors raised while building or addressing a form.
///
/// Submission failures are not errors here; they settle the pipeline.
#[derive(Debug, Error)]
pub enum FormError {
    /// Malformed tree or a path that does not match it
    #[error(transparent)]
    Fields(#[from] FieldsError),

    /// The derived or supplied JSON Schema does not compile
    #[error("invalid validation schema: {message}")]
    Schema { message: String },

    /// `build()` was called without a submit handler
    #[error("form has no submit handler")]
    MissingSubmitHandler,

    /// A stored form was requested but `definitions.dir` is unset
    #[error("no form definitions directory configured (set definitions.dir)")]
    DefinitionsNotConfigured,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_error_is_transparent() {
        let err: FormError = FieldsError::InvalidLeafReference {
            path: "tags".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "path 'tags' does not address a leaf field");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            FormError::MissingSubmitHandler.to_string(),
            "form has no submit handler"
        );
        let err = FormError::Schema {
            message: "bad keyword".to_string(),
        };
        assert_eq!(err.to_string(), "invalid validation schema: bad keyword");
        assert_eq!(
            FormError::DefinitionsNotConfigured.to_string(),
            "no form definitions directory configured (set definitions.dir)"
        );
    }
}

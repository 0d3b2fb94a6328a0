//! Error types for formtree configuration

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration parsing failed
    #[error("Failed to parse configuration: {source}")]
    ParseError { source: Box<figment::Error> },

    /// Invalid configuration value
    #[error("Invalid configuration value for key '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration file format not supported
    #[error("Unsupported configuration file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Current directory could not be determined
    #[error("Unable to determine current directory")]
    CurrentDirectoryNotFound,
}

impl ConfigError {
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::ParseError {
            source: Box::new(error),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        let error = ConfigError::invalid_value("actions.submit_label", "must not be empty");
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for key 'actions.submit_label': must not be empty"
        );
    }

    #[test]
    fn test_unsupported_format_display() {
        let error = ConfigError::UnsupportedFormat {
            path: PathBuf::from("formtree.ini"),
        };
        assert!(error.to_string().contains("formtree.ini"));
    }

    #[test]
    fn test_from_figment_error() {
        let error: ConfigError = figment::Error::from("boom".to_string()).into();
        assert!(matches!(error, ConfigError::ParseError { .. }));
        assert!(error.to_string().contains("boom"));
    }
}

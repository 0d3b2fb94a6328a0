//! Typed configuration sections

use formtree_fields::ValidationMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};

/// Top-level formtree configuration.
///
/// Every section has defaults, so an empty configuration is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormtreeConfig {
    pub validation: ValidationConfig,
    pub definitions: DefinitionsConfig,
    pub actions: ActionsConfig,
}

impl FormtreeConfig {
    /// Reject values that deserialize fine but cannot be used.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.actions.submit_label.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "actions.submit_label",
                "must not be empty",
            ));
        }
        if self.actions.pending_label.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "actions.pending_label",
                "must not be empty",
            ));
        }
        if let Some(dir) = &self.definitions.dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::invalid_value(
                    "definitions.dir",
                    "must not be an empty path",
                ));
            }
        }
        Ok(())
    }
}

/// When forms validate unless a form definition says otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub mode: ValidationMode,
}

/// Where hand-authored form definitions live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionsConfig {
    pub dir: Option<PathBuf>,
}

/// Labels for the submit/cancel controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    pub submit_label: String,
    /// Shown on the submit control while a submission is pending.
    pub pending_label: String,
    /// No cancel control is rendered when unset.
    pub cancel_label: Option<String>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            submit_label: "Submit".to_string(),
            pending_label: "Submitting...".to_string(),
            cancel_label: None,
        }
    }
}

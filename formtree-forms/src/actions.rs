//! Submit/cancel controls as a function of the pending signal.

use formtree_config::ActionsConfig;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub label: String,
    pub disabled: bool,
}

/// Everything a host needs to draw a form's controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionBar {
    pub submit: ActionButton,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel: Option<ActionButton>,
}

/// Renders the form's controls for the current pending state.
pub trait ActionRenderer: Send + Sync {
    fn render(&self, pending: bool) -> ActionBar;
}

impl<F> ActionRenderer for F
where
    F: Fn(bool) -> ActionBar + Send + Sync,
{
    fn render(&self, pending: bool) -> ActionBar {
        self(pending)
    }
}

/// Relabels and disables submit while pending; cancel stays usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultActions {
    pub submit_label: String,
    pub pending_label: String,
    pub cancel_label: Option<String>,
}

impl DefaultActions {
    pub fn from_config(config: &ActionsConfig) -> Self {
        Self {
            submit_label: config.submit_label.clone(),
            pending_label: config.pending_label.clone(),
            cancel_label: config.cancel_label.clone(),
        }
    }

    pub fn with_submit_label(mut self, label: impl Into<String>) -> Self {
        self.submit_label = label.into();
        self
    }

    pub fn with_cancel(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = Some(label.into());
        self
    }
}

impl Default for DefaultActions {
    fn default() -> Self {
        Self::from_config(&ActionsConfig::default())
    }
}

impl ActionRenderer for DefaultActions {
    fn render(&self, pending: bool) -> ActionBar {
        let label = if pending {
            &self.pending_label
        } else {
            &self.submit_label
        };
        ActionBar {
            submit: ActionButton {
                label: label.clone(),
                disabled: pending,
            },
            cancel: self.cancel_label.as_ref().map(|label| ActionButton {
                label: label.clone(),
                disabled: false,
            }),
        }
    }
}

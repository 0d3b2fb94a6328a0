//! The effectful side of a form: what happens when a valid value is submitted.

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of the previous submission, handed to the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionState {
    pub fn success(message: Option<String>) -> Self {
        Self {
            error: None,
            message,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            message: None,
        }
    }
}

/// What a submit handler reports when it completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SubmitOutcome {
    Submitted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// The external system answered with an error payload.
    Failed { error: String },
    /// Leave this view. Not an error.
    Redirect { location: String },
}

impl SubmitOutcome {
    pub fn submitted() -> Self {
        Self::Submitted { message: None }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self::Submitted {
            message: Some(message.into()),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
        }
    }
}

/// Sends a validated value to the outside world.
///
/// Returning `Err` is a rejection: its message becomes the form's top-level
/// error, exactly like [`SubmitOutcome::Failed`].
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, previous: &ActionState, value: Value) -> anyhow::Result<SubmitOutcome>;
}

/// Adapts an async closure into a [`SubmitHandler`].
pub struct SubmitFn<F>(F);

/// ```rust,ignore
/// let handler = submit_fn(|_previous, value| async move {
///     projects.create(value).await?;
///     Ok(SubmitOutcome::redirect("/projects"))
/// });
/// ```
pub fn submit_fn<F, Fut>(f: F) -> SubmitFn<F>
where
    F: Fn(ActionState, Value) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<SubmitOutcome>> + Send,
{
    SubmitFn(f)
}

#[async_trait]
impl<F, Fut> SubmitHandler for SubmitFn<F>
where
    F: Fn(ActionState, Value) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<SubmitOutcome>> + Send,
{
    async fn submit(&self, previous: &ActionState, value: Value) -> anyhow::Result<SubmitOutcome> {
        (self.0)(previous.clone(), value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_submit_fn_receives_previous_and_value() {
        let handler = submit_fn(|previous: ActionState, value: Value| async move {
            let outcome = match previous.error {
                Some(error) => SubmitOutcome::with_message(format!("retried after {error}")),
                None => SubmitOutcome::failed(format!("rejected {}", value["name"])),
            };
            anyhow::Ok(outcome)
        });

        let first = handler
            .submit(&ActionState::default(), json!({"name": "a"}))
            .await
            .unwrap();
        assert_eq!(first, SubmitOutcome::failed("rejected \"a\""));

        let second = handler
            .submit(&ActionState::failure("boom"), json!({}))
            .await
            .unwrap();
        assert_eq!(second, SubmitOutcome::with_message("retried after boom"));
    }

    #[tokio::test]
    async fn test_submit_fn_propagates_rejection() {
        let handler = submit_fn(|_: ActionState, _: Value| async {
            Err::<SubmitOutcome, _>(anyhow::anyhow!("offline"))
        });
        let err = handler.submit(&ActionState::default(), json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "offline");
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(SubmitOutcome::redirect("/projects/1")).unwrap();
        assert_eq!(json, json!({"outcome": "redirect", "location": "/projects/1"}));
        let json = serde_json::to_value(SubmitOutcome::submitted()).unwrap();
        assert_eq!(json, json!({"outcome": "submitted"}));
    }

    #[test]
    fn test_action_state_constructors() {
        assert_eq!(ActionState::failure("x").error.as_deref(), Some("x"));
        assert_eq!(ActionState::success(Some("ok".into())).message.as_deref(), Some("ok"));
        assert_eq!(ActionState::default(), ActionState::success(None));
    }
}

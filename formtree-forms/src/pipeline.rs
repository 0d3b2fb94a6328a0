//! Validate → submit → settle, one submission at a time.
//!
//! ```text
//! Idle ─submit─▶ Validating ─ok─▶ Submitting ─▶ Success | Error
//!                    │                  │
//!                    └─invalid─▶ Error  └─redirect─▶ Idle
//! ```
//!
//! A settled pipeline starts over at `Validating` on the next submit. While a
//! submission is in flight further submits are dropped.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pending::PendingSignal;
use crate::record::SubmissionRecord;
use crate::submit::{ActionState, SubmitHandler, SubmitOutcome};
use crate::validator::{FieldErrors, ValidationOutcome, Validator};

/// Where a form's submission lifecycle currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Success {
        message: Option<String>,
    },
    /// Field errors from validation, or a top-level message from the handler.
    Error {
        message: Option<String>,
        field_errors: FieldErrors,
    },
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }
}

/// How one call to [`SubmissionPipeline::submit`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Success { message: Option<String> },
    ValidationFailed(FieldErrors),
    /// Error payload or rejection from the handler.
    Failed { error: String },
    /// The handler asked to navigate away.
    Redirect { location: String },
    /// Another submission was in flight; nothing ran.
    Dropped,
    Cancelled,
}

impl Settlement {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::ValidationFailed(_) => "validation-failed",
            Self::Failed { .. } => "failed",
            Self::Redirect { .. } => "redirect",
            Self::Dropped => "dropped",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Runs submissions for one showing of a form.
pub struct SubmissionPipeline {
    name: Option<String>,
    validator: Arc<dyn Validator>,
    handler: Arc<dyn SubmitHandler>,
    pending: PendingSignal,
    state: watch::Sender<SubmissionState>,
    previous: Mutex<ActionState>,
    last_record: Mutex<Option<SubmissionRecord>>,
}

impl SubmissionPipeline {
    pub fn new(
        validator: Arc<dyn Validator>,
        handler: Arc<dyn SubmitHandler>,
        pending: PendingSignal,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            name: None,
            validator,
            handler,
            pending,
            state,
            previous: Mutex::new(ActionState::default()),
            last_record: Mutex::new(None),
        }
    }

    /// Name used in logs and records.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn pending(&self) -> &PendingSignal {
        &self.pending
    }

    /// Result handed to the next submit call.
    pub fn previous(&self) -> ActionState {
        self.previous
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_record(&self) -> Option<SubmissionRecord> {
        self.last_record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear a settled state, e.g. when the user dismisses the message.
    pub fn reset(&self) {
        self.state.send_if_modified(|state| {
            if state.is_settled() {
                *state = SubmissionState::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Validate `value` and, if valid, hand it to the submit handler.
    ///
    /// Dropping the returned future before it completes resets the state to
    /// `Idle` and releases the pending signal.
    pub async fn submit(&self, value: Value) -> Settlement {
        let started = self.state.send_if_modified(|state| {
            if state.is_in_flight() {
                false
            } else {
                *state = SubmissionState::Validating;
                true
            }
        });
        if !started {
            debug!(form = ?self.name, "submission in flight, dropping submit");
            return Settlement::Dropped;
        }
        let flight = InFlight::new(&self.state);
        let clock = Instant::now();
        debug!(form = ?self.name, state = "validating", "submission state");

        if let ValidationOutcome::Invalid(errors) = self.validator.validate(&value) {
            debug!(form = ?self.name, errors = errors.len(), "validation failed");
            flight.settle(SubmissionState::Error {
                message: None,
                field_errors: errors.clone(),
            });
            let settlement = Settlement::ValidationFailed(errors);
            self.record(&settlement, clock);
            return settlement;
        }

        let Some(pending) = self.pending.begin() else {
            warn!(form = ?self.name, "pending signal held by another submission, dropping submit");
            flight.settle(SubmissionState::Idle);
            return Settlement::Dropped;
        };
        flight.enter(SubmissionState::Submitting);

        let previous = self.previous();
        let result = self.handler.submit(&previous, value).await;
        drop(pending);

        let settlement = match result {
            Ok(SubmitOutcome::Submitted { message }) => {
                self.set_previous(ActionState::success(message.clone()));
                flight.settle(SubmissionState::Success {
                    message: message.clone(),
                });
                Settlement::Success { message }
            }
            Ok(SubmitOutcome::Failed { error }) => self.settle_error(flight, error),
            Err(e) => self.settle_error(flight, e.to_string()),
            Ok(SubmitOutcome::Redirect { location }) => {
                flight.settle(SubmissionState::Idle);
                Settlement::Redirect { location }
            }
        };
        self.record(&settlement, clock);
        settlement
    }

    /// Like [`submit`](Self::submit), abandoned when `cancel` fires.
    pub async fn submit_with_cancel(&self, value: Value, cancel: CancellationToken) -> Settlement {
        let clock = Instant::now();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(form = ?self.name, "submission cancelled");
                let settlement = Settlement::Cancelled;
                self.record(&settlement, clock);
                settlement
            }
            settlement = self.submit(value) => settlement,
        }
    }

    fn settle_error(&self, flight: InFlight<'_>, error: String) -> Settlement {
        self.set_previous(ActionState::failure(error.clone()));
        flight.settle(SubmissionState::Error {
            message: Some(error.clone()),
            field_errors: FieldErrors::new(),
        });
        Settlement::Failed { error }
    }

    fn set_previous(&self, state: ActionState) {
        *self.previous.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn record(&self, settlement: &Settlement, clock: Instant) {
        let duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut record = SubmissionRecord::new(self.name.clone(), settlement.label(), duration_ms);
        match settlement {
            Settlement::Success { message } => {
                info!(form = ?self.name, duration_ms, "submission succeeded");
                if let Some(message) = message {
                    record = record.with_detail(message.clone());
                }
            }
            Settlement::ValidationFailed(errors) => {
                record = record.with_detail(format!("{} field error(s)", errors.len()));
            }
            Settlement::Failed { error } => {
                warn!(form = ?self.name, %error, duration_ms, "submission failed");
                record = record.with_detail(error.clone());
            }
            Settlement::Redirect { location } => {
                info!(form = ?self.name, %location, "submission redirected");
                record = record.with_detail(location.clone());
            }
            Settlement::Dropped | Settlement::Cancelled => {}
        }
        debug!(id = %record.id, outcome = %record.outcome, "submission record");
        *self
            .last_record
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(record);
    }
}

impl std::fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("name", &self.name)
            .field("state", &*self.state.borrow())
            .field("pending", &self.pending.is_pending())
            .finish_non_exhaustive()
    }
}

/// Owns the in-flight state; an unsettled flight falls back to `Idle`.
struct InFlight<'a> {
    state: &'a watch::Sender<SubmissionState>,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a watch::Sender<SubmissionState>) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    fn enter(&self, next: SubmissionState) {
        debug!(state = ?next, "submission state");
        self.state.send_replace(next);
    }

    fn settle(mut self, next: SubmissionState) {
        self.settled = true;
        self.enter(next);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("submission abandoned before settling");
            self.state.send_replace(SubmissionState::Idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::submit_fn;
    use serde_json::json;

    fn accept_all() -> Arc<dyn Validator> {
        Arc::new(|_: &Value| ValidationOutcome::Valid)
    }

    fn pipeline_with(outcome: SubmitOutcome) -> SubmissionPipeline {
        let handler = submit_fn(move |_: ActionState, _: Value| {
            let outcome = outcome.clone();
            async move { anyhow::Ok(outcome) }
        });
        SubmissionPipeline::new(accept_all(), Arc::new(handler), PendingSignal::new())
            .with_name("task")
    }

    #[test]
    fn test_state_predicates() {
        assert!(SubmissionState::Validating.is_in_flight());
        assert!(SubmissionState::Submitting.is_in_flight());
        assert!(!SubmissionState::Idle.is_in_flight());
        assert!(SubmissionState::Success { message: None }.is_settled());
        assert!(!SubmissionState::Submitting.is_settled());
    }

    #[tokio::test]
    async fn test_success_settles_and_records() {
        let pipeline = pipeline_with(SubmitOutcome::with_message("saved"));
        let settlement = pipeline.submit(json!({})).await;
        assert_eq!(
            settlement,
            Settlement::Success {
                message: Some("saved".into())
            }
        );
        assert_eq!(
            pipeline.state(),
            SubmissionState::Success {
                message: Some("saved".into())
            }
        );
        assert_eq!(pipeline.previous(), ActionState::success(Some("saved".into())));
        let record = pipeline.last_record().unwrap();
        assert_eq!(record.outcome, "success");
        assert_eq!(record.form.as_deref(), Some("task"));
    }

    #[tokio::test]
    async fn test_error_payload_is_top_level() {
        let pipeline = pipeline_with(SubmitOutcome::failed("name taken"));
        let settlement = pipeline.submit(json!({})).await;
        assert_eq!(
            settlement,
            Settlement::Failed {
                error: "name taken".into()
            }
        );
        assert_eq!(
            pipeline.state(),
            SubmissionState::Error {
                message: Some("name taken".into()),
                field_errors: FieldErrors::new()
            }
        );
        assert!(!pipeline.pending().is_pending());
    }

    #[tokio::test]
    async fn test_reset_clears_settled_state() {
        let pipeline = pipeline_with(SubmitOutcome::submitted());
        pipeline.reset();
        assert_eq!(pipeline.state(), SubmissionState::Idle);
        pipeline.submit(json!({})).await;
        assert!(pipeline.state().is_settled());
        pipeline.reset();
        assert_eq!(pipeline.state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_busy_shared_signal_drops_submit() {
        let shared = PendingSignal::new();
        let _other_form = shared.begin().unwrap();
        let handler = submit_fn(|_: ActionState, _: Value| async { anyhow::Ok(SubmitOutcome::submitted()) });
        let pipeline = SubmissionPipeline::new(accept_all(), Arc::new(handler), shared.clone());
        assert_eq!(pipeline.submit(json!({})).await, Settlement::Dropped);
        assert_eq!(pipeline.state(), SubmissionState::Idle);
        assert!(shared.is_pending());
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let pipeline = pipeline_with(SubmitOutcome::submitted());
        let token = CancellationToken::new();
        token.cancel();
        let settlement = pipeline.submit_with_cancel(json!({}), token).await;
        assert_eq!(settlement, Settlement::Cancelled);
        assert_eq!(pipeline.state(), SubmissionState::Idle);
        assert_eq!(pipeline.last_record().unwrap().outcome, "cancelled");
    }

    #[test]
    fn test_settlement_labels() {
        assert_eq!(Settlement::Dropped.label(), "dropped");
        assert_eq!(Settlement::ValidationFailed(FieldErrors::new()).label(), "validation-failed");
        assert!(Settlement::Success { message: None }.is_success());
        assert!(!Settlement::Cancelled.is_success());
    }
}

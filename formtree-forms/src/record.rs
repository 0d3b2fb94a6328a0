//! Record of one settled submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to a submission, for the host's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Unique ID for this record (ULID format)
    pub id: String,

    /// When the submission settled
    pub timestamp: DateTime<Utc>,

    /// Form name, when the form has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,

    /// Settlement label (e.g., "success", "validation-failed", "redirect")
    pub outcome: String,

    /// Top-level error, redirect target or number of field errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// How long the submission took (milliseconds)
    pub duration_ms: u64,
}

impl SubmissionRecord {
    pub fn new(form: Option<String>, outcome: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            timestamp: Utc::now(),
            form,
            outcome: outcome.into(),
            detail: None,
            duration_ms,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

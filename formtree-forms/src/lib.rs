//! Form configuration and the submission lifecycle
//!
//! A [`FormConfiguration`] binds a field tree to its default values, a
//! [`Validator`], a [`SubmitHandler`] and an [`ActionRenderer`]. Each showing
//! of the form gets a [`SubmissionPipeline`] that runs
//! validate → submit → settle and drives a shared [`PendingSignal`].
//!
//! ```rust,ignore
//! let form = FormConfiguration::builder(project_tree())
//!     .with_config(&config)
//!     .submit(submit_fn(|_previous, value| async move {
//!         let id = projects.create(value).await?;
//!         Ok(SubmitOutcome::redirect(format!("/projects/{id}")))
//!     }))
//!     .build()?;
//!
//! let pipeline = form.pipeline();
//! match pipeline.submit(current_value).await {
//!     Settlement::Redirect { location } => navigate(location),
//!     Settlement::ValidationFailed(errors) => show_inline(errors),
//!     other => show_status(other),
//! }
//! ```

mod actions;
mod error;
mod form;
mod pending;
mod pipeline;
mod record;
mod render;
mod submit;
mod validator;

pub use actions::{ActionBar, ActionButton, ActionRenderer, DefaultActions};
pub use error::{FormError, Result};
pub use form::{FormConfiguration, FormConfigurationBuilder};
pub use pending::{PendingGuard, PendingObserver, PendingSignal};
pub use pipeline::{Settlement, SubmissionPipeline, SubmissionState};
pub use record::SubmissionRecord;
pub use render::{render_leaf, WidgetRenderer};
pub use submit::{submit_fn, ActionState, SubmitFn, SubmitHandler, SubmitOutcome};
pub use validator::{FieldErrors, SchemaValidator, ValidationOutcome, Validator, ValidatorChain};

pub use formtree_fields::ValidationMode;

use crate::config::Config;
use crate::form::FormState;
use crate::lead::LeadField;
use crate::pipeline::{SubmissionOutcome, SubmissionPipeline};
use crate::validation::ValidationResult;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    /// Validation failed; nothing was sent.
    Rejected(BTreeMap<LeadField, String>),
    /// An earlier submission is still in flight.
    Busy,
    Completed(SubmissionOutcome),
}

/// Binds a [`FormState`] to a submission pipeline for one presentation surface.
///
/// A `submit` future that is dropped before the pipeline answers leaves the
/// form in `Submitting`; later calls return [`SubmitAttempt::Busy`] until
/// the form is rebuilt.
pub struct LeadForm {
    state: FormState,
    pipeline: Arc<SubmissionPipeline>,
}

impl LeadForm {
    pub fn new(state: FormState, pipeline: Arc<SubmissionPipeline>) -> Self {
        Self { state, pipeline }
    }

    pub fn from_config(config: &Config, pipeline: Arc<SubmissionPipeline>) -> Self {
        let state = FormState::new(config.form.schema(), config.form.banner_timeout());
        Self::new(state, pipeline)
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn input(&mut self, field: LeadField, value: impl Into<String>) {
        self.state.set_field(field, value);
    }

    pub fn blur(&mut self, field: LeadField) -> ValidationResult {
        self.state.blur(field).clone()
    }

    pub async fn submit(&mut self) -> SubmitAttempt {
        self.state.expire(Instant::now());
        if !self.state.is_submit_enabled() {
            warn!("Submission ignored, another one is still in flight");
            return SubmitAttempt::Busy;
        }

        if !self.state.validate_all() {
            return SubmitAttempt::Rejected(self.state.errors());
        }

        let snapshot = match self.state.begin_submit() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("{e}");
                return SubmitAttempt::Busy;
            }
        };

        let outcome = self.pipeline.submit(&snapshot).await;
        info!("Lead submission finished: {outcome:?}");
        if let Err(e) = self.state.complete_submit(outcome.clone()) {
            warn!("{e}");
        }
        SubmitAttempt::Completed(outcome)
    }

    /// Wait for the banner to time out and return the form to `Idle`.
    /// Dropping the future cancels the wait.
    pub async fn settle(&mut self) -> bool {
        let Some(deadline) = self.state.deadline() else {
            return false;
        };
        tokio::time::sleep_until(deadline).await;
        self.state.expire(Instant::now())
    }
}

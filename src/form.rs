use crate::lead::{LeadField, LeadRecord};
use crate::pipeline::{FailureReason, SubmissionOutcome};
use crate::validation::{FormSchema, ValidationResult};
use log::debug;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_BANNER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    Success,
    Error,
}

impl SubmissionStatus {
    /// Banner text shown while the status lasts.
    pub fn banner(&self) -> Option<&'static str> {
        match self {
            SubmissionStatus::Success => Some("Success! We'll be in touch soon."),
            SubmissionStatus::Error => Some("Something went wrong. Please try again."),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Cannot {action} while the form is {status:?}")]
    InvalidTransition {
        action: &'static str,
        status: SubmissionStatus,
    },
}

/// Live form: field values, per-field validation results and the
/// submission status with its self-dismiss deadline.
#[derive(Debug, Clone)]
pub struct FormState {
    lead: LeadRecord,
    results: BTreeMap<LeadField, ValidationResult>,
    status: SubmissionStatus,
    schema: FormSchema,
    banner_timeout: Duration,
    deadline: Option<Instant>,
    last_outcome: Option<SubmissionOutcome>,
    shake: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(FormSchema::default(), DEFAULT_BANNER_TIMEOUT)
    }
}

impl FormState {
    pub fn new(schema: FormSchema, banner_timeout: Duration) -> Self {
        Self {
            lead: LeadRecord::default(),
            results: BTreeMap::new(),
            status: SubmissionStatus::Idle,
            schema,
            banner_timeout,
            deadline: None,
            last_outcome: None,
            shake: false,
        }
    }

    pub fn lead(&self) -> &LeadRecord {
        &self.lead
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn is_submit_enabled(&self) -> bool {
        self.status != SubmissionStatus::Submitting
    }

    pub fn result(&self, field: LeadField) -> Option<&ValidationResult> {
        self.results.get(&field)
    }

    /// Messages for every field currently marked invalid.
    pub fn errors(&self) -> BTreeMap<LeadField, String> {
        self.results
            .iter()
            .filter(|(_, r)| !r.valid)
            .map(|(field, r)| (*field, r.message.clone().unwrap_or_default()))
            .collect()
    }

    pub fn has_error(&self, field: LeadField) -> bool {
        self.results.get(&field).is_some_and(|r| !r.valid)
    }

    /// Overwrite a value. A field already marked invalid is re-checked right
    /// away so a fixed typo clears its error; others wait for `blur`.
    pub fn set_field(&mut self, field: LeadField, value: impl Into<String>) {
        self.lead.set(field, value);
        if self.has_error(field) {
            let result = self.schema.validate_field(field, self.lead.get(field));
            if result.valid {
                self.results.remove(&field);
            } else {
                self.results.insert(field, result);
            }
        }
    }

    pub fn blur(&mut self, field: LeadField) -> &ValidationResult {
        let result = self.schema.validate_field(field, self.lead.get(field));
        self.results.insert(field, result);
        &self.results[&field]
    }

    /// Validate every field and keep the results for display. On failure
    /// the status stays `Idle` and a shake is requested.
    pub fn validate_all(&mut self) -> bool {
        let report = self.schema.validate_record(&self.lead);
        let submittable = report.is_submittable();
        self.results = report.into_results();
        if !submittable {
            debug!("Form has invalid fields: {:?}", self.errors().keys());
            self.shake = true;
        }
        submittable
    }

    /// One-shot "shake" affordance after a failed `validate_all`.
    pub fn take_shake(&mut self) -> bool {
        std::mem::take(&mut self.shake)
    }

    /// Enter `Submitting` and hand out a read-only snapshot of the lead.
    ///
    /// A banner still showing from the previous submission is dismissed.
    pub fn begin_submit(&mut self) -> Result<LeadRecord, FormError> {
        if self.status == SubmissionStatus::Submitting {
            return Err(FormError::InvalidTransition {
                action: "begin a submission",
                status: self.status,
            });
        }
        self.status = SubmissionStatus::Submitting;
        self.deadline = None;
        self.last_outcome = None;
        Ok(self.lead.clone())
    }

    pub fn complete_submit(&mut self, outcome: SubmissionOutcome) -> Result<(), FormError> {
        self.complete_submit_at(outcome, Instant::now())
    }

    pub fn complete_submit_at(
        &mut self,
        outcome: SubmissionOutcome,
        now: Instant,
    ) -> Result<(), FormError> {
        if self.status != SubmissionStatus::Submitting {
            return Err(FormError::InvalidTransition {
                action: "complete a submission",
                status: self.status,
            });
        }

        if outcome.is_success() {
            self.reset_after_success();
            self.status = SubmissionStatus::Success;
        } else {
            if let SubmissionOutcome::Failed(FailureReason::Rejected(errors)) = &outcome {
                for (field, message) in errors {
                    self.results
                        .insert(*field, ValidationResult::invalid(message.clone()));
                }
            }
            self.status = SubmissionStatus::Error;
        }
        self.deadline = Some(now + self.banner_timeout);
        self.last_outcome = Some(outcome);
        Ok(())
    }

    /// Clear every value and validation result.
    pub fn reset_after_success(&mut self) {
        self.lead = LeadRecord::default();
        self.results.clear();
        self.shake = false;
    }

    /// Return to `Idle` once the banner deadline has passed.
    /// Returns whether the status changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.status = SubmissionStatus::Idle;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

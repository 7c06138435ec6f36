pub mod config;
pub mod controller;
pub mod form;
pub mod lead;
pub mod pipeline;
pub mod storage;
pub mod transport;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use controller::{LeadForm, SubmitAttempt};
pub use form::{FormState, SubmissionStatus};
pub use lead::{FieldKind, LeadField, LeadRecord, ProjectsPerMonth};
pub use pipeline::{FailureReason, SubmissionOutcome, SubmissionPipeline};
pub use storage::{JsonFileStore, LeadStore, MemoryStore, StoredLead};
pub use validation::{validate, FormSchema, ValidationResult};

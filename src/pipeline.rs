use crate::config::Config;
use crate::lead::{LeadField, LeadRecord};
use crate::storage::{JsonFileStore, LeadStore, StoredLead};
use crate::transport::{Delivery, EmailRelayTransport, Transport, WebhookTransport};
use crate::validation::FormSchema;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Accepted by the primary transport.
    Delivered,
    /// Accepted by a secondary transport.
    DeliveredFallback,
    /// No transport accepted the lead; it was written to the local store.
    StoredLocally,
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The record did not pass validation; nothing was sent.
    Rejected(BTreeMap<LeadField, String>),
    /// Every transport failed and so did the local store.
    Terminal(String),
}

impl SubmissionOutcome {
    /// Whether the user should be told the submission went through.
    ///
    /// `StoredLocally` counts as success even though nothing left the machine.
    pub fn is_success(&self) -> bool {
        !matches!(self, SubmissionOutcome::Failed(_))
    }
}

/// Ordered fallback chain: each transport in turn, then the local store.
pub struct SubmissionPipeline {
    transports: Vec<Box<dyn Transport>>,
    store: Box<dyn LeadStore>,
    schema: FormSchema,
}

impl SubmissionPipeline {
    pub fn new(
        transports: Vec<Box<dyn Transport>>,
        store: Box<dyn LeadStore>,
        schema: FormSchema,
    ) -> Self {
        Self {
            transports,
            store,
            schema,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut transports: Vec<Box<dyn Transport>> = Vec::new();

        if let Some(relay) = config.relay.as_ref().and_then(EmailRelayTransport::from_config) {
            transports.push(Box::new(relay));
        }
        if let Some(webhook) = WebhookTransport::from_config(&config.webhook) {
            transports.push(Box::new(webhook));
        }

        let store = JsonFileStore::new(&config.storage.directory, &config.storage.namespace);
        info!(
            "Submission pipeline: [{}] then local store {}",
            transports
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", "),
            store.path().display()
        );

        Self::new(transports, Box::new(store), config.form.schema())
    }

    pub fn transport_names(&self) -> Vec<&str> {
        self.transports.iter().map(|t| t.name()).collect()
    }

    pub fn store(&self) -> &dyn LeadStore {
        self.store.as_ref()
    }

    /// Deliver a lead. Never returns an error: transport failures fall
    /// through to the next step.
    pub async fn submit(&self, lead: &LeadRecord) -> SubmissionOutcome {
        let report = self.schema.validate_record(lead);
        if !report.is_submittable() {
            warn!(
                "Refusing to submit lead with invalid fields: {:?}",
                report.errors().keys().collect::<Vec<_>>()
            );
            return SubmissionOutcome::Failed(FailureReason::Rejected(report.errors()));
        }

        for transport in &self.transports {
            debug!("Attempting delivery via {}", transport.name());
            match transport.deliver(lead).await {
                Ok(Delivery::Primary) => return SubmissionOutcome::Delivered,
                Ok(Delivery::Fallback) => return SubmissionOutcome::DeliveredFallback,
                Err(e) => warn!("{} delivery failed: {}", transport.name(), e),
            }
        }

        match self.store.append(StoredLead::new(lead.clone(), Utc::now())) {
            Ok(count) => {
                warn!(
                    "All transports failed, lead stored locally ({count} pending); it will not be sent automatically"
                );
                SubmissionOutcome::StoredLocally
            }
            Err(e) => {
                error!("Failed to store lead locally: {e}");
                SubmissionOutcome::Failed(FailureReason::Terminal(e.to_string()))
            }
        }
    }
}

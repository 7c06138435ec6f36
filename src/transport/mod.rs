//! Off-device delivery strategies for captured leads.
//!
//! Each transport makes a single attempt. Retrying, falling back and
//! local persistence are the pipeline's job.

pub mod email_relay;
pub mod webhook;

pub use email_relay::EmailRelayTransport;
pub use webhook::WebhookTransport;

use crate::lead::LeadRecord;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Which tier of the chain accepted a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Primary,
    Fallback,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote returned HTTP {0}")]
    Status(u16),
    #[error("Remote reported failure: {0}")]
    Unsuccessful(String),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    /// Make one delivery attempt.
    async fn deliver(&self, lead: &LeadRecord) -> Result<Delivery, TransportError>;
}

pub(crate) fn build_client(timeout_seconds: Option<u64>) -> Client {
    let mut builder = Client::builder().user_agent(concat!(
        "lead-capture/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(secs) = timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().unwrap_or_else(|e| {
        log::warn!("Failed to build HTTP client, using defaults: {e}");
        Client::new()
    })
}

/// `"Not provided"` for blank values, as shown in the lead notification.
pub(crate) fn or_not_provided(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        "Not provided".to_string()
    } else {
        value.to_string()
    }
}

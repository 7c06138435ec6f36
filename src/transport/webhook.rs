use super::{build_client, Delivery, Transport, TransportError};
use crate::config::WebhookConfig;
use crate::lead::LeadRecord;
use async_trait::async_trait;
use chrono::Local;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Secondary transport: a form-to-email webhook taking a JSON payload.
pub struct WebhookTransport {
    client: Client,
    url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    #[serde(rename = "_subject")]
    pub subject: String,
    #[serde(rename = "_template")]
    pub template: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Projects Per Month")]
    pub projects_per_month: String,
    #[serde(rename = "Submitted At")]
    pub submitted_at: String,
}

impl WebhookPayload {
    pub fn new(lead: &LeadRecord, submitted_at: impl Into<String>) -> Self {
        let name = lead.full_name();
        Self {
            subject: format!("New ImpactIQ Lead: {name}"),
            template: "table".to_string(),
            name,
            email: lead.email.trim().to_string(),
            phone: lead.phone.trim().to_string(),
            company: lead.company.trim().to_string(),
            projects_per_month: lead.projects_per_month.trim().to_string(),
            submitted_at: submitted_at.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    message: Option<String>,
}

impl WebhookResponse {
    // The service sends `"true"` as a string; accept the boolean too.
    fn accepted(&self) -> bool {
        match &self.success {
            Value::Bool(b) => *b,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

impl WebhookTransport {
    pub fn new(url: impl Into<String>, timeout_seconds: Option<u64>) -> Self {
        Self {
            client: build_client(timeout_seconds),
            url: url.into(),
        }
    }

    pub fn from_config(config: &WebhookConfig) -> Option<Self> {
        if !config.enabled {
            debug!("Webhook transport disabled");
            return None;
        }
        Some(Self::new(config.url.clone(), config.timeout_seconds))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn interpret_response(body: &str) -> Result<Delivery, TransportError> {
    let response: WebhookResponse = serde_json::from_str(body)
        .map_err(|e| TransportError::InvalidResponse(format!("{e}: {body}")))?;

    if response.accepted() {
        Ok(Delivery::Fallback)
    } else {
        Err(TransportError::Unsuccessful(
            response
                .message
                .unwrap_or_else(|| "webhook did not report success".to_string()),
        ))
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, lead: &LeadRecord) -> Result<Delivery, TransportError> {
        let submitted_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let payload = WebhookPayload::new(lead, submitted_at);

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await?;

        // Error statuses still carry a JSON body explaining the failure.
        let status = response.status();
        let body = response.text().await?;
        let result = interpret_response(&body);
        if result.is_err() && !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        if result.is_ok() {
            info!("Lead delivered via webhook {}", self.url);
        }
        result
    }
}

use super::{build_client, or_not_provided, Delivery, Transport, TransportError};
use crate::config::RelayConfig;
use crate::lead::LeadRecord;
use async_trait::async_trait;
use chrono::Local;
use log::{debug, info};
use reqwest::Client;
use serde::Serialize;

/// Primary transport: a templated email-relay API (EmailJS-compatible).
pub struct EmailRelayTransport {
    client: Client,
    config: RelayConfig,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParams {
    pub to_email: String,
    pub from_name: String,
    pub from_email: String,
    pub phone: String,
    pub company: String,
    pub projects_per_month: String,
    pub message: String,
}

impl EmailRelayTransport {
    /// Returns `None` while the relay still has placeholder credentials.
    pub fn from_config(config: &RelayConfig) -> Option<Self> {
        if !config.is_configured() {
            debug!("Email relay not configured, skipping primary transport");
            return None;
        }
        Some(Self {
            client: build_client(config.timeout_seconds),
            config: config.clone(),
        })
    }

    pub fn template_params(&self, lead: &LeadRecord, submitted_at: &str) -> TemplateParams {
        let name = lead.full_name();
        let message = format!(
            "New Lead from ImpactIQ Funnel:\n\n\
             Name: {name}\n\
             Email: {}\n\
             Phone: {}\n\
             Company: {}\n\
             Projects Per Month: {}\n\n\
             Submitted at: {submitted_at}",
            or_not_provided(&lead.email),
            or_not_provided(&lead.phone),
            or_not_provided(&lead.company),
            or_not_provided(&lead.projects_per_month),
        );

        TemplateParams {
            to_email: self.config.to_email.clone(),
            from_name: if name.is_empty() {
                "Website Visitor".to_string()
            } else {
                name
            },
            from_email: if lead.email.trim().is_empty() {
                "no-email@provided.com".to_string()
            } else {
                lead.email.trim().to_string()
            },
            phone: or_not_provided(&lead.phone),
            company: or_not_provided(&lead.company),
            projects_per_month: or_not_provided(&lead.projects_per_month),
            message,
        }
    }
}

#[async_trait]
impl Transport for EmailRelayTransport {
    fn name(&self) -> &str {
        "email relay"
    }

    async fn deliver(&self, lead: &LeadRecord) -> Result<Delivery, TransportError> {
        let submitted_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let request = SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            template_params: self.template_params(lead, &submitted_at),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("Email relay rejected lead: HTTP {} {}", status.as_u16(), body);
            return Err(TransportError::Status(status.as_u16()));
        }

        info!("Lead delivered via email relay to {}", self.config.to_email);
        Ok(Delivery::Primary)
    }
}

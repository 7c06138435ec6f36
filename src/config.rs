use crate::lead::LeadField;
use crate::storage::DEFAULT_NAMESPACE;
use crate::validation::FormSchema;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_RELAY_API_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";
pub const DEFAULT_WEBHOOK_URL: &str = "https://formsubmit.co/ajax/leads@example.com";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub relay: Option<RelayConfig>,
    pub webhook: WebhookConfig,
    pub storage: StorageConfig,
    pub form: FormConfig,
    pub logging: Option<LoggingConfig>,
}

/// Credentials for the templated email-relay API.
///
/// Values still starting with `YOUR_` are placeholders left over from the
/// generated config and disable the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub public_key: String,
    pub service_id: String,
    pub template_id: String,
    pub to_email: String,
    #[serde(default = "default_relay_api_url")]
    pub api_url: String,
    pub timeout_seconds: Option<u64>,
}

fn default_relay_api_url() -> String {
    DEFAULT_RELAY_API_URL.to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            public_key: "YOUR_PUBLIC_KEY".to_string(),
            service_id: "YOUR_SERVICE_ID".to_string(),
            template_id: "YOUR_TEMPLATE_ID".to_string(),
            to_email: "leads@example.com".to_string(),
            api_url: default_relay_api_url(),
            timeout_seconds: None,
        }
    }
}

impl RelayConfig {
    pub fn is_configured(&self) -> bool {
        [
            &self.public_key,
            &self.service_id,
            &self.template_id,
            &self.to_email,
        ]
        .iter()
        .all(|value| !is_placeholder(value))
    }
}

fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.starts_with("YOUR_")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_WEBHOOK_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub directory: String,
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: "leads".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub banner_timeout_seconds: u64,
    pub optional_fields: Vec<LeadField>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            banner_timeout_seconds: 5,
            optional_fields: Vec::new(),
        }
    }
}

impl FormConfig {
    pub fn schema(&self) -> FormSchema {
        FormSchema::with_optional(self.optional_fields.iter().copied())
    }

    pub fn banner_timeout(&self) -> Duration {
        Duration::from_secs(self.banner_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// A config that shows every section, with relay placeholders to fill in.
    pub fn template() -> Self {
        Self {
            relay: Some(RelayConfig::default()),
            logging: Some(LoggingConfig {
                level: "info".to_string(),
            }),
            ..Self::default()
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = if is_yaml(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML in config file: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Invalid TOML in config file: {}", path.display()))?
        };
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            toml::to_string_pretty(self)?
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// The relay section, only if it carries real credentials.
    pub fn active_relay(&self) -> Option<&RelayConfig> {
        self.relay.as_ref().filter(|relay| relay.is_configured())
    }

    pub fn check(&self) -> anyhow::Result<()> {
        if let Some(relay) = self.active_relay() {
            Url::parse(&relay.api_url)
                .with_context(|| format!("Invalid relay api_url: {}", relay.api_url))?;
        }
        if self.webhook.enabled {
            Url::parse(&self.webhook.url)
                .with_context(|| format!("Invalid webhook url: {}", self.webhook.url))?;
        }
        if self.storage.namespace.trim().is_empty() {
            bail!("storage.namespace must not be empty");
        }
        if self.form.banner_timeout_seconds == 0 {
            bail!("form.banner_timeout_seconds must be greater than zero");
        }
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_checks_out() {
        let config = Config::default();
        assert!(config.check().is_ok());
        assert!(config.active_relay().is_none());
        assert!(config.webhook.enabled);
        assert_eq!(config.storage.namespace, "impactiq_leads");
        assert_eq!(config.form.banner_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_placeholder_relay_is_inactive() {
        let config = Config::template();
        assert!(config.relay.is_some());
        assert!(config.active_relay().is_none());

        let mut relay = RelayConfig {
            public_key: "pk_live".to_string(),
            service_id: "service_roof".to_string(),
            template_id: "template_lead".to_string(),
            ..RelayConfig::default()
        };
        assert!(relay.is_configured());

        relay.service_id = "   ".to_string();
        assert!(!relay.is_configured());
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
            [relay]
            public_key = "pk_live"
            service_id = "service_roof"
            template_id = "template_lead"
            to_email = "sales@roofco.com"

            [webhook]
            enabled = false

            [form]
            banner_timeout_seconds = 7
            optional_fields = ["company"]
        "#;
        let config: Config = toml::from_str(content).unwrap();

        let relay = config.active_relay().unwrap();
        assert_eq!(relay.api_url, DEFAULT_RELAY_API_URL);
        assert!(!config.webhook.enabled);
        assert_eq!(config.webhook.url, DEFAULT_WEBHOOK_URL);
        assert_eq!(config.storage, StorageConfig::default());
        assert!(!config.form.schema().is_required(LeadField::Company));
        assert!(config.form.schema().is_required(LeadField::Email));
    }

    #[test]
    fn test_parse_yaml() {
        let content = "webhook:\n  url: https://hooks.example.com/leads\nstorage:\n  directory: /var/lib/leads\n";
        let config: Config = serde_yaml::from_str(content).unwrap();
        assert_eq!(config.webhook.url, "https://hooks.example.com/leads");
        assert!(config.webhook.enabled);
        assert_eq!(config.storage.directory, "/var/lib/leads");
    }

    #[test]
    fn test_file_round_trip_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["lead-capture.toml", "lead-capture.yaml"] {
            let path = dir.path().join(name);
            Config::template().to_file(&path).unwrap();
            assert_eq!(Config::from_file(&path).unwrap(), Config::template());
        }
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["broken.toml", "broken.yaml"] {
            let path = dir.path().join(name);
            std::fs::write(&path, "webhook = [unclosed\n  : -").unwrap();

            let err = Config::from_file(&path).unwrap_err();
            assert!(
                format!("{err:#}").contains(name),
                "error should name {name}: {err:#}"
            );
        }
    }

    #[test]
    fn test_check_rejects_bad_values() {
        let mut config = Config::default();
        config.webhook.url = "not a url".to_string();
        assert!(config.check().is_err());

        let mut config = Config::default();
        config.webhook.enabled = false;
        config.webhook.url = "not a url".to_string();
        assert!(config.check().is_ok());

        config.form.banner_timeout_seconds = 0;
        assert!(config.check().is_err());
    }
}

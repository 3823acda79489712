use serde::Deserialize;
use std::path::Path;

use super::ClientConfig;
use crate::errors::{SpeechError, SpeechResult};

/// Complete YAML configuration structure
///
/// All fields are optional so a file may carry only part of the
/// configuration; the rest comes from the environment or defaults.
///
/// # Example YAML structure
/// ```yaml
/// service:
///   url: "https://stream.watsonplatform.net/speech-to-text/api"
///   model: "en-US_BroadbandModel"
///   request_timeout_secs: 120
///   connect_timeout_secs: 30
///
/// credentials:
///   username: "your-username"
///   password: "your-password"
///   # or
///   api_key: "your-iam-api-key"
///   iam_url: "https://iam.cloud.ibm.com/identity/token"
///   # or
///   bearer_token: "pre-issued-token"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub service: Option<ServiceYaml>,
    pub credentials: Option<CredentialsYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServiceYaml {
    pub url: Option<String>,
    pub model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CredentialsYaml {
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub iam_url: Option<String>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &Path) -> SpeechResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SpeechError::Configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents)
            .map_err(|e| SpeechError::Configuration(format!("Failed to parse YAML config: {e}")))
    }

    /// Overlay every value present in the file onto `config`.
    pub(super) fn apply(self, config: &mut ClientConfig) {
        if let Some(service) = self.service {
            if let Some(url) = service.url {
                config.url = url;
            }
            if let Some(model) = service.model {
                config.default_model = Some(model);
            }
            if let Some(secs) = service.request_timeout_secs {
                config.request_timeout_secs = secs;
            }
            if let Some(secs) = service.connect_timeout_secs {
                config.connect_timeout_secs = secs;
            }
        }

        if let Some(credentials) = self.credentials {
            if let Some(iam_url) = credentials.iam_url {
                config.iam_url = iam_url;
            }
            // A credential kind named in the file replaces whatever the
            // environment selected.
            if credentials.api_key.is_some()
                || credentials.bearer_token.is_some()
                || credentials.username.is_some()
            {
                config.api_key = credentials.api_key;
                config.bearer_token = credentials.bearer_token;
                config.username = credentials.username;
                config.password = credentials.password;
            }
        }
    }
}

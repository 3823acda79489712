//! Client configuration
//!
//! Configuration comes from environment variables and, optionally, a YAML
//! file. Priority: YAML > ENV vars > .env values > defaults. The `.env` file
//! is loaded by the binary at startup.
//!
//! # Example
//! ```rust,no_run
//! use watson_stt::ClientConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Environment variables only
//! let config = ClientConfig::from_env()?;
//!
//! // YAML file on top of the environment
//! let config = ClientConfig::from_file(Path::new("watson-stt.yaml"))?;
//! println!("Talking to {}", config.url);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::core::transport::{Credentials, DEFAULT_IAM_URL};
use crate::errors::{SpeechError, SpeechResult};

mod env;
mod yaml;

pub use yaml::YamlConfig;

/// Default service endpoint.
pub const DEFAULT_URL: &str = "https://stream.watsonplatform.net/speech-to-text/api";

/// Default whole-request timeout for REST calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default TCP/TLS connect timeout, also used for the channel handshake.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Speech-to-text client configuration.
///
/// Exactly one credential kind is used, in this order: IAM API key, bearer
/// token, username/password.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Service endpoint, e.g. `https://stream.watsonplatform.net/speech-to-text/api`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    /// IAM token endpoint used with `api_key`.
    pub iam_url: String,
    /// Model for recognitions that do not name one.
    pub default_model: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

/// Zeroize secrets when the configuration is dropped.
impl Drop for ClientConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        for secret in [
            &mut self.password,
            &mut self.api_key,
            &mut self.bearer_token,
        ]
        .into_iter()
        .flatten()
        {
            secret.zeroize();
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

impl ClientConfig {
    /// Configuration for `url` without credentials.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            api_key: None,
            bearer_token: None,
            iam_url: DEFAULT_IAM_URL.to_string(),
            default_model: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_iam_url(mut self, iam_url: impl Into<String>) -> Self {
        self.iam_url = iam_url.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Load from environment variables and validate.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `WATSON_STT_URL` | Service endpoint |
    /// | `WATSON_STT_USERNAME` / `WATSON_STT_PASSWORD` | Basic auth |
    /// | `WATSON_STT_API_KEY` | IAM API key |
    /// | `WATSON_STT_BEARER_TOKEN` | Pre-issued token |
    /// | `WATSON_STT_IAM_URL` | IAM token endpoint |
    /// | `WATSON_STT_MODEL` | Default model |
    /// | `WATSON_STT_REQUEST_TIMEOUT_SECS` | REST timeout |
    /// | `WATSON_STT_CONNECT_TIMEOUT_SECS` | Connect timeout |
    pub fn from_env() -> SpeechResult<Self> {
        let mut config = Self::default();
        env::apply_env(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file with environment variables as the base.
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    pub fn from_file(path: &Path) -> SpeechResult<Self> {
        let yaml_config = YamlConfig::from_file(path)?;

        let mut config = Self::default();
        env::apply_env(&mut config)?;
        yaml_config.apply(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// Reject an unusable endpoint, missing credentials or zero timeouts.
    pub fn validate(&self) -> SpeechResult<()> {
        self.endpoint()?;

        if self.username.is_some() != self.password.is_some() {
            return Err(SpeechError::Configuration(
                "username and password must be set together".to_string(),
            ));
        }
        if self.credentials()?.is_empty() {
            return Err(SpeechError::Configuration(
                "credentials must not be empty".to_string(),
            ));
        }
        if self.api_key.is_some() {
            Url::parse(&self.iam_url).map_err(|e| {
                SpeechError::Configuration(format!("invalid IAM URL '{}': {e}", self.iam_url))
            })?;
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(SpeechError::Configuration(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if let Some(model) = &self.default_model
            && model.trim().is_empty()
        {
            return Err(SpeechError::Configuration(
                "default model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed service endpoint.
    pub fn endpoint(&self) -> SpeechResult<Url> {
        let url = Url::parse(&self.url).map_err(|e| {
            SpeechError::Configuration(format!("invalid service URL '{}': {e}", self.url))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SpeechError::Configuration(format!(
                "service URL must be http or https, got '{other}'"
            ))),
        }
    }

    /// The credentials to present, by priority.
    pub fn credentials(&self) -> SpeechResult<Credentials> {
        if let Some(api_key) = &self.api_key {
            return Ok(Credentials::iam_api_key(api_key.clone()));
        }
        if let Some(token) = &self.bearer_token {
            return Ok(Credentials::bearer(token.clone()));
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Ok(Credentials::basic(username.clone(), password.clone()))
            }
            _ => Err(SpeechError::Configuration(
                "no credentials configured: set an API key, a bearer token, or username and password"
                    .to_string(),
            )),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

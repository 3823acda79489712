//! Credentials and token management.
//!
//! Three credential kinds are supported:
//!
//! - Service username/password sent as HTTP basic auth
//! - IAM API key exchanged for a bearer token (cached until shortly before expiry)
//! - A pre-issued bearer token
//!
//! Secrets are wiped from memory when the credentials are dropped.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::form_urlencoded;
use zeroize::Zeroizing;

use crate::errors::{SpeechError, SpeechResult};

/// Default IAM token endpoint.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Refresh tokens this long before the service says they expire.
const TOKEN_SAFETY_MARGIN_SECS: u64 = 300;

/// Credentials for the speech service.
#[derive(Clone)]
pub enum Credentials {
    Basic {
        username: String,
        password: Zeroizing<String>,
    },
    IamApiKey(Zeroizing<String>),
    Bearer(Zeroizing<String>),
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn iam_api_key(api_key: impl Into<String>) -> Self {
        Self::IamApiKey(Zeroizing::new(api_key.into()))
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(Zeroizing::new(token.into()))
    }

    /// True when no usable secret is present.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Basic { username, password } => username.is_empty() || password.is_empty(),
            Self::IamApiKey(key) => key.is_empty(),
            Self::Bearer(token) => token.is_empty(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::IamApiKey(_) => "iam",
            Self::Bearer(_) => "bearer",
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::IamApiKey(_) => f.write_str("IamApiKey(<redacted>)"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// How a streaming channel presents its credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum ChannelCredentials {
    /// Value for the handshake `Authorization` header.
    Header(Zeroizing<String>),
    /// Token appended as the `access_token` query parameter.
    QueryToken(Zeroizing<String>),
}

impl std::fmt::Debug for ChannelCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header(_) => f.write_str("Header(<redacted>)"),
            Self::QueryToken(_) => f.write_str("QueryToken(<redacted>)"),
        }
    }
}

// =============================================================================
// IAM Token Management
// =============================================================================

/// IAM access token with expiration tracking.
#[derive(Clone)]
struct IamToken {
    access_token: Zeroizing<String>,
    expires_at: Instant,
}

impl IamToken {
    fn is_expired(&self) -> bool {
        self.expires_at <= Instant::now() + Duration::from_secs(60)
    }
}

#[derive(Debug, serde::Deserialize)]
struct IamTokenResponse {
    access_token: String,
    /// Token lifetime in seconds.
    expires_in: u64,
}

/// Produces authorization material for HTTP requests and streaming channels.
pub struct Authenticator {
    credentials: Credentials,
    iam_url: String,
    http: reqwest::Client,
    iam_token: RwLock<Option<IamToken>>,
}

impl Authenticator {
    pub fn new(credentials: Credentials, iam_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            credentials,
            iam_url: iam_url.into(),
            http,
            iam_token: RwLock::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Value for the `Authorization` header of a REST request.
    pub async fn authorization_header(&self) -> SpeechResult<Zeroizing<String>> {
        match &self.credentials {
            Credentials::Basic { username, password } => {
                let raw = Zeroizing::new(format!("{}:{}", username, password.as_str()));
                Ok(Zeroizing::new(format!(
                    "Basic {}",
                    BASE64.encode(raw.as_bytes())
                )))
            }
            Credentials::Bearer(token) => Ok(Zeroizing::new(format!("Bearer {}", token.as_str()))),
            Credentials::IamApiKey(_) => {
                let token = self.access_token().await?;
                Ok(Zeroizing::new(format!("Bearer {}", token.as_str())))
            }
        }
    }

    /// Credentials for opening a streaming channel.
    pub async fn channel_credentials(&self) -> SpeechResult<ChannelCredentials> {
        match &self.credentials {
            Credentials::IamApiKey(_) => Ok(ChannelCredentials::QueryToken(self.access_token().await?)),
            _ => Ok(ChannelCredentials::Header(self.authorization_header().await?)),
        }
    }

    /// Current IAM access token, fetching a new one when the cached one is stale.
    async fn access_token(&self) -> SpeechResult<Zeroizing<String>> {
        let api_key = match &self.credentials {
            Credentials::IamApiKey(key) => key,
            other => {
                return Err(SpeechError::Configuration(format!(
                    "{} credentials do not use IAM tokens",
                    other.kind()
                )));
            }
        };

        {
            let guard = self.iam_token.read().await;
            if let Some(token) = guard.as_ref()
                && !token.is_expired()
            {
                return Ok(token.access_token.clone());
            }
        }

        let mut guard = self.iam_token.write().await;
        // Another task may have refreshed while we waited for the write lock.
        if let Some(token) = guard.as_ref()
            && !token.is_expired()
        {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch_iam_token(api_key).await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }

    async fn fetch_iam_token(&self, api_key: &str) -> SpeechResult<IamToken> {
        debug!("Requesting IAM token from {}", self.iam_url);

        let encoded_api_key: String = form_urlencoded::byte_serialize(api_key.as_bytes()).collect();
        let body = Zeroizing::new(format!(
            "grant_type=urn:ibm:params:oauth:grant-type:apikey&apikey={encoded_api_key}"
        ));

        let response = self
            .http
            .post(&self.iam_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body.as_str().to_owned())
            .send()
            .await
            .map_err(|e| SpeechError::Authentication(format!("Failed to request IAM token: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SpeechError::Authentication(format!(
                "IAM token request failed ({status}): {body}"
            )));
        }

        let token_response: IamTokenResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Authentication(format!("Failed to parse IAM token: {e}")))?;

        let lifetime = cache_lifetime(token_response.expires_in);
        info!("Obtained IAM token valid for {}s", lifetime.as_secs());

        Ok(IamToken {
            access_token: Zeroizing::new(token_response.access_token),
            expires_at: Instant::now() + lifetime,
        })
    }
}

/// How long a token reported valid for `expires_in` seconds stays cached.
///
/// Never longer than `expires_in`; short-lived tokens keep half their lifetime.
fn cache_lifetime(expires_in: u64) -> Duration {
    let secs = expires_in
        .saturating_sub(TOKEN_SAFETY_MARGIN_SECS)
        .max(expires_in / 2);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_basic_authorization_header() {
        let auth = Authenticator::new(
            Credentials::basic("user", "pass"),
            DEFAULT_IAM_URL,
            reqwest::Client::new(),
        );
        let header = auth.authorization_header().await.unwrap();
        assert_eq!(header.as_str(), "Basic dXNlcjpwYXNz");
        assert!(matches!(
            auth.channel_credentials().await.unwrap(),
            ChannelCredentials::Header(_)
        ));
    }

    #[tokio::test]
    async fn test_iam_token_is_fetched_once_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .and(body_string_contains("apikey=secret-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "iam-token-1",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = Authenticator::new(
            Credentials::iam_api_key("secret-key"),
            format!("{}/identity/token", server.uri()),
            reqwest::Client::new(),
        );

        let first = auth.authorization_header().await.unwrap();
        let second = auth.channel_credentials().await.unwrap();
        assert_eq!(first.as_str(), "Bearer iam-token-1");
        assert_eq!(
            second,
            ChannelCredentials::QueryToken(Zeroizing::new("iam-token-1".to_string()))
        );
    }

    #[test]
    fn test_cache_lifetime_never_exceeds_reported_expiry() {
        assert_eq!(cache_lifetime(3600), Duration::from_secs(3300));
        assert_eq!(cache_lifetime(30), Duration::from_secs(15));
        assert_eq!(cache_lifetime(0), Duration::ZERO);
        for expires_in in [1, 59, 120, 299, 300, 301, 600, 86400] {
            assert!(cache_lifetime(expires_in) <= Duration::from_secs(expires_in));
        }
    }

    #[tokio::test]
    async fn test_short_lived_iam_token_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "short-token",
                "expires_in": 30
            })))
            .expect(2)
            .mount(&server)
            .await;

        let auth = Authenticator::new(
            Credentials::iam_api_key("secret-key"),
            format!("{}/identity/token", server.uri()),
            reqwest::Client::new(),
        );

        auth.authorization_header().await.unwrap();
        let header = auth.authorization_header().await.unwrap();
        assert_eq!(header.as_str(), "Bearer short-token");
    }

    #[tokio::test]
    async fn test_iam_rejection_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad key"))
            .mount(&server)
            .await;

        let auth = Authenticator::new(
            Credentials::iam_api_key("wrong"),
            server.uri(),
            reqwest::Client::new(),
        );
        let err = auth.authorization_header().await.unwrap_err();
        assert!(matches!(err, SpeechError::Authentication(msg) if msg.contains("bad key")));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", Credentials::basic("alice", "hunter2"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
        assert!(Credentials::bearer("").is_empty());
    }
}

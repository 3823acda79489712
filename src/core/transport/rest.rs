//! Authenticated request/response transport.

use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::auth::Authenticator;
use crate::core::messages::ServiceErrorBody;
use crate::errors::{SpeechError, SpeechResult};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("watson-stt-rust/", env!("CARGO_PKG_VERSION"));

/// Header the service uses to correlate a request in its logs.
const TRANSACTION_ID_HEADER: &str = "x-global-transaction-id";

/// Build the shared HTTP client.
pub fn build_client(request_timeout: Duration, connect_timeout: Duration) -> SpeechResult<Client> {
    Client::builder()
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .cookie_store(true)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SpeechError::Configuration(format!("Failed to create HTTP client: {e}")))
}

/// REST side of the service: URL construction, auth and status mapping.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    auth: Arc<Authenticator>,
}

impl HttpTransport {
    pub fn new(client: Client, endpoint: Url, auth: Arc<Authenticator>) -> SpeechResult<Self> {
        if endpoint.cannot_be_a_base() {
            return Err(SpeechError::Configuration(format!(
                "endpoint {endpoint} cannot carry a path"
            )));
        }
        Ok(Self {
            client,
            endpoint,
            auth,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn authenticator(&self) -> &Arc<Authenticator> {
        &self.auth
    }

    /// `{endpoint}/v1/{segments...}`, each segment percent-encoded.
    pub fn api_url(&self, segments: &[&str]) -> SpeechResult<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                SpeechError::Configuration(format!("endpoint {} cannot carry a path", self.endpoint))
            })?;
            path.pop_if_empty().push("v1").extend(segments);
        }
        Ok(url)
    }

    /// Same as [`api_url`](Self::api_url) with the scheme switched to `ws`/`wss`.
    pub fn channel_url(&self, segments: &[&str]) -> SpeechResult<Url> {
        let mut url = self.api_url(segments)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(SpeechError::Configuration(format!(
                    "unsupported endpoint scheme '{other}'"
                )));
            }
        };
        url.set_scheme(scheme).map_err(|_| {
            SpeechError::Configuration(format!("cannot switch {url} to {scheme}"))
        })?;
        Ok(url)
    }

    /// Authenticated request builder.
    pub async fn request(&self, method: Method, url: Url) -> SpeechResult<RequestBuilder> {
        let authorization = self.auth.authorization_header().await?;
        Ok(self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, authorization.as_str()))
    }

    /// Send and fail on any non-success status.
    pub async fn execute(&self, builder: RequestBuilder) -> SpeechResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| SpeechError::service(format!("Request failed: {e}")))?;

        if let Some(id) = response
            .headers()
            .get(TRANSACTION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            debug!("Transaction id: {}", id);
        }

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(Self::error_from_response(status, response).await)
    }

    /// `GET` a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> SpeechResult<T> {
        debug!("GET {}", url);
        let response = self.execute(self.request(Method::GET, url).await?).await?;
        Self::decode(response).await
    }

    /// `POST` with an optional body and decode the JSON answer.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<(Bytes, &str)>,
    ) -> SpeechResult<T> {
        debug!("POST {}", url);
        let mut builder = self.request(Method::POST, url).await?;
        if let Some((payload, content_type)) = body {
            builder = builder.header(CONTENT_TYPE, content_type).body(payload);
        }
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }

    /// `DELETE` and report the status, treating 404 as an answer rather than an error.
    pub async fn delete(&self, url: Url) -> SpeechResult<StatusCode> {
        debug!("DELETE {}", url);
        let response = self
            .request(Method::DELETE, url)
            .await?
            .send()
            .await
            .map_err(|e| SpeechError::service(format!("Request failed: {e}")))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(status);
        }
        Err(Self::error_from_response(status, response).await)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> SpeechResult<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| SpeechError::service(format!("Failed to read response: {e}")))?;
        serde_json::from_slice(&body)
            .map_err(|e| SpeechError::service(format!("Malformed response: {e}")))
    }

    async fn error_from_response(status: StatusCode, response: Response) -> SpeechError {
        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ServiceErrorBody>(&text) {
            Ok(body) => match body.code_description {
                Some(description) => format!("{} ({description})", body.error),
                None => body.error,
            },
            Err(_) if text.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
            Err(_) => text,
        };
        warn!("Service answered {}: {}", status, message);
        SpeechError::from_status(status.as_u16(), message)
    }
}

use std::sync::Arc;

use tracing::info;

use super::models::ModelRef;
use super::options::RecognizeOptions;
use super::recognize::SynchronousRecognizer;
use super::session::SessionManager;
use super::streaming::StreamingRecognizer;
use super::transport::rest::build_client;
use super::transport::{Authenticator, Connector, HttpTransport, WebSocketConnector};
use crate::config::ClientConfig;
use crate::errors::SpeechResult;

/// Entry point to the service.
///
/// Owns one HTTP connection pool and one authenticator; the session manager
/// and both recognizers share them.
#[derive(Clone)]
pub struct SpeechToText {
    sessions: SessionManager,
    recognizer: SynchronousRecognizer,
    streaming: StreamingRecognizer,
    default_model: Option<ModelRef>,
}

impl SpeechToText {
    /// Build a client that streams over WebSocket.
    pub fn new(config: ClientConfig) -> SpeechResult<Self> {
        let connector = Arc::new(WebSocketConnector::new(config.connect_timeout()));
        Self::with_connector(config, connector)
    }

    /// Build a client that opens streaming channels through `connector`.
    pub fn with_connector(config: ClientConfig, connector: Arc<dyn Connector>) -> SpeechResult<Self> {
        config.validate()?;

        let endpoint = config.endpoint()?;
        let credentials = config.credentials()?;
        let client = build_client(config.request_timeout(), config.connect_timeout())?;

        info!(
            endpoint = %endpoint,
            auth = credentials.kind(),
            "Creating speech-to-text client"
        );

        let auth = Arc::new(Authenticator::new(
            credentials,
            config.iam_url.clone(),
            client.clone(),
        ));
        let transport = HttpTransport::new(client, endpoint, auth)?;

        Ok(Self {
            sessions: SessionManager::new(transport.clone()),
            recognizer: SynchronousRecognizer::new(transport.clone()),
            streaming: StreamingRecognizer::new(transport, connector),
            default_model: config.default_model.clone().map(ModelRef::from),
        })
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn recognizer(&self) -> &SynchronousRecognizer {
        &self.recognizer
    }

    pub fn streaming(&self) -> &StreamingRecognizer {
        &self.streaming
    }

    /// Model configured for requests that do not name one.
    pub fn default_model(&self) -> Option<&ModelRef> {
        self.default_model.as_ref()
    }

    /// Empty options carrying the configured default model, if any.
    pub fn default_options(&self) -> RecognizeOptions {
        match &self.default_model {
            Some(model) => RecognizeOptions::new().model(model.clone()),
            None => RecognizeOptions::new(),
        }
    }
}

impl std::fmt::Debug for SpeechToText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechToText")
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}

//! Persistent bidirectional channel used by streaming recognition.
//!
//! [`Connector`] opens a [`Channel`]; the streaming recognizer only talks to
//! these traits, so tests can drive it with an in-memory channel. The
//! production implementation is a WebSocket on `tokio-tungstenite`.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::HeaderValue;
use http::header::AUTHORIZATION;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::{self, error::ProtocolError};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

use super::auth::ChannelCredentials;
use crate::errors::{SpeechError, SpeechResult};

/// Handshake deadline for the WebSocket connector.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// A message on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

#[async_trait]
pub trait Channel: Send {
    async fn send(&mut self, frame: Frame) -> SpeechResult<()>;

    /// Next frame from the peer, `None` once the channel is closed.
    ///
    /// Must be cancellation safe: it is polled inside `tokio::select!`.
    async fn receive(&mut self) -> Option<SpeechResult<Frame>>;

    async fn close(&mut self) -> SpeechResult<()>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn open_channel(
        &self,
        url: Url,
        credentials: ChannelCredentials,
    ) -> SpeechResult<Box<dyn Channel>>;
}

// =============================================================================
// WebSocket
// =============================================================================

pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Channel for WebSocketChannel {
    async fn send(&mut self, frame: Frame) -> SpeechResult<()> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(data) => Message::Binary(data),
        };
        self.stream
            .send(message)
            .await
            .map_err(|e| SpeechError::Disconnected(format!("Failed to send frame: {e}")))
    }

    async fn receive(&mut self) -> Option<SpeechResult<Frame>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Binary(data)) => return Some(Ok(Frame::Binary(data))),
                Ok(Message::Close(frame)) => {
                    debug!("Peer closed channel: {:?}", frame);
                    return None;
                }
                // Pongs are queued by tungstenite itself.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(
                    tungstenite::Error::ConnectionClosed
                    | tungstenite::Error::AlreadyClosed
                    | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake),
                ) => return None,
                Err(e) => return Some(Err(SpeechError::service(format!("WebSocket error: {e}")))),
            }
        }
    }

    async fn close(&mut self) -> SpeechResult<()> {
        match self.stream.close(None).await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(SpeechError::Disconnected(format!(
                "Failed to close channel: {e}"
            ))),
        }
    }
}

/// Opens WebSocket channels with a handshake deadline.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    connect_timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open_channel(
        &self,
        mut url: Url,
        credentials: ChannelCredentials,
    ) -> SpeechResult<Box<dyn Channel>> {
        let header = match &credentials {
            ChannelCredentials::QueryToken(token) => {
                url.query_pairs_mut()
                    .append_pair("access_token", token.as_str());
                None
            }
            ChannelCredentials::Header(value) => Some(
                HeaderValue::from_str(value.as_str()).map_err(|e| {
                    SpeechError::Configuration(format!("Invalid authorization header: {e}"))
                })?,
            ),
        };

        let mut request = url.as_str().into_client_request().map_err(|e| {
            SpeechError::Configuration(format!("Invalid channel URL: {e}"))
        })?;
        if let Some(mut value) = header {
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        debug!("Opening channel to {}{}", url.host_str().unwrap_or(""), url.path());

        let (stream, _response) = match timeout(self.connect_timeout, connect_async(request)).await
        {
            Ok(Ok(result)) => result,
            Ok(Err(tungstenite::Error::Http(response))) => {
                let status = response.status().as_u16();
                let body = response
                    .body()
                    .as_ref()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default();
                warn!("Channel handshake rejected with {}", status);
                return Err(SpeechError::from_status(
                    status,
                    format!("Handshake rejected: {body}"),
                ));
            }
            Ok(Err(e)) => {
                return Err(SpeechError::service(format!("Failed to connect: {e}")));
            }
            Err(_) => {
                return Err(SpeechError::service(format!(
                    "Connection timed out after {} seconds",
                    self.connect_timeout.as_secs()
                )));
            }
        };

        info!("Channel connected");
        Ok(Box::new(WebSocketChannel { stream }))
    }
}

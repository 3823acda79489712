//! Streaming recognition exchange.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  audio_tx (mpsc)  ┌────────────────┐   Frame    ┌─────────┐
//! │ Reader Task  │──────────────────▶│ Exchange Task  │◀──────────▶│ Channel │
//! │ (AsyncRead)  │                   │ (select! loop) │            └─────────┘
//! └──────────────┘                   └───────┬────────┘
//!                                            │ events (mpsc)
//!                                    ┌───────▼──────────┐
//!                                    │ RecognitionStream │──▶ caller / observer
//!                                    └──────────────────┘
//! ```
//!
//! The exchange task owns the channel. It multiplexes audio chunks, server
//! messages and the caller's shutdown signal, and it is the only producer of
//! events, so delivery is strictly ordered.

use bytes::Bytes;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use super::events::RecognitionEvent;
use super::observer::{RecognizeObserver, dispatch};
use super::state::{StateCell, StreamState};
use super::stream::RecognitionStream;
use crate::core::messages::{ServerMessage, StopMessage};
use crate::core::options::RecognizeOptions;
use crate::core::results::RecognitionResults;
use crate::core::session::{SessionLease, SpeechSession};
use crate::core::transport::{Authenticator, Channel, Connector, Frame, HttpTransport};
use crate::errors::{SpeechError, SpeechResult};

// =============================================================================
// Constants
// =============================================================================

/// Bytes read from the audio source per binary frame.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Audio chunks buffered between the reader and the exchange task.
const AUDIO_QUEUE_DEPTH: usize = 32;

/// Events buffered for the caller. The exchange waits when the queue is full.
const EVENT_QUEUE_DEPTH: usize = 256;

// =============================================================================
// StreamingRecognizer
// =============================================================================

/// Runs streaming recognitions over a persistent channel.
///
/// Each call opens exactly one channel and never retries. Failures are
/// reported as events, never returned.
#[derive(Clone)]
pub struct StreamingRecognizer {
    transport: HttpTransport,
    connector: Arc<dyn Connector>,
    chunk_size: usize,
}

impl StreamingRecognizer {
    pub fn new(transport: HttpTransport, connector: Arc<dyn Connector>) -> Self {
        Self {
            transport,
            connector,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Stream `audio` to the service.
    ///
    /// `options` must name a content type. Must be called within a tokio
    /// runtime.
    pub fn recognize<R>(&self, audio: R, options: RecognizeOptions) -> RecognitionStream
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let url = self.channel_url(&options);
        self.start(audio, options, url, None)
    }

    /// Stream `audio` within `session`.
    ///
    /// The session stays claimed until the exchange ends; a deleted or busy
    /// session yields a single `Error` event.
    pub fn recognize_in_session<R>(
        &self,
        session: &SpeechSession,
        audio: R,
        options: RecognizeOptions,
    ) -> RecognitionStream
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let lease = match session.acquire() {
            Ok(lease) => lease,
            Err(e) => return RecognitionStream::failed(e),
        };
        let url = match session.recognize_ws_url() {
            Some(ws) => Url::parse(ws)
                .map_err(|e| SpeechError::service(format!("invalid session channel URL: {e}"))),
            None => self
                .transport
                .channel_url(&["sessions", session.id(), "recognize"]),
        };
        self.start(audio, options, url, Some(lease))
    }

    /// Stream `audio` and feed the events to `observer` on a background task.
    ///
    /// The task finishes after the observer's terminal callback and hands the
    /// observer back.
    pub fn recognize_with_observer<R, O>(
        &self,
        audio: R,
        options: RecognizeOptions,
        observer: O,
    ) -> JoinHandle<O>
    where
        R: AsyncRead + Send + Unpin + 'static,
        O: RecognizeObserver,
    {
        let stream = self.recognize(audio, options);
        tokio::spawn(dispatch(stream, observer))
    }

    fn channel_url(&self, options: &RecognizeOptions) -> SpeechResult<Url> {
        let mut url = self.transport.channel_url(&["recognize"])?;
        if let Some(model) = options.get_model() {
            url.query_pairs_mut().append_pair("model", model);
        }
        Ok(url)
    }

    fn start<R>(
        &self,
        audio: R,
        options: RecognizeOptions,
        url: SpeechResult<Url>,
        lease: Option<SessionLease>,
    ) -> RecognitionStream
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let prepared = options.validate().and_then(|()| {
            let content_type = options
                .get_content_type()
                .ok_or_else(|| {
                    SpeechError::InvalidArgument(
                        "streaming recognition requires a content type".to_string(),
                    )
                })?
                .to_string();
            Ok((url?, content_type))
        });
        let (url, content_type) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return RecognitionStream::failed(e),
        };

        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let state = Arc::new(StateCell::new(StreamState::Connecting));

        let exchange = Exchange {
            connector: Arc::clone(&self.connector),
            auth: Arc::clone(self.transport.authenticator()),
            url,
            start_message: options.build_start_message(&content_type).to_string(),
            chunk_size: self.chunk_size,
            state: Arc::clone(&state),
            events: events_tx,
            lease,
        };

        let handle = tokio::spawn(exchange.run(audio, shutdown_rx));
        RecognitionStream::new(events_rx, shutdown_tx, state, handle)
    }
}

// =============================================================================
// Exchange Task
// =============================================================================

/// What the exchange has seen so far.
#[derive(Default)]
struct Progress {
    accumulated: RecognitionResults,
    audio_bytes: usize,
    stop_sent: bool,
    /// The first `listening` state acknowledges the start action.
    listening_acked: bool,
}

/// How an exchange ended.
enum Outcome {
    Finished(RecognitionResults),
    Failed(SpeechError),
    /// The peer closed the channel before the stop marker went out.
    Disconnected,
    /// The caller closed or dropped its handle.
    Cancelled,
}

struct Exchange {
    connector: Arc<dyn Connector>,
    auth: Arc<Authenticator>,
    url: Url,
    start_message: String,
    chunk_size: usize,
    state: Arc<StateCell>,
    events: mpsc::Sender<RecognitionEvent>,
    lease: Option<SessionLease>,
}

impl Exchange {
    async fn run<R>(mut self, audio: R, mut shutdown_rx: oneshot::Receiver<()>)
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let outcome = self.drive(audio, &mut shutdown_rx).await;

        let (state, event) = match outcome {
            Outcome::Finished(results) => {
                info!(
                    "Streaming recognition finished with {} segments",
                    results.results.len()
                );
                (StreamState::Closed, RecognitionEvent::Final(results))
            }
            Outcome::Failed(e) => {
                error!("Streaming recognition failed: {}", e);
                (StreamState::Errored, RecognitionEvent::Error(e))
            }
            Outcome::Disconnected => {
                warn!("Channel closed before the final result");
                (StreamState::Errored, RecognitionEvent::Disconnected)
            }
            Outcome::Cancelled => {
                info!("Streaming recognition cancelled by caller");
                (StreamState::Closed, RecognitionEvent::Disconnected)
            }
        };

        self.state.advance(state);
        // Release the session before the caller hears the exchange is over.
        drop(self.lease.take());
        self.emit(event).await;
    }

    async fn drive<R>(&mut self, audio: R, shutdown_rx: &mut oneshot::Receiver<()>) -> Outcome
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let credentials = match self.auth.channel_credentials().await {
            Ok(credentials) => credentials,
            Err(e) => return Outcome::Failed(e),
        };

        debug!("Connecting to {}", self.url.path());
        let opened = tokio::select! {
            _ = &mut *shutdown_rx => return Outcome::Cancelled,
            opened = self.connector.open_channel(self.url.clone(), credentials) => opened,
        };
        let mut channel = match opened {
            Ok(channel) => channel,
            Err(e) => return Outcome::Failed(e),
        };

        self.state.advance(StreamState::Connected);
        self.emit(RecognitionEvent::Connected).await;

        let outcome = self.stream(channel.as_mut(), audio, shutdown_rx).await;

        if let Err(e) = channel.close().await {
            debug!("Error closing channel: {}", e);
        }
        outcome
    }

    async fn stream<R>(
        &mut self,
        channel: &mut dyn Channel,
        audio: R,
        shutdown_rx: &mut oneshot::Receiver<()>,
    ) -> Outcome
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        if let Err(e) = channel
            .send(Frame::Text(self.start_message.clone()))
            .await
        {
            return Outcome::Failed(e);
        }
        debug!("Sent start action");
        self.state.advance(StreamState::Streaming);

        let (audio_tx, mut audio_rx) = mpsc::channel(AUDIO_QUEUE_DEPTH);
        let reader = tokio::spawn(read_source(audio, self.chunk_size, audio_tx));

        let outcome = self.pump(channel, &mut audio_rx, shutdown_rx).await;

        reader.abort();
        outcome
    }

    /// Main loop: audio out, messages in, until something ends the exchange.
    async fn pump(
        &mut self,
        channel: &mut dyn Channel,
        audio_rx: &mut mpsc::Receiver<io::Result<Bytes>>,
        shutdown_rx: &mut oneshot::Receiver<()>,
    ) -> Outcome {
        let mut progress = Progress::default();

        loop {
            tokio::select! {
                biased;

                _ = &mut *shutdown_rx => return Outcome::Cancelled,

                chunk = audio_rx.recv(), if !progress.stop_sent => match chunk {
                    Some(Ok(data)) => {
                        progress.audio_bytes += data.len();
                        if let Err(e) = channel.send(Frame::Binary(data)).await {
                            return Outcome::Failed(e);
                        }
                    }
                    Some(Err(e)) => {
                        return Outcome::Failed(SpeechError::InvalidArgument(format!(
                            "failed to read audio source: {e}"
                        )));
                    }
                    None => {
                        if progress.audio_bytes == 0 {
                            return Outcome::Failed(SpeechError::InvalidArgument(
                                "audio source is empty".to_string(),
                            ));
                        }
                        let stop = match serde_json::to_string(&StopMessage::new()) {
                            Ok(stop) => stop,
                            Err(e) => return Outcome::Failed(SpeechError::service(e.to_string())),
                        };
                        if let Err(e) = channel.send(Frame::Text(stop)).await {
                            return Outcome::Failed(e);
                        }
                        debug!(
                            "Audio exhausted after {} bytes, sent stop action",
                            progress.audio_bytes
                        );
                        progress.stop_sent = true;
                        self.state.advance(StreamState::Finishing);
                    }
                },

                frame = channel.receive() => match frame {
                    Some(Ok(Frame::Text(text))) => {
                        if let Some(outcome) = self.on_message(&text, &mut progress).await {
                            return outcome;
                        }
                    }
                    Some(Ok(Frame::Binary(data))) => {
                        debug!("Ignoring {} byte binary frame from service", data.len());
                    }
                    Some(Err(e)) => return Outcome::Failed(e),
                    None if progress.stop_sent => {
                        return Outcome::Finished(std::mem::take(&mut progress.accumulated));
                    }
                    None => return Outcome::Disconnected,
                },
            }
        }
    }

    /// Handle one server message. `Some` ends the exchange.
    async fn on_message(&self, text: &str, progress: &mut Progress) -> Option<Outcome> {
        let message = match ServerMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Unparseable message: {}", text);
                return Some(Outcome::Failed(SpeechError::service(format!(
                    "malformed server message: {e}"
                ))));
            }
        };

        match message {
            ServerMessage::Error(err) => {
                if err.is_inactivity_timeout() {
                    warn!("Service ended recognition for inactivity");
                }
                Some(Outcome::Failed(SpeechError::Service {
                    status: err.code,
                    message: err.error,
                }))
            }
            ServerMessage::Results(results) => {
                for warning in results.warnings.iter().flatten() {
                    warn!("Service warning: {}", warning);
                }
                match progress.accumulated.merge(results.into()) {
                    Ok(()) => {}
                    Err(SpeechError::Service { message, .. }) => {
                        return Some(Outcome::Failed(SpeechError::service(format!(
                            "malformed server message: {message}"
                        ))));
                    }
                    Err(e) => return Some(Outcome::Failed(e)),
                }
                self.emit(RecognitionEvent::Interim(progress.accumulated.clone()))
                    .await;
                None
            }
            ServerMessage::State(state) if state.is_listening() => {
                if !progress.listening_acked {
                    debug!("Service is listening");
                    progress.listening_acked = true;
                    None
                } else if progress.stop_sent {
                    Some(Outcome::Finished(std::mem::take(&mut progress.accumulated)))
                } else {
                    debug!("Service is listening again");
                    None
                }
            }
            ServerMessage::State(state) => {
                debug!("Service state: {}", state.state);
                None
            }
            ServerMessage::Warnings(warnings) => {
                for warning in &warnings.warnings {
                    warn!("Service warning: {}", warning);
                }
                None
            }
        }
    }

    async fn emit(&self, event: RecognitionEvent) {
        if self.events.send(event).await.is_err() {
            debug!("Event receiver dropped");
        }
    }
}

/// Drain `source` into fixed-size chunks until EOF or error.
async fn read_source<R>(mut source: R, chunk_size: usize, tx: mpsc::Sender<io::Result<Bytes>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_size];
    loop {
        match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                break;
            }
        }
    }
}

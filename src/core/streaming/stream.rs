use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::events::RecognitionEvent;
use super::state::{StateCell, StreamState};
use crate::core::results::RecognitionResults;
use crate::errors::{SpeechError, SpeechResult};

/// How long [`RecognitionStream::close`] waits for the exchange task.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Caller's handle on one streaming exchange.
///
/// Events arrive through [`next_event`](Self::next_event) or the
/// [`Stream`] impl. Closing or dropping the handle cancels the exchange and
/// releases its channel.
pub struct RecognitionStream {
    events: mpsc::Receiver<RecognitionEvent>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    state: Arc<StateCell>,
    handle: Option<JoinHandle<()>>,
}

impl RecognitionStream {
    pub(crate) fn new(
        events: mpsc::Receiver<RecognitionEvent>,
        shutdown_tx: oneshot::Sender<()>,
        state: Arc<StateCell>,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            shutdown_tx: Some(shutdown_tx),
            state,
            handle: Some(handle),
        }
    }

    /// An exchange that failed before it could start.
    pub(crate) fn failed(error: SpeechError) -> Self {
        warn!("Streaming recognition not started: {}", error);
        let (tx, events) = mpsc::channel(1);
        // Capacity 1 and a fresh channel: this cannot fail.
        let _ = tx.try_send(RecognitionEvent::Error(error));
        Self {
            events,
            shutdown_tx: None,
            state: Arc::new(StateCell::new(StreamState::Errored)),
            handle: None,
        }
    }

    /// Next event, `None` after the terminal one has been taken.
    pub async fn next_event(&mut self) -> Option<RecognitionEvent> {
        self.events.recv().await
    }

    pub fn state(&self) -> StreamState {
        self.state.get()
    }

    /// Cancel the exchange and wait briefly for the channel to be released.
    ///
    /// Events already queued stay readable; the last one is `Disconnected`
    /// unless the exchange had already ended.
    pub async fn close(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if timeout(CLOSE_TIMEOUT, handle).await.is_err() {
                warn!("Streaming task did not stop within {:?}", CLOSE_TIMEOUT);
            }
        }
    }

    /// Wait for the final result, giving up after `deadline`.
    ///
    /// Interim events are skipped. On timeout the exchange is cancelled.
    pub async fn wait_final(mut self, deadline: Duration) -> SpeechResult<RecognitionResults> {
        let outcome = timeout(deadline, async {
            while let Some(event) = self.next_event().await {
                match event {
                    RecognitionEvent::Final(results) => return Ok(results),
                    RecognitionEvent::Error(error) => return Err(error),
                    RecognitionEvent::Disconnected => {
                        return Err(SpeechError::Disconnected(
                            "channel closed before the final result".to_string(),
                        ));
                    }
                    RecognitionEvent::Connected | RecognitionEvent::Interim(_) => {}
                }
            }
            Err(SpeechError::Disconnected(
                "exchange ended without a terminal event".to_string(),
            ))
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                debug!("No final result within {:?}, cancelling", deadline);
                self.close().await;
                Err(SpeechError::Timeout(format!(
                    "no final result within {} ms",
                    deadline.as_millis()
                )))
            }
        }
    }
}

impl Stream for RecognitionStream {
    type Item = RecognitionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for RecognitionStream {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

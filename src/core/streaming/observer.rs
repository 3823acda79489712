use async_trait::async_trait;
use tracing::debug;

use super::events::RecognitionEvent;
use super::stream::RecognitionStream;
use crate::core::results::RecognitionResults;
use crate::errors::SpeechError;

/// Callback interface for streaming recognition.
///
/// Callbacks run one at a time on a background task, never on the caller's
/// stack. Exactly one of `on_message(_, true)`, `on_error` or
/// `on_disconnected` is invoked per exchange, and it is the last call.
#[async_trait]
pub trait RecognizeObserver: Send + 'static {
    async fn on_connected(&mut self) {}

    async fn on_message(&mut self, results: RecognitionResults, is_final: bool);

    async fn on_error(&mut self, error: SpeechError);

    async fn on_disconnected(&mut self);
}

/// Feed every event of `stream` to `observer` until the terminal one.
pub async fn dispatch<O: RecognizeObserver>(mut stream: RecognitionStream, mut observer: O) -> O {
    while let Some(event) = stream.next_event().await {
        let terminal = event.is_terminal();
        match event {
            RecognitionEvent::Connected => observer.on_connected().await,
            RecognitionEvent::Interim(results) => observer.on_message(results, false).await,
            RecognitionEvent::Final(results) => observer.on_message(results, true).await,
            RecognitionEvent::Error(error) => observer.on_error(error).await,
            RecognitionEvent::Disconnected => observer.on_disconnected().await,
        }
        if terminal {
            debug!("Observer dispatch finished");
            return observer;
        }
    }
    // The exchange task went away without a terminal event.
    observer.on_disconnected().await;
    observer
}

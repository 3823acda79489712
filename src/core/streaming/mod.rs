//! Streaming recognition over a persistent channel.
//!
//! The client sends a `start` action, the audio as binary frames and a `stop`
//! action. The service answers with incremental results and signals the end
//! of recognition with a `listening` state message.
//!
//! Results reach the caller as [`RecognitionEvent`]s on a single ordered
//! queue. [`RecognizeObserver`] adapts that queue to callbacks.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use watson_stt::{AudioFormat, ClientConfig, RecognizeOptions, SpeechToText};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SpeechToText::new(ClientConfig::from_env()?)?;
//! let audio = tokio::fs::File::open("sample1.wav").await?;
//! let options = RecognizeOptions::new()
//!     .continuous(true)
//!     .interim_results(true)
//!     .audio_format(AudioFormat::Wav);
//!
//! let stream = client.streaming().recognize(audio, options);
//! let results = stream.wait_final(Duration::from_secs(10)).await?;
//! println!("{}", results.best_transcript());
//! # Ok(())
//! # }
//! ```

mod events;
mod observer;
mod recognizer;
mod state;
mod stream;


pub use events::RecognitionEvent;
pub use observer::{RecognizeObserver, dispatch};
pub use recognizer::{DEFAULT_CHUNK_SIZE, StreamingRecognizer};
pub use state::StreamState;
pub use stream::RecognitionStream;

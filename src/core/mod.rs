pub mod client;
pub mod messages;
pub mod models;
pub mod options;
pub mod recognize;
pub mod results;
pub mod session;
pub mod streaming;
pub mod transport;

// Re-export commonly used types for convenience
pub use client::SpeechToText;

pub use models::{KnownModel, ModelRef, SessionState, SessionStatus, SpeechModel};

pub use options::{AudioFormat, RecognizeOptions};

pub use results::{
    RecognitionResults, SpeechAlternative, SpeechTimestamp, SpeechWordConfidence, Transcript,
};

pub use recognize::SynchronousRecognizer;

pub use session::{SessionGuard, SessionManager, SpeechSession};

pub use streaming::{
    RecognitionEvent, RecognitionStream, RecognizeObserver, StreamState, StreamingRecognizer,
    dispatch,
};

pub use transport::{Connector, Credentials};

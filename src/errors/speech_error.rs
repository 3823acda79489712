use thiserror::Error;

/// Errors produced by the speech-to-text client.
///
/// Request/response operations return these directly. Streaming recognition
/// never returns them to the caller's stack; they arrive as
/// [`RecognitionEvent::Error`](crate::core::streaming::RecognitionEvent::Error).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpeechError {
    /// The remote call failed, returned malformed data, or returned an
    /// explicit failure response.
    #[error("Service error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Service {
        /// HTTP status when the failure came from a response.
        status: Option<u16>,
        message: String,
    },

    /// The referenced model or session does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Empty or unreadable audio, malformed options, or misuse of a session.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The streaming channel closed before a terminal result was received.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// Credentials were rejected or a token could not be obtained.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Missing or invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A caller-supplied deadline elapsed.
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl SpeechError {
    /// Shorthand for a [`SpeechError::Service`] without an HTTP status.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            status: None,
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status and the service's error text.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Self::NotFound(message),
            401 | 403 => Self::Authentication(message),
            _ => Self::Service {
                status: Some(status),
                message,
            },
        }
    }

    /// True when the remote side reported the failure.
    pub fn is_service_error(&self) -> bool {
        matches!(self, Self::Service { .. } | Self::Authentication(_))
    }
}

/// Result type for speech-to-text operations.
pub type SpeechResult<T> = Result<T, SpeechError>;

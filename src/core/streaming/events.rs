use crate::core::results::RecognitionResults;
use crate::errors::SpeechError;

/// Notification from a streaming exchange, delivered in arrival order.
///
/// Every exchange ends with exactly one terminal event: `Final`, `Error` or
/// `Disconnected`. Nothing follows it.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// The channel handshake succeeded.
    Connected,
    /// Results accumulated so far. Segments flagged final will not change.
    Interim(RecognitionResults),
    /// All results of the exchange.
    Final(RecognitionResults),
    /// The service reported a failure, or the exchange could not proceed.
    Error(SpeechError),
    /// The channel closed before a final result arrived.
    Disconnected,
}

impl RecognitionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Final(_) | Self::Error(_) | Self::Disconnected)
    }

    pub fn results(&self) -> Option<&RecognitionResults> {
        match self {
            Self::Interim(results) | Self::Final(results) => Some(results),
            _ => None,
        }
    }
}

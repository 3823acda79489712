//! Streaming wire messages.
//!
//! Text frames exchanged on the recognize channel. The client sends a `start`
//! action, binary audio frames, and a `stop` action; the service answers with
//! state, results, warning and error messages.

use serde::{Deserialize, Serialize};

use super::results::{RecognitionResults, Transcript};

// =============================================================================
// Server to Client
// =============================================================================

/// Message received from the service on the recognize channel.
///
/// Variants are tried in order, so each one names a field the others lack.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Explicit failure of the exchange.
    Error(ErrorMessage),
    /// Interim or final segments.
    Results(ResultsMessage),
    /// Recognition state change, `listening` marks readiness and end of stream.
    State(StateMessage),
    /// Non-fatal warnings, e.g. ignored parameters.
    Warnings(WarningsMessage),
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, Self::State(s) if s.is_listening())
    }
}

/// Recognition results message.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsMessage {
    pub results: Vec<Transcript>,
    #[serde(default)]
    pub result_index: usize,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

impl From<ResultsMessage> for RecognitionResults {
    fn from(msg: ResultsMessage) -> Self {
        Self {
            results: msg.results,
            result_index: msg.result_index,
        }
    }
}

/// State message.
#[derive(Debug, Clone, Deserialize)]
pub struct StateMessage {
    pub state: String,
}

impl StateMessage {
    pub fn is_listening(&self) -> bool {
        self.state.eq_ignore_ascii_case("listening")
    }
}

/// Warnings message.
#[derive(Debug, Clone, Deserialize)]
pub struct WarningsMessage {
    pub warnings: Vec<String>,
}

/// Error message.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
    #[serde(default)]
    pub code: Option<u16>,
}

impl ErrorMessage {
    /// Inactivity and no-speech timeouts end the exchange from the server side.
    pub fn is_inactivity_timeout(&self) -> bool {
        self.error.contains("inactivity")
            || self.error.contains("No speech detected")
            || self.code == Some(408)
    }
}

// =============================================================================
// Client to Server
// =============================================================================

/// End-of-stream marker sent after the last audio frame.
#[derive(Debug, Clone, Serialize)]
pub struct StopMessage {
    pub action: &'static str,
}

impl StopMessage {
    pub fn new() -> Self {
        Self { action: "stop" }
    }
}

impl Default for StopMessage {
    fn default() -> Self {
        Self::new()
    }
}

/// Error body returned by the REST interface.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServiceErrorBody {
    pub error: String,
    #[serde(default)]
    pub code_description: Option<String>,
}

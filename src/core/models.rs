//! Acoustic model catalogue and session status types.
//!
//! The service describes every model it can recognize with as a
//! [`SpeechModel`]. [`KnownModel`] enumerates the well-known catalogue entries
//! so callers can pin a session without spelling the model name out.

use serde::{Deserialize, Serialize};

// =============================================================================
// Model Descriptors
// =============================================================================

/// Descriptor for an acoustic model available on the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechModel {
    /// Model name, e.g. `en-US_BroadbandModel`.
    pub name: String,
    /// Sample rate in Hz the model targets.
    pub rate: u32,
    /// Language tag of the model.
    #[serde(default)]
    pub language: Option<String>,
    /// Human readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// URI of the model resource.
    #[serde(default)]
    pub url: Option<String>,
    /// URI for creating sessions bound to this model.
    #[serde(default)]
    pub sessions: Option<String>,
}

/// Envelope returned by `GET /v1/models`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SpeechModelSet {
    #[serde(default)]
    pub models: Vec<SpeechModel>,
}

/// Well-known acoustic models.
///
/// Broadband models target 16 kHz audio, narrowband models telephone audio
/// at 8 kHz.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    EnUsBroadband,
    EnUsNarrowband,
    EnUkBroadband,
    EnUkNarrowband,
    EsEsBroadband,
    EsEsNarrowband,
    FrFrBroadband,
    ArArBroadband,
    JaJpBroadband,
    JaJpNarrowband,
    PtBrBroadband,
    PtBrNarrowband,
    ZhCnBroadband,
    ZhCnNarrowband,
}

impl KnownModel {
    /// Every entry, in catalogue order.
    pub const ALL: [KnownModel; 14] = [
        Self::EnUsBroadband,
        Self::EnUsNarrowband,
        Self::EnUkBroadband,
        Self::EnUkNarrowband,
        Self::EsEsBroadband,
        Self::EsEsNarrowband,
        Self::FrFrBroadband,
        Self::ArArBroadband,
        Self::JaJpBroadband,
        Self::JaJpNarrowband,
        Self::PtBrBroadband,
        Self::PtBrNarrowband,
        Self::ZhCnBroadband,
        Self::ZhCnNarrowband,
    ];

    /// Model identifier used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnUsBroadband => "en-US_BroadbandModel",
            Self::EnUsNarrowband => "en-US_NarrowbandModel",
            Self::EnUkBroadband => "en-UK_BroadbandModel",
            Self::EnUkNarrowband => "en-UK_NarrowbandModel",
            Self::EsEsBroadband => "es-ES_BroadbandModel",
            Self::EsEsNarrowband => "es-ES_NarrowbandModel",
            Self::FrFrBroadband => "fr-FR_BroadbandModel",
            Self::ArArBroadband => "ar-AR_BroadbandModel",
            Self::JaJpBroadband => "ja-JP_BroadbandModel",
            Self::JaJpNarrowband => "ja-JP_NarrowbandModel",
            Self::PtBrBroadband => "pt-BR_BroadbandModel",
            Self::PtBrNarrowband => "pt-BR_NarrowbandModel",
            Self::ZhCnBroadband => "zh-CN_BroadbandModel",
            Self::ZhCnNarrowband => "zh-CN_NarrowbandModel",
        }
    }

    /// Sample rate the model is trained for.
    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::EnUsNarrowband
            | Self::EnUkNarrowband
            | Self::EsEsNarrowband
            | Self::JaJpNarrowband
            | Self::PtBrNarrowband
            | Self::ZhCnNarrowband => 8000,
            _ => 16000,
        }
    }

    /// Look up a catalogue entry by its API name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|m| m.as_str() == name).cloned()
    }
}

impl Default for KnownModel {
    fn default() -> Self {
        Self::EnUsBroadband
    }
}

impl std::fmt::Display for KnownModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A model named either by catalogue entry or by free-form name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRef {
    Known(KnownModel),
    Named(String),
}

impl ModelRef {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(model) => model.as_str(),
            Self::Named(name) => name,
        }
    }
}

impl From<KnownModel> for ModelRef {
    fn from(model: KnownModel) -> Self {
        Self::Known(model)
    }
}

impl From<&str> for ModelRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ModelRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

// =============================================================================
// Session Status
// =============================================================================

/// Recognition state of a session as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Initialized,
    Listening,
    Ready,
    Recognizing,
    Closed,
    /// A state this client does not know about.
    Other(String),
}

impl SessionState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Initialized => "initialized",
            Self::Listening => "listening",
            Self::Ready => "ready",
            Self::Recognizing => "recognizing",
            Self::Closed => "closed",
            Self::Other(state) => state,
        }
    }
}

impl From<&str> for SessionState {
    fn from(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "initialized" | "initializing" => Self::Initialized,
            "listening" => Self::Listening,
            "ready" => Self::Ready,
            "recognizing" => Self::Recognizing,
            "closed" => Self::Closed,
            _ => Self::Other(state.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for SessionState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Model binding and state of a recognition session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionStatus {
    /// Model the session is bound to. The service may report a model URI.
    pub model: String,
    pub state: SessionState,
    #[serde(default)]
    pub recognize: Option<String>,
    #[serde(default, rename = "recognizeWS")]
    pub recognize_ws: Option<String>,
    #[serde(default)]
    pub observe_result: Option<String>,
}

impl SessionStatus {
    /// Bare model name, stripping a URI prefix if the service sent one.
    pub fn model_name(&self) -> &str {
        self.model
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.model)
    }
}

/// Envelope returned by `GET /v1/sessions/{id}/recognize`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionStatusEnvelope {
    pub session: SessionStatus,
}

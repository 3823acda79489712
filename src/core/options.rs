//! Recognition options and audio content types.
//!
//! [`RecognizeOptions`] is a builder; every setting is optional and only the
//! settings that were set are sent to the service. The same options drive the
//! query string of a synchronous request and the `start` action of a
//! streaming exchange.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::models::ModelRef;
use crate::errors::{SpeechError, SpeechResult};

// =============================================================================
// Content Types
// =============================================================================

/// Audio formats accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudioFormat {
    /// WAV container.
    Wav,
    /// FLAC encoded audio.
    Flac,
    /// Opus in an OGG container.
    OggOpus,
    /// Raw PCM 16-bit little-endian mono at the given rate.
    L16 { rate: u32 },
    /// Mu-law encoded audio at the given rate.
    Mulaw { rate: u32 },
}

impl AudioFormat {
    /// MIME string for the `Content-Type` header and the `start` action.
    pub fn content_type(&self) -> String {
        match self {
            Self::Wav => "audio/wav".to_string(),
            Self::Flac => "audio/flac".to_string(),
            Self::OggOpus => "audio/ogg;codecs=opus".to_string(),
            Self::L16 { rate } => format!("audio/l16;rate={rate};channels=1"),
            Self::Mulaw { rate } => format!("audio/mulaw;rate={rate}"),
        }
    }

    /// Infer the format from a file extension.
    ///
    /// Raw PCM is assumed to be 16 kHz and mu-law 8 kHz; pass an explicit
    /// content type for anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "wav" => Some(Self::Wav),
            "flac" => Some(Self::Flac),
            "ogg" | "opus" => Some(Self::OggOpus),
            "raw" | "pcm" | "l16" => Some(Self::L16 { rate: 16000 }),
            "ulaw" | "mulaw" | "au" => Some(Self::Mulaw { rate: 8000 }),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content_type())
    }
}

// =============================================================================
// Recognize Options
// =============================================================================

/// Options for a recognition request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognizeOptions {
    continuous: Option<bool>,
    interim_results: Option<bool>,
    timestamps: Option<bool>,
    word_confidence: Option<bool>,
    content_type: Option<String>,
    model: Option<ModelRef>,
    max_alternatives: Option<u32>,
    inactivity_timeout: Option<i32>,
    profanity_filter: Option<bool>,
    smart_formatting: Option<bool>,
    keywords: Vec<String>,
    keywords_threshold: Option<f32>,
}

impl RecognizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep recognizing across pauses instead of stopping at the first one.
    pub fn continuous(mut self, enabled: bool) -> Self {
        self.continuous = Some(enabled);
        self
    }

    /// Deliver provisional results while streaming.
    pub fn interim_results(mut self, enabled: bool) -> Self {
        self.interim_results = Some(enabled);
        self
    }

    /// Request per-word start and end times.
    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = Some(enabled);
        self
    }

    /// Request per-word confidence scores.
    pub fn word_confidence(mut self, enabled: bool) -> Self {
        self.word_confidence = Some(enabled);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn audio_format(self, format: AudioFormat) -> Self {
        self.content_type(format.content_type())
    }

    pub fn model(mut self, model: impl Into<ModelRef>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_alternatives(mut self, count: u32) -> Self {
        self.max_alternatives = Some(count);
        self
    }

    /// Seconds of silence after which the service ends recognition; -1 disables.
    pub fn inactivity_timeout(mut self, seconds: i32) -> Self {
        self.inactivity_timeout = Some(seconds);
        self
    }

    pub fn profanity_filter(mut self, enabled: bool) -> Self {
        self.profanity_filter = Some(enabled);
        self
    }

    pub fn smart_formatting(mut self, enabled: bool) -> Self {
        self.smart_formatting = Some(enabled);
        self
    }

    /// Spot keywords with a confidence threshold in `(0.0, 1.0]`.
    pub fn keywords<I, S>(mut self, keywords: I, threshold: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self.keywords_threshold = Some(threshold);
        self
    }

    pub fn get_content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn get_model(&self) -> Option<&str> {
        self.model.as_ref().map(ModelRef::as_str)
    }

    pub fn is_interim_results(&self) -> bool {
        self.interim_results.unwrap_or(false)
    }

    /// Reject option combinations the service would refuse.
    pub fn validate(&self) -> SpeechResult<()> {
        if let Some(ct) = &self.content_type
            && ct.trim().is_empty()
        {
            return Err(SpeechError::InvalidArgument(
                "content type must not be empty".to_string(),
            ));
        }
        if let Some(model) = &self.model
            && model.as_str().trim().is_empty()
        {
            return Err(SpeechError::InvalidArgument(
                "model name must not be empty".to_string(),
            ));
        }
        if self.max_alternatives == Some(0) {
            return Err(SpeechError::InvalidArgument(
                "max_alternatives must be at least 1".to_string(),
            ));
        }
        if let Some(timeout) = self.inactivity_timeout
            && timeout < -1
        {
            return Err(SpeechError::InvalidArgument(format!(
                "inactivity_timeout must be -1 or non-negative, got {timeout}"
            )));
        }
        if !self.keywords.is_empty() {
            match self.keywords_threshold {
                Some(t) if t > 0.0 && t <= 1.0 => {}
                other => {
                    return Err(SpeechError::InvalidArgument(format!(
                        "keywords_threshold must be in (0.0, 1.0], got {other:?}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Query parameters for a synchronous recognize request.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(model) = self.get_model() {
            pairs.push(("model", model.to_string()));
        }
        if let Some(v) = self.continuous {
            pairs.push(("continuous", v.to_string()));
        }
        if let Some(v) = self.timestamps {
            pairs.push(("timestamps", v.to_string()));
        }
        if let Some(v) = self.word_confidence {
            pairs.push(("word_confidence", v.to_string()));
        }
        if let Some(v) = self.max_alternatives {
            pairs.push(("max_alternatives", v.to_string()));
        }
        if let Some(v) = self.inactivity_timeout {
            pairs.push(("inactivity_timeout", v.to_string()));
        }
        if let Some(v) = self.profanity_filter {
            pairs.push(("profanity_filter", v.to_string()));
        }
        if let Some(v) = self.smart_formatting {
            pairs.push(("smart_formatting", v.to_string()));
        }
        if !self.keywords.is_empty() {
            pairs.push(("keywords", self.keywords.join(",")));
            if let Some(t) = self.keywords_threshold {
                pairs.push(("keywords_threshold", t.to_string()));
            }
        }
        pairs
    }

    /// The `start` action that opens a streaming exchange.
    pub fn build_start_message(&self, content_type: &str) -> serde_json::Value {
        let mut msg = serde_json::json!({
            "action": "start",
            "content-type": content_type,
        });

        if let Some(v) = self.continuous {
            msg["continuous"] = serde_json::json!(v);
        }
        if let Some(v) = self.interim_results {
            msg["interim_results"] = serde_json::json!(v);
        }
        if let Some(v) = self.timestamps {
            msg["timestamps"] = serde_json::json!(v);
        }
        if let Some(v) = self.word_confidence {
            msg["word_confidence"] = serde_json::json!(v);
        }
        if let Some(v) = self.max_alternatives {
            msg["max_alternatives"] = serde_json::json!(v);
        }
        if let Some(v) = self.inactivity_timeout {
            msg["inactivity_timeout"] = serde_json::json!(v);
        }
        if let Some(v) = self.profanity_filter {
            msg["profanity_filter"] = serde_json::json!(v);
        }
        if let Some(v) = self.smart_formatting {
            msg["smart_formatting"] = serde_json::json!(v);
        }
        if !self.keywords.is_empty() {
            msg["keywords"] = serde_json::json!(self.keywords);
            if let Some(t) = self.keywords_threshold {
                msg["keywords_threshold"] = serde_json::json!(t);
            }
        }

        msg
    }
}

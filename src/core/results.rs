//! Recognition result types.
//!
//! The service reports results as an ordered list of segments. Each segment
//! carries ranked alternatives; word timings and confidences are only present
//! when requested through [`RecognizeOptions`](crate::core::options::RecognizeOptions).

use serde::{Deserialize, Serialize};

use crate::errors::{SpeechError, SpeechResult};

/// Word timing `[word, start, end]` in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechTimestamp(pub String, pub f64, pub f64);

impl SpeechTimestamp {
    pub fn word(&self) -> &str {
        &self.0
    }

    pub fn start(&self) -> f64 {
        self.1
    }

    pub fn end(&self) -> f64 {
        self.2
    }
}

/// Word confidence `[word, confidence]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechWordConfidence(pub String, pub f64);

impl SpeechWordConfidence {
    pub fn word(&self) -> &str {
        &self.0
    }

    pub fn confidence(&self) -> f64 {
        self.1
    }
}

/// One transcription hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechAlternative {
    pub transcript: String,
    /// Only reported for final segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Vec<SpeechTimestamp>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_confidence: Option<Vec<SpeechWordConfidence>>,
}

/// A recognized segment with its ranked alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Whether the segment is settled and will not be revised.
    #[serde(rename = "final", default)]
    pub is_final: bool,
    #[serde(default)]
    pub alternatives: Vec<SpeechAlternative>,
}

impl Transcript {
    /// Highest ranked alternative.
    pub fn best(&self) -> Option<&SpeechAlternative> {
        self.alternatives.first()
    }
}

/// Ordered recognition results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResults {
    #[serde(default)]
    pub results: Vec<Transcript>,
    /// Position of `results[0]` within the whole recognition.
    #[serde(default)]
    pub result_index: usize,
}

impl RecognitionResults {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True when every segment is final.
    pub fn is_final(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.is_final)
    }

    /// Best transcripts of all segments joined with a space.
    pub fn best_transcript(&self) -> String {
        self.results
            .iter()
            .filter_map(|r| r.best())
            .map(|alt| alt.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fold an incremental update into the accumulated results.
    ///
    /// Segments of `update` start at `update.result_index`; an existing segment
    /// at the same position is superseded, later ones are appended. An index
    /// past the end of the accumulated segments is rejected and leaves `self`
    /// untouched.
    pub fn merge(&mut self, update: RecognitionResults) -> SpeechResult<()> {
        let base = update.result_index;
        if base > self.results.len() {
            return Err(SpeechError::service(format!(
                "result_index {base} skips past {} accumulated segments",
                self.results.len()
            )));
        }
        for (offset, segment) in update.results.into_iter().enumerate() {
            let position = base + offset;
            if position < self.results.len() {
                self.results[position] = segment;
            } else {
                self.results.push(segment);
            }
        }
        self.result_index = 0;
        Ok(())
    }
}

use bytes::Bytes;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

use crate::core::options::{AudioFormat, RecognizeOptions};
use crate::core::results::RecognitionResults;
use crate::core::session::SpeechSession;
use crate::core::transport::HttpTransport;
use crate::errors::{SpeechError, SpeechResult};

/// Recognizes a complete audio payload in one request.
#[derive(Clone)]
pub struct SynchronousRecognizer {
    transport: HttpTransport,
}

impl SynchronousRecognizer {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Send `audio` and wait for the aggregated result.
    ///
    /// The content type comes from `content_type` or, failing that, from the
    /// options. Either one is required.
    pub async fn recognize(
        &self,
        audio: Bytes,
        content_type: Option<&str>,
        options: Option<RecognizeOptions>,
    ) -> SpeechResult<RecognitionResults> {
        let options = options.unwrap_or_default();
        let content_type = prepare(&audio, content_type, &options)?;
        let url = self.url_with_options(&["recognize"], &options)?;
        self.send(url, audio, &content_type).await
    }

    /// Read `path` and recognize its contents.
    ///
    /// The content type is inferred from the file extension unless the
    /// options name one.
    pub async fn recognize_file(
        &self,
        path: impl AsRef<Path>,
        options: Option<RecognizeOptions>,
    ) -> SpeechResult<RecognitionResults> {
        let path = path.as_ref();
        let audio = read_audio(path).await?;
        let options = options.unwrap_or_default();
        let content_type = match options.get_content_type() {
            Some(ct) => ct.to_string(),
            None => AudioFormat::from_path(path)
                .map(|f| f.content_type())
                .ok_or_else(|| {
                    SpeechError::InvalidArgument(format!(
                        "cannot infer content type of {}",
                        path.display()
                    ))
                })?,
        };
        self.recognize(audio, Some(&content_type), Some(options)).await
    }

    /// Recognize within an existing session.
    ///
    /// Fails if the session was deleted or already has a recognition in
    /// progress.
    pub async fn recognize_in_session(
        &self,
        session: &SpeechSession,
        audio: Bytes,
        content_type: Option<&str>,
        options: Option<RecognizeOptions>,
    ) -> SpeechResult<RecognitionResults> {
        let options = options.unwrap_or_default();
        let content_type = prepare(&audio, content_type, &options)?;
        let _lease = session.acquire()?;
        let url = match session.recognize_url() {
            Some(endpoint) => {
                let url = Url::parse(endpoint).map_err(|e| {
                    SpeechError::service(format!("invalid session recognize URL: {e}"))
                })?;
                with_query(url, &options)
            }
            None => self.url_with_options(&["sessions", session.id(), "recognize"], &options)?,
        };
        self.send(url, audio, &content_type).await
    }

    fn url_with_options(&self, segments: &[&str], options: &RecognizeOptions) -> SpeechResult<Url> {
        Ok(with_query(self.transport.api_url(segments)?, options))
    }

    async fn send(
        &self,
        url: Url,
        audio: Bytes,
        content_type: &str,
    ) -> SpeechResult<RecognitionResults> {
        info!(
            "Recognizing {} bytes of {} audio",
            audio.len(),
            content_type
        );
        let results: RecognitionResults = self
            .transport
            .post_json(url, Some((audio, content_type)))
            .await?;
        debug!(
            "Recognized {} segments: {}",
            results.results.len(),
            results.best_transcript()
        );
        Ok(results)
    }
}

fn with_query(mut url: Url, options: &RecognizeOptions) -> Url {
    let pairs = options.query_pairs();
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}

/// Validate the request and settle on a content type.
fn prepare(
    audio: &Bytes,
    content_type: Option<&str>,
    options: &RecognizeOptions,
) -> SpeechResult<String> {
    if audio.is_empty() {
        return Err(SpeechError::InvalidArgument(
            "audio payload is empty".to_string(),
        ));
    }
    options.validate()?;
    content_type
        .or_else(|| options.get_content_type())
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SpeechError::InvalidArgument("content type is required".to_string()))
}

async fn read_audio(path: &Path) -> SpeechResult<Bytes> {
    tokio::fs::read(path).await.map(Bytes::from).map_err(|e| {
        SpeechError::InvalidArgument(format!("cannot read {}: {e}", path.display()))
    })
}

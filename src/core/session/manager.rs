use tracing::{debug, info, warn};

use super::guard::SessionGuard;
use super::handle::{CreatedSession, SpeechSession};
use crate::core::models::{ModelRef, SessionStatus, SessionStatusEnvelope, SpeechModel, SpeechModelSet};
use crate::core::transport::HttpTransport;
use crate::errors::{SpeechError, SpeechResult};

/// Session lifecycle and model catalogue operations.
#[derive(Clone)]
pub struct SessionManager {
    transport: HttpTransport,
}

impl SessionManager {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Create a session on the service's default model.
    pub async fn create_session(&self) -> SpeechResult<SpeechSession> {
        self.create(None).await
    }

    /// Create a session pinned to `model`.
    pub async fn create_session_with_model(
        &self,
        model: impl Into<ModelRef>,
    ) -> SpeechResult<SpeechSession> {
        self.create(Some(model.into())).await
    }

    /// Create a session that is deleted when the guard is closed or dropped.
    pub async fn create_guarded(&self, model: Option<ModelRef>) -> SpeechResult<SessionGuard> {
        let session = self.create(model).await?;
        Ok(SessionGuard::new(self.clone(), session))
    }

    async fn create(&self, model: Option<ModelRef>) -> SpeechResult<SpeechSession> {
        let mut url = self.transport.api_url(&["sessions"])?;
        if let Some(model) = &model {
            if model.as_str().trim().is_empty() {
                return Err(SpeechError::InvalidArgument(
                    "model name must not be empty".to_string(),
                ));
            }
            url.query_pairs_mut().append_pair("model", model.as_str());
        }

        let created: CreatedSession = self.transport.post_json(url, None).await?;
        if created.session_id.trim().is_empty() {
            return Err(SpeechError::service("service returned no session id"));
        }

        info!("Created session {}", created.session_id);
        Ok(SpeechSession::new(
            created,
            model.map(|m| m.as_str().to_string()),
        ))
    }

    /// Release a session on the service.
    ///
    /// Deleting a session twice is a no-op, and a session the service already
    /// forgot (404) counts as deleted.
    pub async fn delete_session(&self, session: &SpeechSession) -> SpeechResult<()> {
        if !session.mark_deleted() {
            debug!("Session {} already deleted", session.id());
            return Ok(());
        }

        let result = async {
            let url = self.transport.api_url(&["sessions", session.id()])?;
            self.transport.delete(url).await
        }
        .await;

        match result {
            Ok(status) => {
                if status == reqwest::StatusCode::NOT_FOUND {
                    debug!("Session {} was already gone on the service", session.id());
                } else {
                    info!("Deleted session {}", session.id());
                }
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete session {}: {}", session.id(), e);
                session.unmark_deleted();
                Err(e)
            }
        }
    }

    /// Model binding and recognition state of a session.
    pub async fn get_recognition_status(
        &self,
        session: &SpeechSession,
    ) -> SpeechResult<SessionStatus> {
        session.ensure_active()?;
        let url = self
            .transport
            .api_url(&["sessions", session.id(), "recognize"])?;
        let envelope: SessionStatusEnvelope = self.transport.get_json(url).await?;
        debug!(
            "Session {} is {} on {}",
            session.id(),
            envelope.session.state,
            envelope.session.model_name()
        );
        Ok(envelope.session)
    }

    /// Every model the service offers.
    pub async fn list_models(&self) -> SpeechResult<Vec<SpeechModel>> {
        let url = self.transport.api_url(&["models"])?;
        let set: SpeechModelSet = self.transport.get_json(url).await?;
        debug!("Service offers {} models", set.models.len());
        Ok(set.models)
    }

    /// Descriptor of the model named exactly `name`.
    pub async fn get_model(&self, name: &str) -> SpeechResult<SpeechModel> {
        if name.trim().is_empty() {
            return Err(SpeechError::NotFound("model name is empty".to_string()));
        }
        let url = self.transport.api_url(&["models", name])?;
        self.transport.get_json(url).await
    }
}

use std::ops::Deref;
use tracing::{debug, warn};

use super::handle::SpeechSession;
use super::manager::SessionManager;
use crate::errors::SpeechResult;

/// Deletes its session on every exit path.
///
/// Prefer [`close`](Self::close), which reports the outcome. Dropping an
/// unclosed guard spawns a best-effort delete on the current runtime.
pub struct SessionGuard {
    manager: SessionManager,
    session: Option<SpeechSession>,
}

impl SessionGuard {
    pub fn new(manager: SessionManager, session: SpeechSession) -> Self {
        Self {
            manager,
            session: Some(session),
        }
    }

    pub fn session(&self) -> &SpeechSession {
        // Only `close` and `drop` take the session, both consume the guard.
        self.session
            .as_ref()
            .unwrap_or_else(|| unreachable!("session taken before guard was consumed"))
    }

    /// Delete the session and wait for the service to confirm.
    pub async fn close(mut self) -> SpeechResult<()> {
        match self.session.take() {
            Some(session) => self.manager.delete_session(&session).await,
            None => Ok(()),
        }
    }
}

impl Deref for SessionGuard {
    type Target = SpeechSession;

    fn deref(&self) -> &SpeechSession {
        self.session()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if session.is_deleted() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let manager = self.manager.clone();
                debug!("Deleting session {} from guard drop", session.id());
                handle.spawn(async move {
                    if let Err(e) = manager.delete_session(&session).await {
                        warn!("Best-effort delete of session {} failed: {}", session.id(), e);
                    }
                });
            }
            Err(_) => {
                warn!(
                    "Session {} leaked: guard dropped outside a tokio runtime",
                    session.id()
                );
            }
        }
    }
}

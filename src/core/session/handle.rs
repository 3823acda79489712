use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{SpeechError, SpeechResult};

/// Server-side recognition session.
///
/// Owned by the caller from creation until it is deleted through
/// [`SessionManager::delete_session`](super::SessionManager::delete_session).
/// A deleted session can still be inspected but not used for recognition.
#[derive(Debug)]
pub struct SpeechSession {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    id: String,
    model: Option<String>,
    recognize_url: Option<String>,
    recognize_ws_url: Option<String>,
    deleted: AtomicBool,
    busy: AtomicBool,
}

impl SpeechSession {
    pub(crate) fn new(created: CreatedSession, model: Option<String>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: created.session_id,
                model,
                recognize_url: created.recognize,
                recognize_ws_url: created.recognize_ws,
                deleted: AtomicBool::new(false),
                busy: AtomicBool::new(false),
            }),
        }
    }

    /// Opaque server-assigned identifier.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Model the session was pinned to at creation, if any.
    pub fn model(&self) -> Option<&str> {
        self.inner.model.as_deref()
    }

    pub fn recognize_url(&self) -> Option<&str> {
        self.inner.recognize_url.as_deref()
    }

    pub fn recognize_ws_url(&self) -> Option<&str> {
        self.inner.recognize_ws_url.as_deref()
    }

    pub fn is_deleted(&self) -> bool {
        self.inner.deleted.load(Ordering::Acquire)
    }

    /// True while a recognition call holds the session.
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    /// Returns false if the session was already marked deleted.
    pub(crate) fn mark_deleted(&self) -> bool {
        !self.inner.deleted.swap(true, Ordering::AcqRel)
    }

    /// Undo [`mark_deleted`](Self::mark_deleted) after a failed delete so it can be retried.
    pub(crate) fn unmark_deleted(&self) {
        self.inner.deleted.store(false, Ordering::Release);
    }

    pub(crate) fn ensure_active(&self) -> SpeechResult<()> {
        if self.is_deleted() {
            return Err(SpeechError::InvalidArgument(format!(
                "session {} has been deleted",
                self.inner.id
            )));
        }
        Ok(())
    }

    /// Claim the session for one recognition exchange.
    pub(crate) fn acquire(&self) -> SpeechResult<SessionLease> {
        self.ensure_active()?;
        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SpeechError::InvalidArgument(format!(
                "session {} already has a recognition in progress",
                self.inner.id
            )));
        }
        Ok(SessionLease {
            inner: Arc::clone(&self.inner),
        })
    }
}

/// Exclusive use of a session for one exchange; released on drop.
#[derive(Debug)]
pub(crate) struct SessionLease {
    inner: Arc<SessionInner>,
}

impl SessionLease {
    pub fn id(&self) -> &str {
        &self.inner.id
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.inner.busy.store(false, Ordering::Release);
    }
}

/// Body of `POST /v1/sessions`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreatedSession {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub recognize: Option<String>,
    #[serde(default, rename = "recognizeWS")]
    pub recognize_ws: Option<String>,
}

//! Server-side recognition sessions and the model catalogue.
//!
//! A session binds a client to one acoustic model on the service. It must be
//! deleted once per creation, including when its use failed; wrap it in a
//! [`SessionGuard`] to get that on every exit path.
//!
//! # Example
//!
//! ```rust,no_run
//! use watson_stt::{ClientConfig, KnownModel, SpeechToText};
//!
//! # async fn run() -> Result<(), watson_stt::SpeechError> {
//! let client = SpeechToText::new(ClientConfig::from_env()?)?;
//! let sessions = client.sessions();
//!
//! let session = sessions.create_session_with_model(KnownModel::EnUsBroadband).await?;
//! let status = sessions.get_recognition_status(&session).await;
//! sessions.delete_session(&session).await?;
//! println!("{:?}", status?.state);
//! # Ok(())
//! # }
//! ```

mod guard;
mod handle;
mod manager;


pub use guard::SessionGuard;
pub use handle::SpeechSession;
pub(crate) use handle::SessionLease;
#[cfg(test)]
pub(crate) use handle::CreatedSession;
pub use manager::SessionManager;

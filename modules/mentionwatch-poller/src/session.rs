//! Session acquisition: restore → validate → login → persist.

use tracing::{info, warn};

use mentionwatch_common::MentionWatchError;

use crate::session_store::{SessionStore, SessionStoreError};
use crate::traits::SearchTransport;

/// Owns the transport until a usable session is established.
///
/// `establish` consumes the manager and returns the authenticated
/// transport, so an unauthenticated client is unreachable by
/// construction.
pub struct SessionManager<T, S> {
    transport: T,
    store: S,
    username: String,
    password: String,
    verification_code: String,
}

impl<T: SearchTransport, S: SessionStore> SessionManager<T, S> {
    pub fn new(
        transport: T,
        store: S,
        username: impl Into<String>,
        password: impl Into<String>,
        verification_code: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            username: username.into(),
            password: password.into(),
            verification_code: verification_code.into(),
        }
    }

    /// Restore a persisted session if one is present and still live,
    /// otherwise log in fresh and persist the new credential. Login
    /// failure is fatal: without a session there is nothing to poll.
    pub async fn establish(self) -> Result<T, MentionWatchError> {
        match self
            .store
            .load(&self.username, &self.verification_code)
            .await
        {
            Ok(tokens) => {
                self.transport.install_session_tokens(tokens);
                if self
                    .transport
                    .is_logged_in()
                    .await
                    .map_err(MentionWatchError::Anyhow)?
                {
                    info!(account = self.username.as_str(), "Restored saved session");
                    return Ok(self.transport);
                }
                info!(
                    account = self.username.as_str(),
                    "Saved session no longer accepted, logging in fresh"
                );
            }
            Err(SessionStoreError::NotFound(_)) => {
                info!(account = self.username.as_str(), "No saved session, logging in fresh");
            }
            // A corrupt or unreadable cache is treated as absent. It
            // gets overwritten with a valid credential below.
            Err(e) => {
                warn!(error = %e, "Session cache unreadable, logging in fresh");
            }
        }

        self.transport
            .login(&self.username, &self.password, &self.verification_code)
            .await
            .map_err(|e| MentionWatchError::Auth(e.to_string()))?;

        let tokens = self.transport.session_tokens();
        self.store
            .save(&self.username, &self.verification_code, &tokens)
            .await
            .map_err(|e| MentionWatchError::Session(e.to_string()))?;
        info!(account = self.username.as_str(), "Logged in and persisted session");

        Ok(self.transport)
    }
}

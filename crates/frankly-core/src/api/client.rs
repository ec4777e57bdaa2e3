//! Client for the Frankly platform REST API.
//!
//! A `Client` owns the credentials, the session manager and the transport.
//! Every resource call goes through [`Client::execute`], which attaches a
//! fresh token and signature to the request before handing it to the
//! transport.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use super::files::Files;
use super::resources::Resources;
use super::transport::{RequestEnvelope, Transport};
use crate::auth::{RequestSigner, SessionData, SessionManager};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{Announcement, Message, Room, User};

/// API client for the Frankly platform.
/// Clone is cheap - clones share the session and the connection pool.
#[derive(Clone)]
pub struct Client {
    session: SessionManager,
    transport: Transport,
    signer: RequestSigner,
}

impl Client {
    /// Build a client without touching the network. The first call logs in.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let credentials = config.credentials()?;
        let signer = RequestSigner::new(credentials.app_key(), credentials.app_secret());
        let transport = Transport::new(credentials.host().clone(), &config)?;
        let session = SessionManager::new(credentials, signer.clone(), transport.clone(), &config);

        debug!(host = %session.credentials().host(), "Client created");

        Ok(Self {
            session,
            transport,
            signer,
        })
    }

    /// Build a client and authenticate right away.
    pub async fn open(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.session.acquire_token().await?;
        Ok(client)
    }

    /// Release the session. Later calls fail with `SessionClosed`.
    pub fn close(&self) {
        self.session.close();
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Current session details, if logged in.
    pub fn session_data(&self) -> Option<SessionData> {
        self.session.session()
    }

    /// Sign and send one request with the current session token.
    ///
    /// A 401/403 response invalidates the token that was used, so the next
    /// call logs in again instead of repeating a rejected token.
    pub async fn execute(&self, envelope: RequestEnvelope) -> Result<Value> {
        let token = self.session.acquire_token().await?;
        let envelope = envelope
            .with_token(token.as_str())
            .sign(&self.signer, Utc::now().timestamp())?;

        match self.transport.send(envelope).await {
            Err(err @ Error::Authentication { .. }) => {
                self.session.invalidate(&token);
                Err(err)
            }
            other => other,
        }
    }

    pub fn rooms(&self) -> Resources<'_, Room> {
        Resources::new(self, ())
    }

    pub fn messages(&self, room_id: i64) -> Resources<'_, Message> {
        Resources::new(self, room_id)
    }

    pub fn users(&self) -> Resources<'_, User> {
        Resources::new(self, ())
    }

    pub fn announcements(&self) -> Resources<'_, Announcement> {
        Resources::new(self, ())
    }

    pub fn files(&self) -> Files<'_> {
        Files::new(self)
    }

    pub(crate) fn request_timeout(&self) -> std::time::Duration {
        self.transport.timeout()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("credentials", self.session.credentials())
            .field("state", &self.session.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionState;

    #[test]
    fn test_new_rejects_bad_config() {
        let err = Client::new(ClientConfig::new("https://app.franklychat.com", "", "s")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_new_is_lazy() {
        let client = Client::new(ClientConfig::new("https://app.franklychat.com", "k", "s")).unwrap();
        assert_eq!(client.session().state(), SessionState::Unauthenticated);
        assert!(client.session_data().is_none());
    }

    #[tokio::test]
    async fn test_closed_client_fails_fast() {
        let client = Client::new(ClientConfig::new("https://app.franklychat.com", "k", "s")).unwrap();
        client.close();
        assert_eq!(client.session().state(), SessionState::Closed);
        let err = client.rooms().get(1).await.unwrap_err();
        assert!(matches!(err, Error::SessionClosed));
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::transport::{RequestEnvelope, Transport};
use crate::auth::identity::{generate_identity_token, IdentityClaims, IDENTITY_TOKEN_LIFETIME_SECS};
use crate::auth::{Credentials, RequestSigner};
use crate::config::ClientConfig;
use crate::error::{Error, Result};

pub const NONCE_PATH: &str = "/auth/nonce";
pub const AUTH_PATH: &str = "/auth";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub app_id: Option<i64>,
    pub app_user_id: Option<i64>,
    pub role: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole minutes left before expiry, never negative.
    pub fn minutes_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_minutes().max(0)
    }
}

/// Body of a successful `/auth` response.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    #[serde(default)]
    app_id: Option<i64>,
    #[serde(default)]
    app_user_id: Option<i64>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    expires_on: Option<DateTime<Utc>>,
}

impl AuthResponse {
    fn into_session(self, now: DateTime<Utc>) -> SessionData {
        let issued_at = self.created_on.unwrap_or(now);
        let expires_at = self
            .expires_on
            .unwrap_or_else(|| issued_at + Duration::seconds(IDENTITY_TOKEN_LIFETIME_SECS));
        SessionData {
            token: self.token,
            app_id: self.app_id,
            app_user_id: self.app_user_id,
            role: self.role,
            issued_at,
            expires_at,
        }
    }
}

/// Observable lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Valid,
    Expired,
    Closed,
}

type LoginFlight = Shared<BoxFuture<'static, Result<Arc<SessionData>>>>;

enum State {
    Unauthenticated,
    Authenticating { flight: LoginFlight, id: u64 },
    Valid(Arc<SessionData>),
    /// Rejected by the server before its expiry time.
    Expired(Arc<SessionData>),
    Closed,
}

struct Inner {
    credentials: Credentials,
    signer: RequestSigner,
    transport: Transport,
    role: Option<String>,
    user_id: Option<i64>,
    state: Mutex<State>,
    flights: AtomicU64,
}

/// Owns the session token and renews it on demand.
///
/// Concurrent callers that find no valid token share a single login attempt:
/// the first one starts it, the rest await the same shared future and all of
/// them observe its outcome.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        credentials: Credentials,
        signer: RequestSigner,
        transport: Transport,
        config: &ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                credentials,
                signer,
                transport,
                role: config.role.clone(),
                user_id: config.user_id,
                state: Mutex::new(State::Unauthenticated),
                flights: AtomicU64::new(0),
            }),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// Return a valid token, logging in first if needed.
    pub async fn acquire_token(&self) -> Result<String> {
        let (flight, id) = {
            let mut state = self.lock_state();
            match &*state {
                State::Closed => return Err(Error::SessionClosed),
                State::Valid(session) if !session.is_expired() => {
                    return Ok(session.token.clone());
                }
                State::Authenticating { flight, id } => {
                    debug!(flight = *id, "Waiting for in-flight login");
                    (flight.clone(), *id)
                }
                State::Unauthenticated | State::Valid(_) | State::Expired(_) => {
                    let id = self.inner.flights.fetch_add(1, Ordering::Relaxed) + 1;
                    let inner = Arc::clone(&self.inner);
                    let flight = async move { inner.login().await.map(Arc::new) }
                        .boxed()
                        .shared();
                    debug!(flight = id, "Starting login");
                    *state = State::Authenticating {
                        flight: flight.clone(),
                        id,
                    };
                    (flight, id)
                }
            }
        };

        let outcome = flight.await;
        self.finish_flight(id, &outcome);
        outcome.map(|session| session.token.clone())
    }

    /// Record the result of a login, unless the state moved on meanwhile.
    fn finish_flight(&self, id: u64, outcome: &Result<Arc<SessionData>>) {
        let mut state = self.lock_state();
        let current = match &*state {
            State::Authenticating { id: current, .. } => *current,
            _ => return,
        };
        if current != id {
            return;
        }
        *state = match outcome {
            Ok(session) => State::Valid(Arc::clone(session)),
            Err(_) => State::Unauthenticated,
        };
    }

    /// Force the next `acquire_token` to log in again.
    ///
    /// Only the token that was actually rejected is dropped; a session that
    /// was renewed in the meantime is kept.
    pub fn invalidate(&self, token: &str) {
        let mut state = self.lock_state();
        let session = match &*state {
            State::Valid(session) if session.token == token => Arc::clone(session),
            _ => return,
        };
        warn!(app_user_id = ?session.app_user_id, "Session token rejected, will re-authenticate");
        *state = State::Expired(session);
    }

    pub fn state(&self) -> SessionState {
        match &*self.lock_state() {
            State::Unauthenticated => SessionState::Unauthenticated,
            State::Authenticating { .. } => SessionState::Authenticating,
            State::Valid(session) if session.is_expired() => SessionState::Expired,
            State::Valid(_) => SessionState::Valid,
            State::Expired(_) => SessionState::Expired,
            State::Closed => SessionState::Closed,
        }
    }

    /// The current session, valid or not.
    pub fn session(&self) -> Option<SessionData> {
        match &*self.lock_state() {
            State::Valid(session) | State::Expired(session) => Some(session.as_ref().clone()),
            _ => None,
        }
    }

    /// Drop the session. Every later `acquire_token` fails.
    pub fn close(&self) {
        let mut state = self.lock_state();
        if !matches!(*state, State::Closed) {
            info!("Session closed");
        }
        *state = State::Closed;
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Log in, retrying transient failures. Rejections surface immediately.
    async fn login(&self) -> Result<SessionData> {
        let result = self
            .transport
            .retrying(AUTH_PATH, || self.login_once())
            .await;

        match &result {
            Ok(session) => info!(
                app_id = ?session.app_id,
                app_user_id = ?session.app_user_id,
                expires_at = %session.expires_at,
                "Authenticated"
            ),
            Err(err) => warn!(error = %err, "Authentication failed"),
        }
        result
    }

    async fn login_once(&self) -> Result<SessionData> {
        let now = Utc::now();

        let nonce = RequestEnvelope::get(NONCE_PATH).sign(&self.signer, now.timestamp())?;
        let nonce = match self.transport.send_once(&nonce).await? {
            serde_json::Value::String(nonce) => nonce,
            serde_json::Value::Number(nonce) => nonce.to_string(),
            other => {
                return Err(Error::InvalidResponse(format!(
                    "expected a nonce, got {other}"
                )))
            }
        };

        let mut claims = IdentityClaims::new(self.credentials.app_key(), &nonce, now.timestamp());
        claims.role = self.role.clone();
        claims.uid = self.user_id;
        let identity_token = generate_identity_token(&claims, self.credentials.app_secret())?;

        let body = serde_json::json!({
            "app_key": self.credentials.app_key(),
            "nonce": nonce,
            "identity_token": identity_token,
        });
        let request = RequestEnvelope::new(Method::POST, AUTH_PATH)
            .json(&body)?
            .sign(&self.signer, now.timestamp())?;

        let value = self.transport.send_once(&request).await?;
        let response: AuthResponse = serde_json::from_value(value)
            .map_err(|e| Error::InvalidResponse(format!("auth response: {e}")))?;
        Ok(response.into_session(Utc::now()))
    }
}

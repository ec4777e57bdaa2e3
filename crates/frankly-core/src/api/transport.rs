//! HTTP transport for signed platform requests.
//!
//! The `Transport` turns one `RequestEnvelope` into one HTTP exchange,
//! mapping failures to typed errors. Idempotent requests are retried with
//! exponential backoff; writes are sent exactly once.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::{header, Client, Method, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::signer::{
    RequestSigner, Signature, APP_KEY_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Query parameter carrying the session token.
pub const TOKEN_PARAM: &str = "token";

const JSON_CONTENT_TYPE: &str = "application/json";

const USER_AGENT: &str = concat!("Frankly-SDK/", env!("CARGO_PKG_VERSION"), " (Rust)");

/// One outgoing request. Built fresh for every call and consumed on send.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub method: Method,
    pub path: String,
    pub params: BTreeMap<String, String>,
    /// These exact bytes are signed and sent.
    pub body: Option<Vec<u8>>,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    /// Overrides the transport-wide timeout for this request.
    pub timeout: Option<Duration>,
    pub token: Option<String>,
    pub signature: Option<Signature>,
    pub app_key: Option<String>,
}

impl RequestEnvelope {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            body: None,
            content_type: None,
            content_encoding: None,
            timeout: None,
            token: None,
            signature: None,
            app_key: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(|e| Error::Encoding(e.to_string()))?;
        self.body = Some(bytes);
        self.content_type = Some(JSON_CONTENT_TYPE.to_string());
        Ok(self)
    }

    /// Raw body, sent as is.
    pub fn bytes(mut self, body: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = Some(body);
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.content_encoding = Some(encoding.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// GET requests can be repeated without side effects.
    pub fn is_idempotent(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD)
    }

    /// Body as it goes on the wire. GET and HEAD never carry one.
    pub fn wire_body(&self) -> Option<&[u8]> {
        if self.is_idempotent() {
            return None;
        }
        self.body.as_deref()
    }

    /// Parameters as they appear on the wire, token included.
    pub fn query(&self) -> BTreeMap<String, String> {
        let mut query = self.params.clone();
        if let Some(ref token) = self.token {
            query.insert(TOKEN_PARAM.to_string(), token.clone());
        }
        query
    }

    /// Path covered by the signature. For an absolute URL this is its path
    /// component.
    pub fn signing_path(&self) -> String {
        match Url::parse(&self.path) {
            Ok(url) if url.has_host() => url.path().to_string(),
            _ => self.path.clone(),
        }
    }

    /// Attach a signature computed over the final query and body.
    pub fn sign(mut self, signer: &RequestSigner, timestamp: i64) -> Result<Self> {
        let signature = signer.sign(
            &self.method,
            &self.signing_path(),
            &self.query(),
            self.wire_body(),
            timestamp,
        )?;
        self.signature = Some(signature);
        self.app_key = Some(signer.app_key().to_string());
        Ok(self)
    }
}

/// Exponential backoff with a little jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        let base = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let jitter_ms = (base.as_millis() as u64) / 4;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// HTTP transport. Clone is cheap - reqwest::Client shares its pool.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base: Url,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(base: Url, config: &ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(JSON_CONTENT_TYPE),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            timeout: config.timeout,
            retry: RetryPolicy {
                attempts: config.attempts(),
                initial_backoff: config.retry_backoff,
            },
        })
    }

    /// Send a request, retrying it when it is idempotent.
    pub async fn send(&self, envelope: RequestEnvelope) -> Result<Value> {
        if envelope.is_idempotent() {
            self.retrying(envelope.path.as_str(), || self.send_once(&envelope))
                .await
        } else {
            self.send_once(&envelope).await
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    pub(crate) async fn retrying<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.retry.attempts => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        target_path = what,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Perform exactly one HTTP exchange.
    pub(crate) async fn send_once(&self, envelope: &RequestEnvelope) -> Result<Value> {
        let url = self.url(&envelope.path)?;
        let query = envelope.query();

        let mut request = self
            .client
            .request(envelope.method.clone(), url)
            .query(&query);

        if let Some(ref signature) = envelope.signature {
            request = request
                .header(SIGNATURE_HEADER, signature.value.as_str())
                .header(TIMESTAMP_HEADER, signature.timestamp.to_string());
        }
        if let Some(ref app_key) = envelope.app_key {
            request = request.header(APP_KEY_HEADER, app_key.as_str());
        }
        if let Some(body) = envelope.wire_body() {
            if let Some(ref content_type) = envelope.content_type {
                request = request.header(header::CONTENT_TYPE, content_type.as_str());
            }
            if let Some(ref encoding) = envelope.content_encoding {
                request = request.header(header::CONTENT_ENCODING, encoding.as_str());
            }
            request = request.body(body.to_vec());
        }
        let timeout = envelope.timeout.unwrap_or(self.timeout);
        if envelope.timeout.is_some() {
            request = request.timeout(timeout);
        }

        debug!(method = %envelope.method, path = %envelope.path, "Sending request");

        let response = request
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), path = %envelope.path, "Request failed");
            return Err(Error::from_status(status, &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            Error::InvalidResponse(format!("{} {}: {}", envelope.method, envelope.path, e))
        })
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a path against the base URL. Absolute URLs, such as file
    /// locations, are used as they are.
    fn url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path)
                .map_err(|e| Error::Configuration(format!("invalid request URL {path:?}: {e}")));
        }
        let base = self.base.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| Error::Configuration(format!("invalid request path {path:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_query_includes_token() {
        let envelope = RequestEnvelope::get("/rooms")
            .param("limit", 10)
            .with_token("tok");
        let query = envelope.query();
        assert_eq!(query.get("limit").map(String::as_str), Some("10"));
        assert_eq!(query.get(TOKEN_PARAM).map(String::as_str), Some("tok"));
    }

    #[test]
    fn test_envelope_idempotency() {
        assert!(RequestEnvelope::get("/rooms").is_idempotent());
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(!RequestEnvelope::new(method, "/rooms").is_idempotent());
        }
    }

    #[test]
    fn test_sign_covers_token() {
        let signer = RequestSigner::new("key", "secret");
        let a = RequestEnvelope::get("/rooms")
            .with_token("one")
            .sign(&signer, 7)
            .unwrap();
        let b = RequestEnvelope::get("/rooms")
            .with_token("two")
            .sign(&signer, 7)
            .unwrap();
        assert_ne!(a.signature, b.signature);
        assert_eq!(a.app_key.as_deref(), Some("key"));
        assert!(signer
            .verify(&a.method, &a.path, &a.query(), None, a.signature.as_ref().unwrap())
            .unwrap());
    }

    #[test]
    fn test_sign_covers_write_body() {
        let signer = RequestSigner::new("key", "secret");
        let create = |title: &str| {
            RequestEnvelope::new(Method::POST, "/rooms")
                .json(&serde_json::json!({ "title": title }))
                .unwrap()
                .with_token("tok")
                .sign(&signer, 100)
                .unwrap()
        };
        let honest = create("test");
        let tampered = create("tampered");
        assert_ne!(honest.signature, tampered.signature);

        let signature = honest.signature.as_ref().unwrap();
        assert!(signer
            .verify(&honest.method, &honest.path, &honest.query(), honest.wire_body(), signature)
            .unwrap());
        assert!(!signer
            .verify(&honest.method, &honest.path, &honest.query(), tampered.wire_body(), signature)
            .unwrap());
    }

    #[test]
    fn test_get_never_carries_body() {
        let envelope = RequestEnvelope::get("/rooms")
            .json(&serde_json::json!({ "ignored": true }))
            .unwrap();
        assert!(envelope.wire_body().is_none());
    }

    #[test]
    fn test_retry_delay_grows() {
        let policy = RetryPolicy {
            attempts: 4,
            initial_backoff: Duration::from_millis(100),
        };
        let first = policy.delay(1);
        let third = policy.delay(3);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(500));

        let zero = RetryPolicy {
            attempts: 2,
            initial_backoff: Duration::ZERO,
        };
        assert_eq!(zero.delay(1), Duration::ZERO);
    }

    #[test]
    fn test_url_joining_keeps_base_path() {
        let config = ClientConfig::new("https://example.com/api/", "k", "s");
        let transport = Transport::new(Url::parse("https://example.com/api/").unwrap(), &config)
            .unwrap();
        assert_eq!(
            transport.url("/rooms/1").unwrap().as_str(),
            "https://example.com/api/rooms/1"
        );
        assert_eq!(
            transport.url("https://files.example.com/f/12").unwrap().as_str(),
            "https://files.example.com/f/12"
        );
    }

    #[test]
    fn test_absolute_url_signs_its_path() {
        let signer = RequestSigner::new("key", "secret");
        let envelope = RequestEnvelope::new(Method::PUT, "https://files.example.com/f/12")
            .bytes(b"png".to_vec(), "image/png")
            .sign(&signer, 9)
            .unwrap();
        assert_eq!(envelope.signing_path(), "/f/12");
        assert!(signer
            .verify(
                &Method::PUT,
                "/f/12",
                &envelope.query(),
                Some(b"png".as_slice()),
                envelope.signature.as_ref().unwrap()
            )
            .unwrap());
    }
}

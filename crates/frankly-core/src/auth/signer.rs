//! HMAC-SHA256 request signatures.
//!
//! The canonical form of a request is
//!
//! ```text
//! METHOD \n /path \n k1=v1&k2=v2 \n timestamp \n sha256(body)
//! ```
//!
//! with parameters sorted by key and percent-encoded. The last line is the
//! lowercase hex SHA-256 of the exact body bytes sent, or empty when the
//! request has no body. The server recomputes
//! the same string with its copy of the app secret and rejects requests whose
//! signature does not match or whose timestamp falls outside its window.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use reqwest::Method;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Frankly-Signature";
pub const TIMESTAMP_HEADER: &str = "Frankly-Timestamp";
pub const APP_KEY_HEADER: &str = "Frankly-App-Key";

/// Signature attached to an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Lowercase hex HMAC-SHA256 digest.
    pub value: String,
    /// Unix seconds the signature was computed for.
    pub timestamp: i64,
}

#[derive(Clone)]
pub struct RequestSigner {
    app_key: String,
    app_secret: String,
}

impl RequestSigner {
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
        }
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Build the canonical string covered by the signature.
    pub fn canonical(
        method: &Method,
        path: &str,
        params: &BTreeMap<String, String>,
        body: Option<&[u8]>,
        timestamp: i64,
    ) -> String {
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let body_digest = body
            .map(|bytes| hex::encode(Sha256::digest(bytes)))
            .unwrap_or_default();
        format!(
            "{}\n{}\n{}\n{}\n{}",
            method.as_str(),
            path,
            query,
            timestamp,
            body_digest
        )
    }

    /// Sign a request. Deterministic for identical inputs.
    pub fn sign(
        &self,
        method: &Method,
        path: &str,
        params: &BTreeMap<String, String>,
        body: Option<&[u8]>,
        timestamp: i64,
    ) -> Result<Signature> {
        let mut mac = self.mac()?;
        mac.update(Self::canonical(method, path, params, body, timestamp).as_bytes());
        Ok(Signature {
            value: hex::encode(mac.finalize().into_bytes()),
            timestamp,
        })
    }

    /// Check a signature in constant time.
    pub fn verify(
        &self,
        method: &Method,
        path: &str,
        params: &BTreeMap<String, String>,
        body: Option<&[u8]>,
        signature: &Signature,
    ) -> Result<bool> {
        let Ok(expected) = hex::decode(&signature.value) else {
            return Ok(false);
        };
        let mut mac = self.mac()?;
        mac.update(Self::canonical(method, path, params, body, signature.timestamp).as_bytes());
        Ok(mac.verify_slice(&expected).is_ok())
    }

    fn mac(&self) -> Result<HmacSha256> {
        if self.app_key.is_empty() {
            return Err(Error::Signing("app key is missing".to_string()));
        }
        if self.app_secret.is_empty() {
            return Err(Error::Signing("app secret is missing".to_string()));
        }
        HmacSha256::new_from_slice(self.app_secret.as_bytes())
            .map_err(|e| Error::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("app_key", &self.app_key)
            .finish_non_exhaustive()
    }
}

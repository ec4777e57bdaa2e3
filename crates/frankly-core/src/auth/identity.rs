//! Identity tokens presented to `/auth` during login.
//!
//! An identity token is a compact HS256 JWS signed with the app secret. It
//! binds the app key to a single-use nonce handed out by the platform.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};

/// Lifetime of an identity token in seconds (10 days).
pub const IDENTITY_TOKEN_LIFETIME_SECS: i64 = 864_000;

#[derive(Debug, Serialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'a str,
    cty: &'a str,
}

const HEADER: Header<'static> = Header {
    alg: "HS256",
    typ: "JWS",
    cty: "frankly-it;v1",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// App key.
    pub aak: String,
    /// Issued at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Nonce obtained from `/auth/nonce`.
    pub nce: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
}

impl IdentityClaims {
    pub fn new(app_key: &str, nonce: &str, issued_at: i64) -> Self {
        Self {
            aak: app_key.to_string(),
            iat: issued_at,
            exp: issued_at + IDENTITY_TOKEN_LIFETIME_SECS,
            nce: nonce.to_string(),
            uid: None,
            role: None,
        }
    }
}

/// Encode and sign an identity token.
pub fn generate_identity_token(claims: &IdentityClaims, app_secret: &str) -> Result<String> {
    if claims.aak.is_empty() {
        return Err(Error::Signing("app key is missing".to_string()));
    }
    if app_secret.is_empty() {
        return Err(Error::Signing("app secret is missing".to_string()));
    }

    let header = serde_json::to_vec(&HEADER).map_err(|e| Error::Signing(e.to_string()))?;
    let payload = serde_json::to_vec(claims).map_err(|e| Error::Signing(e.to_string()))?;
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload)
    );

    let mut mac = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes())
        .map_err(|e| Error::Signing(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_structure() {
        let mut claims = IdentityClaims::new("app-key", "nonce-1", 1_000);
        claims.role = Some("admin".to_string());
        let token = generate_identity_token(&claims, "secret").unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["cty"], "frankly-it;v1");

        let decoded: IdentityClaims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.exp - decoded.iat, IDENTITY_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn test_signature_verifies_with_secret() {
        let claims = IdentityClaims::new("app-key", "nonce-1", 1_000);
        let token = generate_identity_token(&claims, "secret").unwrap();
        let (input, sig) = token.rsplit_once('.').unwrap();

        let mut mac = Hmac::<Sha256>::new_from_slice(b"secret").unwrap();
        mac.update(input.as_bytes());
        assert!(mac.verify_slice(&URL_SAFE_NO_PAD.decode(sig).unwrap()).is_ok());

        let other = generate_identity_token(&claims, "other").unwrap();
        assert_ne!(token, other);
    }

    #[test]
    fn test_optional_claims_omitted() {
        let claims = IdentityClaims::new("app-key", "n", 0);
        let token = generate_identity_token(&claims, "secret").unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let json = String::from_utf8(URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert!(!json.contains("uid"));
        assert!(!json.contains("role"));
    }

    #[test]
    fn test_missing_secret_fails() {
        let claims = IdentityClaims::new("app-key", "n", 0);
        assert!(matches!(
            generate_identity_token(&claims, ""),
            Err(Error::Signing(_))
        ));
    }
}

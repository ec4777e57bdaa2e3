use std::time::Duration;

use thiserror::Error;

/// Errors returned by every public operation of the client.
///
/// The type is `Clone` so that the outcome of one shared login attempt can be
/// handed to every caller that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Cannot sign request: {0}")]
    Signing(String),

    #[error("Cannot encode request body: {0}")]
    Encoding(String),

    #[error("Authentication rejected ({status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("Session is closed")]
    SessionClosed,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed ({status}): {detail}")]
    Validation {
        status: u16,
        detail: serde_json::Value,
    },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected status ({status}): {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl Error {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Map a non-success HTTP status and its body to an error kind.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let code = status.as_u16();
        match code {
            401 | 403 => Error::Authentication {
                status: code,
                message: Self::truncate_body(body),
            },
            404 => Error::NotFound(Self::truncate_body(body)),
            400 | 422 => Error::Validation {
                status: code,
                // Keep structured detail when the server sent JSON
                detail: serde_json::from_str(body)
                    .unwrap_or_else(|_| serde_json::Value::String(Self::truncate_body(body))),
            },
            429 => Error::RateLimited,
            500..=599 => Error::Server {
                status: code,
                message: Self::truncate_body(body),
            },
            _ => Error::UnexpectedStatus {
                status: code,
                message: Self::truncate_body(body),
            },
        }
    }

    /// Map a reqwest failure that happened before a status was received.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Error::Timeout(timeout)
        } else if err.is_decode() {
            Error::InvalidResponse(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }

    /// True for connectivity failures, including deadline expiry.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout(_))
    }

    /// True when repeating the same idempotent request may succeed.
    /// No 4xx qualifies, 429 included.
    pub fn is_retryable(&self) -> bool {
        self.is_network() || matches!(self, Error::Server { .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// HTTP status behind this error, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. }
            | Error::Validation { status, .. }
            | Error::Server { status, .. }
            | Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::NotFound(_) => Some(404),
            Error::RateLimited => Some(429),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            Error::from_status(StatusCode::UNAUTHORIZED, ""),
            Error::Authentication { status: 401, .. }
        ));
        assert!(matches!(
            Error::from_status(StatusCode::FORBIDDEN, "nope"),
            Error::Authentication { status: 403, .. }
        ));
        assert!(matches!(
            Error::from_status(StatusCode::NOT_FOUND, "gone"),
            Error::NotFound(_)
        ));
        assert!(matches!(
            Error::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            Error::RateLimited
        ));
        assert!(matches!(
            Error::from_status(StatusCode::BAD_GATEWAY, ""),
            Error::Server { status: 502, .. }
        ));
        assert!(matches!(
            Error::from_status(StatusCode::CONFLICT, ""),
            Error::UnexpectedStatus { status: 409, .. }
        ));
    }

    #[test]
    fn test_validation_keeps_json_detail() {
        let err = Error::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"field":"name","reason":"too long"}"#,
        );
        match err {
            Error::Validation { status, detail } => {
                assert_eq!(status, 422);
                assert_eq!(detail["field"], "name");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = Error::from_status(StatusCode::BAD_REQUEST, "plain text");
        match err {
            Error::Validation { detail, .. } => assert_eq!(detail, "plain text"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let truncated = Error::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.ends_with("(truncated, 510 total bytes)"));

        assert_eq!(Error::truncate_body("short"), "short");
    }

    #[test]
    fn test_retry_classification() {
        assert!(Error::Timeout(Duration::from_secs(1)).is_network());
        assert!(Error::Network("reset".into()).is_retryable());
        assert!(Error::Server { status: 503, message: String::new() }.is_retryable());
        assert!(!Error::RateLimited.is_retryable());
        assert!(!Error::NotFound("x".into()).is_retryable());
        assert!(!Error::Authentication { status: 401, message: String::new() }.is_retryable());
    }
}

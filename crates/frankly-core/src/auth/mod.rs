//! Authentication module for application credentials and signed sessions.
//!
//! This module provides:
//! - `Credentials`: validated app host, key and secret
//! - `RequestSigner`: HMAC-SHA256 signatures over canonical requests
//! - `identity`: the HS256 identity token presented at login
//! - `SessionManager`: lazy, single-flight login and renewal

pub mod credentials;
pub mod identity;
pub mod session;
pub mod signer;

pub use credentials::Credentials;
pub use session::{SessionData, SessionManager, SessionState};
pub use signer::{RequestSigner, Signature};

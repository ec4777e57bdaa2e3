use std::fmt;

use reqwest::Url;

use crate::error::{Error, Result};

/// Application identity used to log in and sign requests.
///
/// Immutable once built; shared read-only between the session manager and
/// the signer.
#[derive(Clone)]
pub struct Credentials {
    host: Url,
    app_key: String,
    app_secret: String,
}

impl Credentials {
    /// Validate and build credentials. All three values are required.
    pub fn new(host: &str, app_key: &str, app_secret: &str) -> Result<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(Error::Configuration("host is required".to_string()));
        }
        if app_key.trim().is_empty() {
            return Err(Error::Configuration("app key is required".to_string()));
        }
        if app_secret.is_empty() {
            return Err(Error::Configuration("app secret is required".to_string()));
        }

        let url = Url::parse(host)
            .map_err(|e| Error::Configuration(format!("invalid host {host:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "host must use http or https, got {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(Error::Configuration(format!("host {host:?} has no hostname")));
        }

        Ok(Self {
            host: url,
            app_key: app_key.trim().to_string(),
            app_secret: app_secret.to_string(),
        })
    }

    pub fn host(&self) -> &Url {
        &self.host
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host.as_str())
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

//! File objects and their content.
//!
//! Creating a file is a signed `POST /files` whose category and type travel
//! as query parameters. The content is then written with a signed `PUT` of
//! the raw bytes to the URL the platform returned, which may live on a
//! different host.

use std::time::Duration;

use reqwest::Method;
use tracing::debug;

use super::client::Client;
use super::resources::decode;
use super::transport::RequestEnvelope;
use crate::error::Result;
use crate::models::{File, NewFile};

pub const FILES_PATH: &str = "/files";

const CATEGORY_PARAM: &str = "category";
const TYPE_PARAM: &str = "type";

/// Upload deadline grows by one millisecond per byte of content.
const UPLOAD_BYTES_PER_MS: u64 = 1;

/// Content to store in a file object.
#[derive(Debug, Clone)]
pub struct Upload {
    pub content: Vec<u8>,
    pub mime_type: String,
    /// `Content-Encoding` of `content`, e.g. `gzip`.
    pub encoding: Option<String>,
}

impl Upload {
    pub fn new(content: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            content,
            mime_type: mime_type.into(),
            encoding: None,
        }
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

pub struct Files<'a> {
    client: &'a Client,
}

impl<'a> Files<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create an empty file object.
    pub async fn create(&self, file: &NewFile) -> Result<File> {
        let mut envelope =
            RequestEnvelope::new(Method::POST, FILES_PATH).param(CATEGORY_PARAM, &file.category);
        if let Some(ref file_type) = file.file_type {
            envelope = envelope.param(TYPE_PARAM, file_type);
        }
        let value = self.client.execute(envelope).await?;
        decode(value, "file")
    }

    /// Replace the content of the file hosted at `url`. Sent once, never
    /// retried.
    pub async fn write(&self, url: &str, upload: Upload) -> Result<()> {
        let size = upload.content.len() as u64;
        let timeout = self
            .client
            .request_timeout()
            .max(Duration::from_millis(size / UPLOAD_BYTES_PER_MS));

        let mut envelope = RequestEnvelope::new(Method::PUT, url)
            .bytes(upload.content, upload.mime_type)
            .with_timeout(timeout);
        if let Some(encoding) = upload.encoding {
            envelope = envelope.content_encoding(encoding);
        }

        debug!(url, size, "Uploading file content");
        self.client.execute(envelope).await?;
        Ok(())
    }

    /// Create a file object and upload its content.
    pub async fn upload(&self, file: &NewFile, upload: Upload) -> Result<File> {
        let created = self.create(file).await?;
        self.write(&created.url, upload).await?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_builder() {
        let upload = Upload::new(vec![1, 2, 3], "image/png").encoding("gzip");
        assert_eq!(upload.mime_type, "image/png");
        assert_eq!(upload.encoding.as_deref(), Some("gzip"));
        assert_eq!(upload.content.len(), 3);
    }
}

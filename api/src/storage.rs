//! Object storage uploads
//!
//! Only the upload call of the bucket API is used: the object is posted raw
//! and its public download URL is built from the returned name and token.

use crate::{config::ApiConfig, envelope::ErrorBody, error::ApiError};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

/// Response of a successful upload
#[derive(Debug, Deserialize)]
struct UploadResponse {
    name: String,
    #[serde(rename = "downloadTokens")]
    download_tokens: String,
}

/// HTTP client for an object storage bucket
#[derive(Clone)]
pub struct HttpObjectStorage {
    client: Client,
    bucket_url: Arc<str>,
}

impl std::fmt::Debug for HttpObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpObjectStorage")
            .field("bucket_url", &self.bucket_url)
            .finish_non_exhaustive()
    }
}

impl HttpObjectStorage {
    /// Create a storage client from the configured bucket URL
    ///
    /// # Errors
    ///
    /// Returns `ApiError::StorageNotConfigured` if no storage URL is set, or
    /// `ApiError::RequestFailed` if the HTTP client cannot be built
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let bucket_url = config
            .storage_url
            .as_deref()
            .ok_or(ApiError::StorageNotConfigured)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            bucket_url: Arc::from(bucket_url),
        })
    }

    /// Upload `bytes` under `path` and return the public download URL
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-success statuses, or parsing failures
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ApiError> {
        tracing::debug!(path, size = bytes.len(), "uploading object");

        let response = self
            .client
            .post(format!("{}/o", self.bucket_url))
            .query(&[("name", path)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: ErrorBody::message_from(&body),
            });
        }

        let uploaded = response
            .json::<UploadResponse>()
            .await
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))?;

        Ok(self.public_url(&uploaded.name, &uploaded.download_tokens))
    }

    /// Public download URL of a stored object
    #[must_use]
    pub fn public_url(&self, name: &str, token: &str) -> String {
        format!(
            "{}/o/{}?alt=media&token={token}",
            self.bucket_url,
            urlencoding::encode(name)
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can unwrap

    use super::*;

    #[test]
    fn requires_storage_url() {
        let result = HttpObjectStorage::new(&ApiConfig::default());
        assert!(matches!(result, Err(ApiError::StorageNotConfigured)));
    }

    #[test]
    fn public_url_encodes_name() {
        let storage = HttpObjectStorage::new(
            &ApiConfig::default().with_storage_url("https://storage.example.com/v0/b/shop/"),
        )
        .unwrap();

        assert_eq!(
            storage.public_url("avatars/u1/me.png", "tok"),
            "https://storage.example.com/v0/b/shop/o/avatars%2Fu1%2Fme.png?alt=media&token=tok"
        );
    }
}

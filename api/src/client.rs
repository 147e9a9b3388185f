//! Storefront REST client implementation

use crate::{
    config::ApiConfig,
    envelope::{Envelope, ErrorBody},
    error::ApiError,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// Storefront REST API client
///
/// Every request carries the session cookies set by earlier responses.
/// Successful bodies are unwrapped from their `{ data }` envelope; failures
/// keep the server's `{ message }` so slices can show it.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from a configuration
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` if the HTTP client cannot be built
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.as_str()),
        })
    }

    /// Base URL requests are resolved against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base}{path}`, returning the enveloped payload
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-success statuses, or parsing failures
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    /// `POST {base}{path}` with a JSON body, returning the enveloped payload
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-success statuses, or parsing failures
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::POST, path).json(body))
            .await?;
        decode(response).await
    }

    /// `PUT {base}{path}` with a JSON body, returning the enveloped payload
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-success statuses, or parsing failures
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::PUT, path).json(body))
            .await?;
        decode(response).await
    }

    /// `DELETE {base}{path}`, returning the enveloped payload
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-success statuses, or parsing failures
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::DELETE, path)).await?;
        decode(response).await
    }

    /// `DELETE {base}{path}` with a JSON body, returning the enveloped payload
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-success statuses, or parsing failures
    pub async fn delete_with<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::DELETE, path).json(body))
            .await?;
        decode(response).await
    }

    /// `DELETE {base}{path}`, ignoring the response body
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or non-success statuses
    pub async fn delete_unit(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "api request");
        self.client
            .request(method, format!("{}{path}", self.base_url))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = ErrorBody::message_from(&body);
        tracing::debug!(status = status.as_u16(), ?message, "api request failed");

        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { message },
            status => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

    serde_json::from_slice::<Envelope<T>>(&bytes)
        .map(|envelope| envelope.data)
        .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can unwrap

    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new(&ApiConfig::new("http://localhost:8000/api/v1/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
    }
}

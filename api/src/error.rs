//! Error types for the storefront API client

use storefront_core::request::ServerMessage;
use thiserror::Error;

/// Errors that can occur when talking to the storefront API or object storage
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, timeout, TLS)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The response body did not match the expected envelope
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// The session is missing or expired
    #[error("Unauthorized: {}", message.as_deref().unwrap_or("no session"))]
    Unauthorized {
        /// Message from the `{ message }` error body
        message: Option<String>,
    },

    /// The API answered with a non-success status
    #[error("API error (status {status}): {}", message.as_deref().unwrap_or("no message"))]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the `{ message }` error body
        message: Option<String>,
    },

    /// No object storage URL was configured
    #[error("Object storage is not configured")]
    StorageNotConfigured,
}

impl ApiError {
    /// HTTP status of the failure, when the server answered
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl ServerMessage for ApiError {
    fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Errors in the client configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A URL setting is not an absolute http(s) URL
    #[error("{key} must be an http(s) URL, got {value:?}")]
    InvalidUrl {
        /// Setting name
        key: &'static str,
        /// Rejected value
        value: String,
    },

    /// The timeout setting is not a positive number of seconds
    #[error("{key} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout {
        /// Setting name
        key: &'static str,
        /// Rejected value
        value: String,
    },
}

//! # Storefront API Client
//!
//! HTTP plumbing shared by the storefront gateways: a REST client that keeps
//! the session cookies and unwraps `{ data }` envelopes, and an object storage
//! client used for avatar uploads.
//!
//! ## Example
//!
//! ```no_run
//! use storefront_api::{ApiClient, ApiConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // STOREFRONT_API_URL, defaults to http://localhost:8000/api/v1
//!     let config = ApiConfig::from_env()?;
//!     let client = ApiClient::new(&config)?;
//!
//!     let products: serde_json::Value = client.get("/product/get/all").await?;
//!     println!("{products}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod storage;

// Re-export main types for convenience
pub use client::ApiClient;
pub use config::ApiConfig;
pub use error::{ApiError, ConfigError};
pub use storage::HttpObjectStorage;

//! # Storefront
//!
//! Client-side state of an e-commerce storefront: saved addresses, the
//! shopping cart, the user profile and the product catalog.
//!
//! Each slice is a [`Reducer`](storefront_core::reducer::Reducer) whose
//! remote operations run as effects through a gateway trait. The
//! [`app::AppReducer`] composes the slices and is driven by a
//! [`Store`](storefront_runtime::Store).
//!
//! ## Example
//!
//! ```no_run
//! use storefront::app::{AppAction, AppReducer, AppState};
//! use storefront::cart::CartAction;
//! use storefront::environment::StorefrontEnvironment;
//! use storefront::gateway::{HttpAvatarStorage, HttpGateway};
//! use storefront_api::{ApiClient, ApiConfig};
//! use storefront_runtime::Store;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiConfig::from_env()?;
//! let env = StorefrontEnvironment::new(
//!     HttpGateway::new(ApiClient::new(&config)?),
//!     HttpAvatarStorage::from_config(&config)?,
//! );
//! let store = Store::new(AppState::default(), AppReducer::new(), env);
//!
//! let mut handle = store.send(AppAction::Cart(CartAction::Fetch)).await?;
//! handle.wait().await;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod app;
pub mod cart;
pub mod catalog;
pub mod environment;
pub mod gateway;
pub mod mocks;
pub mod profile;
pub mod types;
pub mod view;

pub use app::{AppAction, AppReducer, AppState};
pub use environment::StorefrontEnvironment;
pub use types::{Address, AddressDraft, Cart, CartItem, Product, ProfileUpdate, Role, User};
pub use view::{Classify, ViewBranch};

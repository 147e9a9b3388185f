//! Gateways: the remote endpoints each slice talks to.
//!
//! Slices only see these traits. [`HttpGateway`] implements all of them
//! over the REST API; the in-memory [`mocks`](crate::mocks) implement them
//! for tests.

use crate::types::{Address, AddressDraft, Cart, Product, ProfileUpdate, User};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use storefront_api::{ApiClient, ApiConfig, ApiError, HttpObjectStorage};
use storefront_core::crud::CrudGateway;
use storefront_core::request::ServerMessage;

/// Cart endpoints. Every call answers with the whole updated cart.
pub trait CartGateway: Send + Sync {
    /// Failure type; its server message is surfaced to the user
    type Error: ServerMessage + fmt::Display + Send + 'static;

    /// `GET /cart/get`
    fn fetch(&self) -> impl Future<Output = Result<Cart, Self::Error>> + Send;

    /// `POST /cart/add/item`
    fn add_item(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, Self::Error>> + Send;

    /// `PUT /cart/update/item`
    fn update_item(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, Self::Error>> + Send;

    /// `DELETE /cart/remove/item`
    fn remove_item(&self, product_id: &str)
    -> impl Future<Output = Result<Cart, Self::Error>> + Send;

    /// `DELETE /cart/clear`
    fn clear(&self) -> impl Future<Output = Result<Cart, Self::Error>> + Send;
}

/// Profile endpoints of the signed-in user.
pub trait ProfileGateway: Send + Sync {
    /// Failure type; its server message is surfaced to the user
    type Error: ServerMessage + fmt::Display + Send + 'static;

    /// `GET /user/profile`
    fn fetch_profile(&self) -> impl Future<Output = Result<User, Self::Error>> + Send;

    /// `PUT /user/profile/update`
    fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<User, Self::Error>> + Send;
}

/// Read-only product endpoints.
pub trait CatalogGateway: Send + Sync {
    /// Failure type; its server message is surfaced to the user
    type Error: ServerMessage + fmt::Display + Send + 'static;

    /// `GET /product/get/all`
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send;

    /// `GET /product/get/:id`
    fn get_product(&self, id: &str) -> impl Future<Output = Result<Product, Self::Error>> + Send;
}

/// Object storage used for avatar pictures.
pub trait AvatarStorage: Send + Sync {
    /// Failure type
    type Error: fmt::Display + Send + 'static;

    /// Store `bytes` under `path` and return the public URL
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Every endpoint the storefront slices need.
pub trait StorefrontGateway:
    CrudGateway<Address, Draft = AddressDraft>
    + CartGateway
    + ProfileGateway
    + CatalogGateway
    + Clone
    + 'static
{
}

impl<G> StorefrontGateway for G where
    G: CrudGateway<Address, Draft = AddressDraft>
        + CartGateway
        + ProfileGateway
        + CatalogGateway
        + Clone
        + 'static
{
}

// ============================================================================
// HTTP implementation
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    product_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
}

/// All gateways over the storefront REST API
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: ApiClient,
}

impl HttpGateway {
    /// Gateway over an existing client
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Underlying REST client
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl CrudGateway<Address> for HttpGateway {
    type Draft = AddressDraft;
    type Error = ApiError;

    fn list(&self) -> impl Future<Output = Result<Vec<Address>, ApiError>> + Send {
        self.client.get("/user/address/get/all")
    }

    fn get(&self, id: &String) -> impl Future<Output = Result<Address, ApiError>> + Send {
        let path = format!("/user/address/get/{id}");
        async move { self.client.get(&path).await }
    }

    fn create(&self, draft: &AddressDraft) -> impl Future<Output = Result<Address, ApiError>> + Send {
        self.client.post("/user/address/create", draft)
    }

    fn update(
        &self,
        id: &String,
        draft: &AddressDraft,
    ) -> impl Future<Output = Result<Address, ApiError>> + Send {
        let path = format!("/user/address/update/{id}");
        async move { self.client.put(&path, draft).await }
    }

    fn delete(&self, id: &String) -> impl Future<Output = Result<(), ApiError>> + Send {
        let path = format!("/user/address/delete/{id}");
        async move { self.client.delete_unit(&path).await }
    }
}

impl CartGateway for HttpGateway {
    type Error = ApiError;

    fn fetch(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        self.client.get("/cart/get")
    }

    fn add_item(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        async move {
            let body = ItemBody {
                product_id,
                quantity: Some(quantity),
            };
            self.client.post("/cart/add/item", &body).await
        }
    }

    fn update_item(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        async move {
            let body = ItemBody {
                product_id,
                quantity: Some(quantity),
            };
            self.client.put("/cart/update/item", &body).await
        }
    }

    fn remove_item(&self, product_id: &str) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        async move {
            let body = ItemBody {
                product_id,
                quantity: None,
            };
            self.client.delete_with("/cart/remove/item", &body).await
        }
    }

    fn clear(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        self.client.delete("/cart/clear")
    }
}

impl ProfileGateway for HttpGateway {
    type Error = ApiError;

    fn fetch_profile(&self) -> impl Future<Output = Result<User, ApiError>> + Send {
        self.client.get("/user/profile")
    }

    fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<User, ApiError>> + Send {
        self.client.put("/user/profile/update", update)
    }
}

impl CatalogGateway for HttpGateway {
    type Error = ApiError;

    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send {
        self.client.get("/product/get/all")
    }

    fn get_product(&self, id: &str) -> impl Future<Output = Result<Product, ApiError>> + Send {
        let path = format!("/product/get/{id}");
        async move { self.client.get(&path).await }
    }
}

/// Avatar storage over the object storage bucket, when one is configured
#[derive(Debug, Clone)]
pub struct HttpAvatarStorage {
    storage: Option<HttpObjectStorage>,
}

impl HttpAvatarStorage {
    /// Storage for the configured bucket; uploads fail when none is set
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` if the HTTP client cannot be built
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let storage = match HttpObjectStorage::new(config) {
            Ok(storage) => Some(storage),
            Err(ApiError::StorageNotConfigured) => {
                tracing::info!("STOREFRONT_STORAGE_URL unset, avatar uploads disabled");
                None
            },
            Err(error) => return Err(error),
        };
        Ok(Self { storage })
    }
}

impl AvatarStorage for HttpAvatarStorage {
    type Error = ApiError;

    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<String, ApiError>> + Send {
        async move {
            match &self.storage {
                Some(storage) => storage.upload(path, bytes, content_type).await,
                None => Err(ApiError::StorageNotConfigured),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can unwrap

    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cart_json(quantity: u32) -> serde_json::Value {
        json!({
            "_id": "c1",
            "user": "u1",
            "items": [{
                "product": { "_id": "p1", "name": "Mug", "price": 10.0, "discount": 0, "stock": 4 },
                "quantity": quantity
            }],
            "totalPrice": 10.0 * f64::from(quantity)
        })
    }

    async fn gateway(server: &MockServer) -> HttpGateway {
        HttpGateway::new(ApiClient::new(&ApiConfig::new(server.uri())).unwrap())
    }

    #[tokio::test]
    async fn address_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/address/get/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/user/address/delete/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(&server).await;
        let addresses = CrudGateway::<Address>::list(&gateway).await.unwrap();
        assert!(addresses.is_empty());
        CrudGateway::<Address>::delete(&gateway, &"a1".to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cart_item_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cart/update/item"))
            .and(body_json(json!({ "productId": "p1", "quantity": 2 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": cart_json(2) })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/cart/remove/item"))
            .and(body_json(json!({ "productId": "p1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "_id": "c1", "items": [], "totalPrice": 0 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(&server).await;
        let cart = gateway.update_item("p1", 2).await.unwrap();
        assert_eq!(cart.item("p1").map(|i| i.quantity), Some(2));

        let cart = gateway.remove_item("p1").await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_storage_fails_uploads() {
        let storage = HttpAvatarStorage::from_config(&ApiConfig::default()).unwrap();
        let result = storage.upload("avatars/u1/a.png", vec![1], "image/png").await;
        assert!(matches!(result, Err(ApiError::StorageNotConfigured)));
    }
}

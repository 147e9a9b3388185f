//! In-memory storefront backend.

use crate::gateway::{CartGateway, CatalogGateway, ProfileGateway};
use crate::types::{
    Address, AddressDraft, Cart, CartItem, Product, ProductSnapshot, ProfileUpdate, User,
    round_cents,
};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront_api::ApiError;
use storefront_core::crud::CrudGateway;

/// Server data and scripted failures.
#[derive(Debug)]
struct Backend {
    addresses: Vec<Address>,
    cart: Cart,
    products: Vec<Product>,
    user: Option<User>,
    next_id: u64,
    failures: VecDeque<Option<String>>,
    calls: Vec<&'static str>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            cart: Cart {
                id: "cart-1".to_string(),
                user_id: None,
                items: Vec::new(),
                total_price: 0.0,
            },
            products: Vec::new(),
            user: None,
            next_id: 1,
            failures: VecDeque::new(),
            calls: Vec::new(),
        }
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: Some(format!("{what} not found")),
    }
}

fn bad_request(message: String) -> ApiError {
    ApiError::Status {
        status: 400,
        message: Some(message),
    }
}

impl Backend {
    fn issue_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn owner(&self) -> Option<String> {
        self.user.as_ref().map(|u| u.id.clone())
    }

    fn snapshot(&self, product_id: &str) -> Option<ProductSnapshot> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| ProductSnapshot {
                id: p.id.clone(),
                name: p.name.clone(),
                image: p.images.first().cloned(),
                price: p.price,
                discount: p.discount,
                stock: p.stock,
            })
            .or_else(|| self.cart.item(product_id).map(|i| i.product.clone()))
    }

    fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<Cart, ApiError> {
        let item = self
            .cart
            .items
            .iter_mut()
            .find(|i| i.product.id == product_id)
            .ok_or_else(|| not_found("Cart item"))?;

        if quantity < 1 || quantity > item.product.stock {
            return Err(bad_request(format!(
                "Only {} left in stock",
                item.product.stock
            )));
        }
        item.quantity = quantity;
        Ok(self.priced_cart())
    }

    fn priced_cart(&mut self) -> Cart {
        self.cart.total_price = round_cents(self.cart.items.iter().map(CartItem::subtotal).sum());
        self.cart.clone()
    }
}

/// In-memory implementation of every storefront gateway.
///
/// Clones share the same backend, so a test can keep a handle to inspect
/// calls while the store owns another.
#[derive(Debug, Clone, Default)]
pub struct MockStorefront {
    backend: Arc<Mutex<Backend>>,
    latency: Option<Duration>,
}

impl MockStorefront {
    /// Empty backend with no user signed in
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn seed(self, f: impl FnOnce(&mut Backend)) -> Self {
        if let Ok(mut backend) = self.backend.lock() {
            f(&mut backend);
        }
        self
    }

    /// Seed saved addresses
    #[must_use]
    pub fn with_addresses(self, addresses: Vec<Address>) -> Self {
        self.seed(|b| b.addresses = addresses)
    }

    /// Seed the cart
    #[must_use]
    pub fn with_cart(self, cart: Cart) -> Self {
        self.seed(|b| b.cart = cart)
    }

    /// Seed the catalog
    #[must_use]
    pub fn with_products(self, products: Vec<Product>) -> Self {
        self.seed(|b| b.products = products)
    }

    /// Sign a user in
    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        self.seed(|b| b.user = Some(user))
    }

    /// Delay every response
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next call, with a server message or as a network error
    pub fn fail_next(&self, message: Option<&str>) {
        if let Ok(mut backend) = self.backend.lock() {
            backend.failures.push_back(message.map(str::to_string));
        }
    }

    /// Endpoints called so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.backend
            .lock()
            .map(|b| b.calls.clone())
            .unwrap_or_default()
    }

    /// Addresses currently stored
    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        self.backend
            .lock()
            .map(|b| b.addresses.clone())
            .unwrap_or_default()
    }

    fn respond<T, F>(
        &self,
        endpoint: &'static str,
        handler: F,
    ) -> impl Future<Output = Result<T, ApiError>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce(&mut Backend) -> Result<T, ApiError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let latency = self.latency;

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            let mut backend = backend
                .lock()
                .map_err(|_| ApiError::RequestFailed("mock backend poisoned".into()))?;
            backend.calls.push(endpoint);
            tracing::debug!(endpoint, "mock request");

            if let Some(failure) = backend.failures.pop_front() {
                return Err(match failure {
                    Some(message) => ApiError::Status {
                        status: 500,
                        message: Some(message),
                    },
                    None => ApiError::RequestFailed("connection reset".into()),
                });
            }

            handler(&mut backend)
        }
    }
}

fn apply_draft(address: &mut Address, draft: &AddressDraft) {
    address.street.clone_from(&draft.street);
    address.city.clone_from(&draft.city);
    address.state.clone_from(&draft.state);
    address.country.clone_from(&draft.country);
    address.zip_code.clone_from(&draft.zip_code);
    address.mobile_no.clone_from(&draft.mobile_no);
    address.is_default = draft.is_default;
}

impl CrudGateway<Address> for MockStorefront {
    type Draft = AddressDraft;
    type Error = ApiError;

    fn list(&self) -> impl Future<Output = Result<Vec<Address>, ApiError>> + Send {
        self.respond("GET /user/address/get/all", |b| Ok(b.addresses.clone()))
    }

    fn get(&self, id: &String) -> impl Future<Output = Result<Address, ApiError>> + Send {
        let id = id.clone();
        self.respond("GET /user/address/get/:id", move |b| {
            b.addresses
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .ok_or_else(|| not_found("Address"))
        })
    }

    fn create(&self, draft: &AddressDraft) -> impl Future<Output = Result<Address, ApiError>> + Send {
        let draft = draft.clone();
        self.respond("POST /user/address/create", move |b| {
            let mut address = Address {
                id: b.issue_id("addr"),
                street: String::new(),
                city: String::new(),
                state: String::new(),
                country: String::new(),
                zip_code: String::new(),
                mobile_no: String::new(),
                is_default: false,
                user_id: b.owner(),
            };
            apply_draft(&mut address, &draft);
            b.addresses.push(address.clone());
            Ok(address)
        })
    }

    fn update(
        &self,
        id: &String,
        draft: &AddressDraft,
    ) -> impl Future<Output = Result<Address, ApiError>> + Send {
        let id = id.clone();
        let draft = draft.clone();
        self.respond("PUT /user/address/update/:id", move |b| {
            let address = b
                .addresses
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| not_found("Address"))?;
            apply_draft(address, &draft);
            Ok(address.clone())
        })
    }

    fn delete(&self, id: &String) -> impl Future<Output = Result<(), ApiError>> + Send {
        let id = id.clone();
        self.respond("DELETE /user/address/delete/:id", move |b| {
            let before = b.addresses.len();
            b.addresses.retain(|a| a.id != id);
            if b.addresses.len() == before {
                return Err(not_found("Address"));
            }
            Ok(())
        })
    }
}

impl CartGateway for MockStorefront {
    type Error = ApiError;

    fn fetch(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        self.respond("GET /cart/get", |b| Ok(b.priced_cart()))
    }

    fn add_item(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        let product_id = product_id.to_string();
        self.respond("POST /cart/add/item", move |b| {
            if let Some(current) = b.cart.item(&product_id).map(|i| i.quantity) {
                return b.set_quantity(&product_id, current + quantity);
            }
            let product = b
                .snapshot(&product_id)
                .ok_or_else(|| not_found("Product"))?;
            if quantity < 1 || quantity > product.stock {
                return Err(bad_request(format!("Only {} left in stock", product.stock)));
            }
            b.cart.items.push(CartItem { product, quantity });
            Ok(b.priced_cart())
        })
    }

    fn update_item(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        let product_id = product_id.to_string();
        self.respond("PUT /cart/update/item", move |b| {
            b.set_quantity(&product_id, quantity)
        })
    }

    fn remove_item(&self, product_id: &str) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        let product_id = product_id.to_string();
        self.respond("DELETE /cart/remove/item", move |b| {
            b.cart.items.retain(|i| i.product.id != product_id);
            Ok(b.priced_cart())
        })
    }

    fn clear(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        self.respond("DELETE /cart/clear", |b| {
            b.cart.items.clear();
            Ok(b.priced_cart())
        })
    }
}

impl ProfileGateway for MockStorefront {
    type Error = ApiError;

    fn fetch_profile(&self) -> impl Future<Output = Result<User, ApiError>> + Send {
        self.respond("GET /user/profile", |b| {
            b.user.clone().ok_or(ApiError::Unauthorized {
                message: Some("Please sign in".to_string()),
            })
        })
    }

    fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<User, ApiError>> + Send {
        let update = update.clone();
        self.respond("PUT /user/profile/update", move |b| {
            let user = b.user.as_mut().ok_or(ApiError::Unauthorized {
                message: Some("Please sign in".to_string()),
            })?;
            user.name = update.name;
            user.email = update.email;
            user.phone = update.phone;
            if update.avatar.is_some() {
                user.avatar = update.avatar;
            }
            Ok(user.clone())
        })
    }
}

impl CatalogGateway for MockStorefront {
    type Error = ApiError;

    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send {
        self.respond("GET /product/get/all", |b| Ok(b.products.clone()))
    }

    fn get_product(&self, id: &str) -> impl Future<Output = Result<Product, ApiError>> + Send {
        let id = id.to_string();
        self.respond("GET /product/get/:id", move |b| {
            b.products
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| not_found("Product"))
        })
    }
}

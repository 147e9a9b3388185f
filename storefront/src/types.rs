//! Domain types mirrored from the storefront API.
//!
//! Field names follow the API's JSON (camelCase, `_id` identifiers).

use serde::{Deserialize, Serialize};
use storefront_core::crud::Entity;

/// Rounds a money amount to cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Price after applying a percentage discount.
#[must_use]
pub fn discounted_price(price: f64, discount_percent: f64) -> f64 {
    price * (1.0 - discount_percent / 100.0)
}

// ============================================================================
// Addresses
// ============================================================================

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Server-issued id
    #[serde(rename = "_id")]
    pub id: String,
    /// Street and number
    pub street: String,
    /// City
    pub city: String,
    /// State or region
    pub state: String,
    /// Country
    pub country: String,
    /// Postal code
    pub zip_code: String,
    /// Contact phone number
    pub mobile_no: String,
    /// Whether this is the user's default address
    #[serde(default)]
    pub is_default: bool,
    /// Owning user
    #[serde(default, rename = "user", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Address {
    /// Payload that would recreate this address as-is.
    #[must_use]
    pub fn to_draft(&self) -> AddressDraft {
        AddressDraft {
            street: self.street.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            country: self.country.clone(),
            zip_code: self.zip_code.clone(),
            mobile_no: self.mobile_no.clone(),
            is_default: self.is_default,
        }
    }

    /// One-line rendering used in selection lists.
    #[must_use]
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {} {}, {}",
            self.street, self.city, self.state, self.zip_code, self.country
        )
    }
}

impl Entity for Address {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

/// Create/update payload of an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDraft {
    /// Street and number
    pub street: String,
    /// City
    pub city: String,
    /// State or region
    pub state: String,
    /// Country
    pub country: String,
    /// Postal code
    pub zip_code: String,
    /// Contact phone number
    pub mobile_no: String,
    /// Whether this is the user's default address
    pub is_default: bool,
}

impl AddressDraft {
    /// Same payload with the default flag set to `is_default`.
    #[must_use]
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }
}

// ============================================================================
// Products
// ============================================================================

/// A product of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Server-issued id
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// List price
    pub price: f64,
    /// Discount in percent (0-100)
    #[serde(default)]
    pub discount: f64,
    /// Units available
    pub stock: u32,
    /// Image URLs, first one is the cover
    #[serde(default)]
    pub images: Vec<String>,
    /// Category name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Product {
    /// Price after discount, rounded to cents.
    #[must_use]
    pub fn final_price(&self) -> f64 {
        round_cents(discounted_price(self.price, self.discount))
    }

    /// Whether any unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl Entity for Product {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

// ============================================================================
// Cart
// ============================================================================

/// Product data denormalised into a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Product id
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Cover image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// List price
    pub price: f64,
    /// Discount in percent (0-100)
    #[serde(default)]
    pub discount: f64,
    /// Units available
    pub stock: u32,
}

/// A cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product snapshot
    pub product: ProductSnapshot,
    /// Units in the cart, between 1 and the product stock
    pub quantity: u32,
}

impl CartItem {
    /// Id of the product on this line
    #[must_use]
    pub fn product_id(&self) -> &str {
        &self.product.id
    }

    /// Whether one more unit fits in stock
    #[must_use]
    pub const fn can_increase(&self) -> bool {
        self.quantity < self.product.stock
    }

    /// Whether one unit can be taken away without removing the line
    #[must_use]
    pub const fn can_decrease(&self) -> bool {
        self.quantity > 1
    }

    /// Discounted unit price × quantity, rounded to cents
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        round_cents(
            discounted_price(self.product.price, self.product.discount) * f64::from(self.quantity),
        )
    }
}

/// The signed-in user's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Server-issued id
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning user
    #[serde(default, rename = "user", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Lines, in the order they were added
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Total computed by the server
    #[serde(default)]
    pub total_price: f64,
}

impl Cart {
    /// Line holding `product_id`
    #[must_use]
    pub fn item(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id() == product_id)
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Units across all lines
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, i| count.saturating_add(i.quantity))
    }
}

// ============================================================================
// Users
// ============================================================================

/// Role of a user account. Assigned by the backend only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shopper
    #[default]
    Customer,
    /// Merchant
    Seller,
    /// Back-office operator
    Admin,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-issued id
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Account role
    #[serde(default)]
    pub role: Role,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Profile update payload.
///
/// Carries no role: the role is never sent by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    /// Update payload keeping every field of `user`
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            avatar: user.avatar.clone(),
        }
    }

    /// Same payload with a new avatar URL
    #[must_use]
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar = Some(url.into());
        self
    }
}

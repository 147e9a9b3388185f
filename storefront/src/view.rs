//! View models.
//!
//! Rendering is left to the host UI. These functions decide which branch a
//! screen shows, prepare cart rows and validate forms before any request.

use crate::cart::CartState;
use crate::profile::ProfileState;
use crate::types::{Address, AddressDraft, ProfileUpdate, User, discounted_price, round_cents};
use storefront_core::crud::{Entity, EntityState};
use storefront_core::request::RequestState;
use thiserror::Error;

/// Which branch of a screen to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewBranch {
    /// A request is in flight
    Loading,
    /// The last request failed
    Error(String),
    /// Nothing to show yet
    Empty,
    /// Data to show
    Populated,
}

impl ViewBranch {
    /// Classifies a slice: loading first, then error, then emptiness.
    #[must_use]
    pub fn classify(request: &RequestState, is_empty: bool) -> Self {
        if request.is_loading() {
            Self::Loading
        } else if let Some(error) = &request.error {
            Self::Error(error.clone())
        } else if is_empty {
            Self::Empty
        } else {
            Self::Populated
        }
    }
}

/// Slices that a screen can render.
pub trait Classify {
    /// Branch to render for the current state
    fn view_branch(&self) -> ViewBranch;
}

impl<T: Entity> Classify for EntityState<T> {
    fn view_branch(&self) -> ViewBranch {
        ViewBranch::classify(&self.request, self.is_empty())
    }
}

impl Classify for CartState {
    fn view_branch(&self) -> ViewBranch {
        let empty = self.cart.as_ref().is_none_or(|c| c.is_empty());
        ViewBranch::classify(&self.request, empty)
    }
}

impl Classify for ProfileState {
    fn view_branch(&self) -> ViewBranch {
        ViewBranch::classify(&self.request, self.user.is_none())
    }
}

// ============================================================================
// Cart
// ============================================================================

/// One rendered cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct CartRow {
    /// Product id
    pub product_id: String,
    /// Product name
    pub name: String,
    /// Cover image
    pub image: Option<String>,
    /// Unit price after discount, rounded to cents
    pub unit_price: f64,
    /// Units in the cart
    pub quantity: u32,
    /// Unit price × quantity, rounded to cents
    pub subtotal: f64,
    /// Whether the + button is enabled
    pub can_increase: bool,
    /// Whether the − button is enabled
    pub can_decrease: bool,
}

/// Rendered cart: rows plus the server total.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSummary {
    /// Lines in cart order
    pub rows: Vec<CartRow>,
    /// Units across all lines
    pub item_count: u32,
    /// Total as computed by the server
    pub total: f64,
}

/// Builds the cart screen. Buttons are disabled while a request is in flight.
#[must_use]
pub fn cart_summary(state: &CartState) -> CartSummary {
    let busy = state.is_loading();
    let Some(cart) = &state.cart else {
        return CartSummary {
            rows: Vec::new(),
            item_count: 0,
            total: 0.0,
        };
    };

    let rows = cart
        .items
        .iter()
        .map(|item| CartRow {
            product_id: item.product.id.clone(),
            name: item.product.name.clone(),
            image: item.product.image.clone(),
            unit_price: round_cents(discounted_price(item.product.price, item.product.discount)),
            quantity: item.quantity,
            subtotal: item.subtotal(),
            can_increase: !busy && item.can_increase(),
            can_decrease: !busy && item.can_decrease(),
        })
        .collect();

    CartSummary {
        rows,
        item_count: cart.item_count(),
        total: cart.total_price,
    }
}

// ============================================================================
// Forms
// ============================================================================

/// Client-side validation failure. No request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Required fields left blank, in form order
    #[error("Please fill in: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The email address is malformed
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

/// Address form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressForm {
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
    /// Default address checkbox
    pub is_default: bool,
}

impl AddressForm {
    /// Form prefilled for editing `address`
    #[must_use]
    pub fn edit(address: &Address) -> Self {
        Self {
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            country: address.country.clone(),
            zip_code: address.zip_code.clone(),
            mobile_no: address.mobile_no.clone(),
            is_default: address.is_default,
        }
    }

    /// Validates every required field and builds the payload.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingFields`] listing every blank field.
    pub fn validate(&self) -> Result<AddressDraft, FormError> {
        let fields = [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("country", &self.country),
            ("zipCode", &self.zip_code),
            ("mobileNo", &self.mobile_no),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }

        Ok(AddressDraft {
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            country: self.country.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
            mobile_no: self.mobile_no.trim().to_string(),
            is_default: self.is_default,
        })
    }
}

/// Profile form contents. The role is shown read-only and never submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number, optional
    pub phone: String,
}

impl ProfileForm {
    /// Form prefilled from `user`
    #[must_use]
    pub fn edit(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
        }
    }

    /// Validates name and email and builds the payload.
    ///
    /// The current avatar of `user` is kept.
    ///
    /// # Errors
    ///
    /// Returns [`FormError`] when name or email is blank or the email is malformed.
    pub fn validate(&self, user: Option<&User>) -> Result<ProfileUpdate, FormError> {
        let name = self.name.trim();
        let email = self.email.trim();

        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push("name");
        }
        if email.is_empty() {
            missing.push("email");
        }
        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }

        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(FormError::InvalidEmail);
        }

        let phone = self.phone.trim();
        Ok(ProfileUpdate {
            name: name.to_string(),
            email: email.to_string(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            avatar: user.and_then(|u| u.avatar.clone()),
        })
    }
}

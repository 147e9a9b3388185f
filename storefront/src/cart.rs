//! Cart slice.
//!
//! Every cart endpoint answers with the whole cart, so a fulfilled request
//! replaces the local copy; the total always comes from the server.
//!
//! Quantity changes are guarded locally: a line never goes above the product
//! stock nor below 1. A guarded change records a validation error and issues
//! no request. Removing the line is the only way below 1.

use crate::gateway::CartGateway;
use crate::types::Cart;
use std::fmt;
use std::marker::PhantomData;
use storefront_core::reducer::Reducer;
use storefront_core::request::{RequestState, ServerMessage, rejection_message};
use storefront_core::{SmallVec, effect::Effect, smallvec};

/// Shown when a cart rejection carries no server message
pub const CART_FALLBACK: &str = "Unable to update your cart";

/// Remote operation of the cart slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    /// `GET /cart/get`
    Fetch,
    /// `POST /cart/add/item`
    Add,
    /// `PUT /cart/update/item`
    Update,
    /// `DELETE /cart/remove/item`
    Remove,
    /// `DELETE /cart/clear`
    Clear,
}

impl CartOperation {
    /// Success message
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Fetch => "Cart loaded",
            Self::Add => "Item added to cart",
            Self::Update => "Cart updated",
            Self::Remove => "Item removed from cart",
            Self::Clear => "Cart cleared",
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Clear => "clear",
        };
        f.write_str(name)
    }
}

/// Cart slice state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    /// Server copy of the cart, once fetched
    pub cart: Option<Cart>,
    /// Lifecycle of the last request
    pub request: RequestState,
}

impl CartState {
    /// Whether a request is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.request.is_loading()
    }

    /// Error of the last rejected request or refused change
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.request.error.as_deref()
    }

    /// Success message of the last fulfilled request
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.request.message.as_deref()
    }

    /// Quantity of `product_id` in the cart
    #[must_use]
    pub fn quantity_of(&self, product_id: &str) -> Option<u32> {
        self.cart
            .as_ref()
            .and_then(|c| c.item(product_id))
            .map(|i| i.quantity)
    }

    /// Server total, zero before the first fetch
    #[must_use]
    pub fn total_price(&self) -> f64 {
        self.cart.as_ref().map_or(0.0, |c| c.total_price)
    }
}

/// Cart slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Load the cart
    Fetch,
    /// Add units of a product
    AddItem {
        /// Product to add
        product_id: String,
        /// Units to add
        quantity: u32,
    },
    /// One more unit of a line
    IncreaseQuantity {
        /// Line product
        product_id: String,
    },
    /// One unit less of a line
    DecreaseQuantity {
        /// Line product
        product_id: String,
    },
    /// Set the units of a line
    SetQuantity {
        /// Line product
        product_id: String,
        /// New quantity, between 1 and the stock
        quantity: u32,
    },
    /// Remove a line
    RemoveItem {
        /// Line product
        product_id: String,
    },
    /// Remove every line
    Clear,
    /// Reset the slice
    ClearState,
    /// A request succeeded; carries the updated cart
    Fulfilled {
        /// Operation that succeeded
        operation: CartOperation,
        /// Server copy of the cart
        cart: Cart,
    },
    /// A request failed
    Rejected {
        /// Operation that failed
        operation: CartOperation,
        /// Message to display
        message: String,
    },
}

/// Reducer of the cart slice over gateway `G`
pub struct CartReducer<G> {
    _gateway: PhantomData<fn() -> G>,
}

impl<G> CartReducer<G> {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _gateway: PhantomData,
        }
    }
}

impl<G> Default for CartReducer<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> Clone for CartReducer<G> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<G> fmt::Debug for CartReducer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CartReducer")
    }
}

/// A quantity change refused before any request.
fn refuse(state: &mut CartState, error: String) -> SmallVec<[Effect<CartAction>; 4]> {
    tracing::debug!(%error, "cart change refused");
    state.request.invalid(error);
    SmallVec::new()
}

/// Checks `quantity` against the stock of the line holding `product_id`.
fn check_quantity(state: &CartState, product_id: &str, quantity: u32) -> Result<(), String> {
    let item = state
        .cart
        .as_ref()
        .and_then(|c| c.item(product_id))
        .ok_or_else(|| "This item is not in your cart".to_string())?;

    if quantity < 1 {
        return Err("Quantity cannot be less than 1".to_string());
    }
    if quantity > item.product.stock {
        return Err(format!("Only {} left in stock", item.product.stock));
    }
    Ok(())
}

fn settle<E>(operation: CartOperation, result: Result<Cart, E>) -> CartAction
where
    E: ServerMessage + fmt::Display,
{
    match result {
        Ok(cart) => CartAction::Fulfilled { operation, cart },
        Err(error) => {
            tracing::warn!(slice = "cart", %operation, error = %error, "request rejected");
            CartAction::Rejected {
                operation,
                message: rejection_message(&error, CART_FALLBACK),
            }
        },
    }
}

/// Begins `operation` and returns its request effect.
fn request<G, F, Fut>(
    state: &mut CartState,
    operation: CartOperation,
    env: &G,
    call: F,
) -> SmallVec<[Effect<CartAction>; 4]>
where
    G: CartGateway + Clone + 'static,
    F: FnOnce(G) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<Cart, G::Error>> + Send + 'static,
{
    state.request.begin();
    tracing::debug!(slice = "cart", %operation, "request pending");
    let gateway = env.clone();
    smallvec![storefront_core::async_effect! {
        Some(settle(operation, call(gateway).await))
    }]
}

impl<G> Reducer for CartReducer<G>
where
    G: CartGateway + Clone + 'static,
{
    type State = CartState;
    type Action = CartAction;
    type Environment = G;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Requests ==========
            CartAction::Fetch => request(state, CartOperation::Fetch, env, |g| async move {
                g.fetch().await
            }),
            CartAction::AddItem {
                product_id,
                quantity,
            } => {
                if quantity < 1 {
                    return refuse(state, "Quantity cannot be less than 1".to_string());
                }
                if let Some(item) = state.cart.as_ref().and_then(|c| c.item(&product_id)) {
                    if item.quantity.saturating_add(quantity) > item.product.stock {
                        return refuse(state, format!("Only {} left in stock", item.product.stock));
                    }
                }
                request(state, CartOperation::Add, env, move |g| async move {
                    g.add_item(&product_id, quantity).await
                })
            },
            CartAction::IncreaseQuantity { product_id } => {
                let next = state.quantity_of(&product_id).map_or(1, |q| q.saturating_add(1));
                update_quantity(state, env, product_id, next)
            },
            CartAction::DecreaseQuantity { product_id } => {
                let next = state.quantity_of(&product_id).map_or(0, |q| q.saturating_sub(1));
                update_quantity(state, env, product_id, next)
            },
            CartAction::SetQuantity {
                product_id,
                quantity,
            } => update_quantity(state, env, product_id, quantity),
            CartAction::RemoveItem { product_id } => {
                request(state, CartOperation::Remove, env, move |g| async move {
                    g.remove_item(&product_id).await
                })
            },
            CartAction::Clear => request(state, CartOperation::Clear, env, |g| async move {
                g.clear().await
            }),

            // ========== Local ==========
            CartAction::ClearState => {
                *state = CartState::default();
                SmallVec::new()
            },

            // ========== Outcomes ==========
            CartAction::Fulfilled { operation, cart } => {
                tracing::debug!(slice = "cart", %operation, items = cart.items.len(), "request fulfilled");
                state.cart = Some(cart);
                state.request.succeed(operation.message());
                SmallVec::new()
            },
            CartAction::Rejected { message, .. } => {
                state.request.fail(message);
                SmallVec::new()
            },
        }
    }
}

/// Requests a new quantity for a line, unless it falls outside `1..=stock`.
fn update_quantity<G>(
    state: &mut CartState,
    env: &G,
    product_id: String,
    quantity: u32,
) -> SmallVec<[Effect<CartAction>; 4]>
where
    G: CartGateway + Clone + 'static,
{
    if let Err(error) = check_quantity(state, &product_id, quantity) {
        return refuse(state, error);
    }
    request(state, CartOperation::Update, env, move |g| async move {
        g.update_item(&product_id, quantity).await
    })
}

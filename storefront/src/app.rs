//! Root reducer composing the storefront slices.

use crate::address::{AddressAction, AddressReducer, AddressState, address_reducer};
use crate::cart::{CartAction, CartReducer, CartState};
use crate::catalog::{CatalogAction, CatalogReducer, CatalogState};
use crate::environment::StorefrontEnvironment;
use crate::gateway::{AvatarStorage, StorefrontGateway};
use crate::profile::{ProfileAction, ProfileReducer, ProfileState};
use std::fmt;
use storefront_core::composition::{Pullback, pullback};
use storefront_core::reducer::Reducer;
use storefront_core::{SmallVec, effect::Effect};

/// Client-side state of the whole storefront
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Saved addresses
    pub addresses: AddressState,
    /// Shopping cart
    pub cart: CartState,
    /// Signed-in user
    pub profile: ProfileState,
    /// Product catalog
    pub catalog: CatalogState,
}

/// Actions of the whole storefront
#[derive(Debug, Clone)]
pub enum AppAction {
    /// Address slice action
    Address(AddressAction),
    /// Cart slice action
    Cart(CartAction),
    /// Profile slice action
    Profile(ProfileAction),
    /// Catalog slice action
    Catalog(CatalogAction),
    /// The session ended; every slice goes back to its initial state
    SignedOut,
}

type Env<G, S> = StorefrontEnvironment<G, S>;

/// Root reducer. Routes each action to its slice.
pub struct AppReducer<G, S>
where
    G: StorefrontGateway,
    S: AvatarStorage + Clone + 'static,
{
    address: Pullback<AddressReducer<G>, AppState, AppAction, Env<G, S>>,
    cart: Pullback<CartReducer<G>, AppState, AppAction, Env<G, S>>,
    profile: Pullback<ProfileReducer<G, S>, AppState, AppAction, Env<G, S>>,
    catalog: Pullback<CatalogReducer<G>, AppState, AppAction, Env<G, S>>,
}

impl<G, S> AppReducer<G, S>
where
    G: StorefrontGateway,
    S: AvatarStorage + Clone + 'static,
{
    /// Creates the root reducer
    #[must_use]
    pub fn new() -> Self {
        Self {
            address: pullback(
                address_reducer(),
                |app: &mut AppState| &mut app.addresses,
                |action: AppAction| match action {
                    AppAction::Address(inner) => Some(inner),
                    _ => None,
                },
                AppAction::Address,
                |env: &Env<G, S>| &env.gateway,
            ),
            cart: pullback(
                CartReducer::new(),
                |app: &mut AppState| &mut app.cart,
                |action: AppAction| match action {
                    AppAction::Cart(inner) => Some(inner),
                    _ => None,
                },
                AppAction::Cart,
                |env: &Env<G, S>| &env.gateway,
            ),
            profile: pullback(
                ProfileReducer::new(),
                |app: &mut AppState| &mut app.profile,
                |action: AppAction| match action {
                    AppAction::Profile(inner) => Some(inner),
                    _ => None,
                },
                AppAction::Profile,
                |env: &Env<G, S>| env,
            ),
            catalog: pullback(
                CatalogReducer::new(),
                |app: &mut AppState| &mut app.catalog,
                |action: AppAction| match action {
                    AppAction::Catalog(inner) => Some(inner),
                    _ => None,
                },
                AppAction::Catalog,
                |env: &Env<G, S>| &env.gateway,
            ),
        }
    }
}

impl<G, S> Default for AppReducer<G, S>
where
    G: StorefrontGateway,
    S: AvatarStorage + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<G, S> Clone for AppReducer<G, S>
where
    G: StorefrontGateway,
    S: AvatarStorage + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            cart: self.cart.clone(),
            profile: self.profile.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

impl<G, S> fmt::Debug for AppReducer<G, S>
where
    G: StorefrontGateway,
    S: AvatarStorage + Clone + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppReducer")
    }
}

impl<G, S> Reducer for AppReducer<G, S>
where
    G: StorefrontGateway,
    S: AvatarStorage + Clone + 'static,
{
    type State = AppState;
    type Action = AppAction;
    type Environment = Env<G, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::Address(_) => self.address.reduce(state, action, env),
            AppAction::Cart(_) => self.cart.reduce(state, action, env),
            AppAction::Profile(_) => self.profile.reduce(state, action, env),
            AppAction::Catalog(_) => self.catalog.reduce(state, action, env),
            AppAction::SignedOut => {
                tracing::debug!("signed out, clearing every slice");
                *state = AppState::default();
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockObjectStorage, MockStorefront};
    use crate::types::{Address, Cart};
    use storefront_core::crud::CrudAction;
    use storefront_testing::{ReducerTest, assertions, helpers};

    type TestReducer = AppReducer<MockStorefront, MockObjectStorage>;

    fn env(gateway: MockStorefront) -> Env<MockStorefront, MockObjectStorage> {
        StorefrontEnvironment::new(gateway, MockObjectStorage::new())
    }

    fn address(id: &str) -> Address {
        Address {
            id: id.to_string(),
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            country: "US".to_string(),
            zip_code: "62701".to_string(),
            mobile_no: "5550100".to_string(),
            is_default: false,
            user_id: None,
        }
    }

    #[test]
    fn routes_to_the_matching_slice_only() {
        ReducerTest::new(TestReducer::new())
            .with_env(env(MockStorefront::new()))
            .given_state(AppState::default())
            .when_action(AppAction::Cart(CartAction::Fetch))
            .then_state(|s| {
                assert!(s.cart.is_loading());
                assert!(!s.addresses.is_loading());
                assert!(!s.profile.request.is_loading());
                assert!(!s.catalog.is_loading());
            })
            .then_effects(assertions::assert_single_future)
            .run();
    }

    #[tokio::test]
    async fn slice_effects_are_lifted_into_app_actions() {
        let gateway = MockStorefront::new().with_addresses(vec![address("a1")]);
        let env = env(gateway);
        let reducer = TestReducer::new();
        let mut state = AppState::default();

        let effects = reducer.reduce(&mut state, AppAction::Address(CrudAction::FetchAll), &env);
        let outcome = helpers::single_action(effects).await;
        assert!(matches!(outcome, AppAction::Address(CrudAction::Fulfilled(_))));

        reducer.reduce(&mut state, outcome, &env);
        assert_eq!(state.addresses.len(), 1);
        assert!(state.cart.cart.is_none());
    }

    #[test]
    fn sign_out_clears_every_slice() {
        let mut state = AppState::default();
        state.addresses.entities.push(address("a1"));
        state.cart.cart = Some(Cart {
            id: "cart-1".to_string(),
            user_id: None,
            items: Vec::new(),
            total_price: 0.0,
        });

        ReducerTest::new(TestReducer::new())
            .with_env(env(MockStorefront::new()))
            .given_state(state)
            .when_action(AppAction::SignedOut)
            .then_state(|s| {
                assert!(s.addresses.is_empty());
                assert!(s.cart.cart.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}

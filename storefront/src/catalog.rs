//! Catalog slice: read-only product browsing.
//!
//! Shares the CRUD state shape and request lifecycle but exposes no
//! mutation; customers cannot create, edit or delete products.

use crate::gateway::CatalogGateway;
use crate::types::Product;
use std::fmt;
use std::marker::PhantomData;
use storefront_core::crud::{CrudOperation, CrudOutcome, EntityState, settle};
use storefront_core::reducer::Reducer;
use storefront_core::{SmallVec, effect::Effect, smallvec};

/// Shown when a catalog rejection carries no server message
pub const CATALOG_FALLBACK: &str = "Unable to load products";

const SLICE: &str = "catalog";

/// Catalog slice state
pub type CatalogState = EntityState<Product>;

/// Catalog slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogAction {
    /// Load every product
    FetchAll,
    /// Load one product and select it
    FetchOne {
        /// Product to load
        id: String,
    },
    /// Select a loaded product, or clear the selection
    Select {
        /// Product to select
        id: Option<String>,
    },
    /// Reset the slice
    ClearState,
    /// A request succeeded
    Fulfilled(CrudOutcome<Product>),
    /// A request failed
    Rejected {
        /// Operation that failed
        operation: CrudOperation,
        /// Message to display
        message: String,
    },
}

impl CatalogAction {
    fn settled(operation: CrudOperation, result: Result<CrudOutcome<Product>, String>) -> Self {
        match result {
            Ok(outcome) => Self::Fulfilled(outcome),
            Err(message) => Self::Rejected { operation, message },
        }
    }
}

/// Reducer of the catalog slice over gateway `G`
pub struct CatalogReducer<G> {
    _gateway: PhantomData<fn() -> G>,
}

impl<G> CatalogReducer<G> {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _gateway: PhantomData,
        }
    }
}

impl<G> Default for CatalogReducer<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> Clone for CatalogReducer<G> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<G> fmt::Debug for CatalogReducer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CatalogReducer")
    }
}

impl<G> Reducer for CatalogReducer<G>
where
    G: CatalogGateway + Clone + 'static,
{
    type State = CatalogState;
    type Action = CatalogAction;
    type Environment = G;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CatalogAction::FetchAll => {
                state.begin(SLICE, CrudOperation::List);
                let gateway = env.clone();
                smallvec![storefront_core::async_effect! {
                    let result = gateway.list_products().await.map(CrudOutcome::Listed);
                    Some(CatalogAction::settled(
                        CrudOperation::List,
                        settle(SLICE, CrudOperation::List, result, CATALOG_FALLBACK),
                    ))
                }]
            },
            CatalogAction::FetchOne { id } => {
                state.begin(SLICE, CrudOperation::Get);
                let gateway = env.clone();
                smallvec![storefront_core::async_effect! {
                    let result = gateway.get_product(&id).await.map(CrudOutcome::Fetched);
                    Some(CatalogAction::settled(
                        CrudOperation::Get,
                        settle(SLICE, CrudOperation::Get, result, CATALOG_FALLBACK),
                    ))
                }]
            },
            CatalogAction::Select { id } => {
                state.selected = id.and_then(|id| state.find(&id).cloned());
                SmallVec::new()
            },
            CatalogAction::ClearState => {
                *state = CatalogState::default();
                SmallVec::new()
            },
            CatalogAction::Fulfilled(outcome) => {
                let message = match outcome.operation() {
                    CrudOperation::Get => "Product loaded",
                    _ => "Products loaded",
                };
                state.fulfill(SLICE, outcome, message);
                SmallVec::new()
            },
            CatalogAction::Rejected { operation, message } => {
                state.reject(SLICE, operation, message);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockStorefront;
    use storefront_testing::{ReducerTest, assertions, helpers};

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            description: String::new(),
            price: 25.0,
            discount: 20.0,
            stock: 4,
            images: Vec::new(),
            category: None,
        }
    }

    fn reducer() -> CatalogReducer<MockStorefront> {
        CatalogReducer::new()
    }

    #[test]
    fn fetch_all_is_pending_with_one_request() {
        ReducerTest::new(reducer())
            .with_env(MockStorefront::new())
            .given_state(CatalogState::default())
            .when_action(CatalogAction::FetchAll)
            .then_state(|s| assert!(s.is_loading()))
            .then_effects(assertions::assert_single_future)
            .run();
    }

    #[tokio::test]
    async fn fetch_all_then_one() {
        let gateway = MockStorefront::new().with_products(vec![product("p1"), product("p2")]);
        let mut state = CatalogState::default();

        let effects = reducer().reduce(&mut state, CatalogAction::FetchAll, &gateway);
        let outcome = helpers::single_action(effects).await;
        reducer().reduce(&mut state, outcome, &gateway);
        assert_eq!(state.len(), 2);
        assert_eq!(state.message(), Some("Products loaded"));

        let effects = reducer().reduce(
            &mut state,
            CatalogAction::FetchOne {
                id: "p2".to_string(),
            },
            &gateway,
        );
        let outcome = helpers::single_action(effects).await;
        reducer().reduce(&mut state, outcome, &gateway);
        assert_eq!(state.selected.as_ref().map(|p| p.id.as_str()), Some("p2"));
        assert_eq!(state.selected.as_ref().map(Product::final_price), Some(20.0));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn rejection_keeps_loaded_products() {
        let mut state = CatalogState::default();
        state.fulfill(SLICE, CrudOutcome::Listed(vec![product("p1")]), "Products loaded");

        ReducerTest::new(reducer())
            .with_env(MockStorefront::new())
            .given_state(state)
            .when_action(CatalogAction::Rejected {
                operation: CrudOperation::List,
                message: "Catalog offline".to_string(),
            })
            .then_state(|s| {
                assert_eq!(s.len(), 1);
                assert!(!s.is_loading());
                assert_eq!(s.error(), Some("Catalog offline"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn missing_product_is_rejected_with_server_message() {
        let gateway = MockStorefront::new();
        let mut state = CatalogState::default();

        let effects = reducer().reduce(
            &mut state,
            CatalogAction::FetchOne {
                id: "nope".to_string(),
            },
            &gateway,
        );
        let outcome = helpers::single_action(effects).await;
        reducer().reduce(&mut state, outcome, &gateway);

        assert!(!state.is_loading());
        assert_eq!(state.error(), Some("Product not found"));
    }
}

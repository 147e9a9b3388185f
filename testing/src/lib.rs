//! # Storefront Testing
//!
//! Testing utilities and helpers for the storefront client state.
//!
//! This crate provides:
//! - A deterministic [`Clock`] for reducers that read the time
//! - [`ReducerTest`], a Given-When-Then builder for reducer unit tests
//! - Helpers that resolve effects without a running Store
//!
//! ## Example
//!
//! ```ignore
//! use storefront_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(CartReducer)
//!     .with_env(test_environment())
//!     .given_state(cart_with_one_item())
//!     .when_action(CartAction::Decrement { product_id })
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use storefront_core::environment::Clock;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use storefront_testing::mocks::FixedClock;
    /// use storefront_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }
}

/// Helpers that run effects outside of a Store
pub mod helpers {
    use storefront_core::effect::Effect;

    /// Resolve effects in order and collect the actions they produce.
    ///
    /// Requests are awaited one after the other. Follow-up requests of the
    /// produced actions are not run.
    pub async fn collect_actions<A, I>(effects: I) -> Vec<A>
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut actions = Vec::new();
        for effect in effects {
            if let Effect::Future(request) = effect {
                actions.extend(request.await);
            }
        }
        actions
    }

    /// Resolve effects and return the single action they produce.
    ///
    /// # Panics
    ///
    /// Panics unless exactly one action is produced.
    #[allow(clippy::panic)] // Test helper
    pub async fn single_action<A, I>(effects: I) -> A
    where
        A: std::fmt::Debug,
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut actions = collect_actions(effects).await;
        assert_eq!(actions.len(), 1, "Expected one action, got {actions:?}");
        match actions.pop() {
            Some(action) => action,
            None => panic!("Expected one action"),
        }
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

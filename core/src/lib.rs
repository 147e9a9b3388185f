//! # Storefront Core
//!
//! Core traits and types for the storefront client state layer.
//!
//! Client state is split into *slices*. Each slice owns a state shape and a
//! reducer; asynchronous work (one REST call per operation) is described as
//! an [`Effect`](effect::Effect) and executed by the runtime, which feeds the
//! resulting action back into the reducer.
//!
//! ## Core Concepts
//!
//! - **State**: The data a slice mirrors from the server
//! - **Action**: Every input a slice reacts to (requests and their outcomes)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of a side effect (not its execution)
//! - **Environment**: Injected gateways and clocks
//!
//! ## Request Lifecycle
//!
//! Every remote operation moves through three phases:
//!
//! 1. **pending**: applied synchronously when the request action is reduced
//! 2. **fulfilled**: the effect resolved, the result is merged into state
//! 3. **rejected**: the effect failed, a human readable message is stored
//!
//! The [`crud`] module packages this lifecycle for entity collections.
//!
//! ## Example
//!
//! ```ignore
//! use storefront_core::crud::{CrudAction, CrudReducer, EntityState};
//!
//! let reducer = CrudReducer::new("address", ADDRESS_MESSAGES);
//! let mut state = EntityState::default();
//! let effects = reducer.reduce(&mut state, CrudAction::FetchAll, &gateway);
//! assert!(state.request.is_loading());
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Reducer composition (pulling slices back into a parent domain)
pub mod composition;

/// Generic async CRUD slice
pub mod crud;

/// Request lifecycle state shared by all slices
pub mod request;

/// Effect construction macros
mod effect_macros;

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They hold every state transition of a slice and never perform I/O
/// themselves. Network calls are returned as effects.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for slice logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The slice state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for CartReducer {
    ///     type State = CartState;
    ///     type Action = CartAction;
    ///     type Environment = CartEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut CartState,
    ///         action: CartAction,
    ///         env: &CartEnvironment,
    ///     ) -> SmallVec<[Effect<CartAction>; 4]> {
    ///         match action {
    ///             CartAction::Fetch => {
    ///                 state.request.begin();
    ///                 smallvec![fetch_cart(env)]
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe the requests a reducer wants performed. They are values;
/// the runtime executes them and feeds the action they resolve to back into
/// the reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Boxed future produced by an [`Effect::Future`].
    pub type BoxedActionFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// A side effect to be executed by the Store runtime
    ///
    /// Reducers return several effects at once when they need concurrent
    /// requests; the runtime starts all of them.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// One async request
        ///
        /// Resolves to `Option<Action>`; `Some` is fed back into the reducer
        Future(BoxedActionFuture<Action>),
    }

    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Transform the action this effect produces
        ///
        /// Used to lift a slice effect into the action type of a parent reducer.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            Action: Send + 'static,
            B: Send + 'static,
            F: Fn(Action) -> B + Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Future(fut) => Effect::Future(Box::pin(async move { fut.await.map(f) })),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

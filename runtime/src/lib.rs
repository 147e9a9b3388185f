//! # Storefront Runtime
//!
//! Runtime for the storefront client state.
//!
//! The [`Store`] owns the state of a reducer, runs the requests the reducer
//! returns as effects and feeds each outcome back into the reducer.
//!
//! ## Core Components
//!
//! - **Store**: Single writer of the state; serializes reducer calls
//! - **`EffectHandle`**: Completes when a dispatched action has fully settled,
//!   follow-up requests included
//! - **Retry**: Linear backoff for the few operations that retry
//!
//! ## Example
//!
//! ```ignore
//! use storefront_runtime::Store;
//!
//! let store = Store::new(AppState::default(), AppReducer::new(), environment);
//!
//! // Dispatch a request; the pending phase is applied before `send` returns
//! let mut handle = store.send(AppAction::Cart(CartAction::Fetch)).await?;
//!
//! // Wait for the request to settle
//! handle.wait().await;
//! let total = store.state(|s| s.cart.total_price()).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Retry logic with backoff
pub mod retry;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors returned by the [`Store`](crate::Store)
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The store no longer accepts actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Requests were still running when the shutdown timeout expired
        #[error("Shutdown timed out with {0} request(s) in flight")]
        ShutdownTimeout(usize),

        /// No matching action arrived in time
        #[error("Timed out waiting for an action")]
        Timeout,

        /// The action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;
pub use retry::{RetryPolicy, retry_with_backoff};

/// Count of running effects that wakes waiters when it drops to zero.
///
/// Clones share the same count.
#[derive(Clone)]
struct InFlight {
    count: Arc<AtomicUsize>,
    idle: Arc<watch::Sender<()>>,
}

impl InFlight {
    fn new() -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(watch::Sender::new(())),
        }
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Counts one effect until the returned guard drops
    fn start(&self) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(self.clone())
    }

    async fn wait_idle(&self) {
        // Subscribe first so a drop to zero after the check still wakes us
        let mut idle = self.idle.subscribe();
        while self.count() > 0 {
            if idle.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Ends the effect it was started for, even if the effect panics.
struct InFlightGuard(InFlight);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.send_replace(());
        }
    }
}

/// Completion handle of one dispatched action
///
/// Returned by [`Store::send`]. The handle tracks the requests started by
/// the action and, transitively, the requests started by the outcomes they
/// feed back. An avatar upload followed by the profile save it triggers is
/// one flow for its handle.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(AppAction::Address(CrudAction::FetchAll)).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // The list request has settled
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    in_flight: InFlight,
}

impl EffectHandle {
    fn new() -> Self {
        Self {
            in_flight: InFlight::new(),
        }
    }

    /// A handle with nothing to wait for
    #[must_use]
    pub fn completed() -> Self {
        Self::new()
    }

    /// Number of requests of this flow still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.count()
    }

    /// Wait until every request of this flow has settled
    pub async fn wait(&mut self) {
        self.in_flight.wait_idle().await;
    }

    /// Wait until every request of this flow has settled, or `timeout` expires
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if requests are still running after `timeout`.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{EffectHandle, InFlight, StoreError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use storefront_core::{effect::Effect, reducer::Reducer};
    use tokio::sync::{RwLock, broadcast};

    /// Single writer of the client state
    ///
    /// The Store holds:
    /// 1. State (behind `RwLock`, written only by the reducer)
    /// 2. Reducer and environment (gateways, clock, storage)
    /// 3. The requests in flight, for handles and shutdown
    /// 4. A broadcast of every outcome once it has been reduced
    ///
    /// Requests are neither cancelled nor sequenced: when two requests of the
    /// same slice are in flight, their outcomes are reduced in arrival order.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        closing: Arc<AtomicBool>,
        in_flight: InFlight,
        outcomes: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a store; the outcome broadcast buffers 16 actions
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a store whose outcome broadcast buffers `capacity` actions
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (outcomes, _) = broadcast::channel(capacity);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                closing: Arc::new(AtomicBool::new(false)),
                in_flight: InFlight::new(),
                outcomes,
            }
        }

        /// Stop accepting actions and wait for the requests in flight
        ///
        /// Outcomes that arrive after this call are dropped.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if requests are still running
        /// after `timeout`.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!(in_flight = self.in_flight.count(), "store shutting down");
            self.closing.store(true, Ordering::Release);

            if tokio::time::timeout(timeout, self.in_flight.wait_idle())
                .await
                .is_err()
            {
                let pending = self.in_flight.count();
                tracing::error!(pending, "shutdown timed out");
                return Err(StoreError::ShutdownTimeout(pending));
            }

            tracing::info!("store shut down");
            Ok(())
        }

        /// Dispatch an action
        ///
        /// The reducer runs under the write lock before this returns, so a
        /// request's pending phase is visible immediately. The returned handle
        /// completes once the request and every follow-up it triggers settle.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            let handle = EffectHandle::new();
            self.dispatch(action, &handle.in_flight).await?;
            Ok(handle)
        }

        /// Dispatch an action and wait for the first outcome matching `predicate`
        ///
        /// The returned outcome has already been reduced.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching outcome within `timeout`
        /// - [`StoreError::ChannelClosed`]: the outcome broadcast closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        ///
        /// # Example
        ///
        /// ```ignore
        /// let outcome = store.send_and_wait_for(
        ///     AppAction::Address(CrudAction::FetchAll),
        ///     |a| matches!(a, AppAction::Address(CrudAction::Fulfilled(_) | CrudAction::Rejected { .. })),
        ///     Duration::from_secs(10),
        /// ).await?;
        /// ```
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut outcomes = self.outcomes.subscribe();
            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match outcomes.recv().await {
                        Ok(outcome) if predicate(&outcome) => return Ok(outcome),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "outcome observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Observe outcomes after they have been reduced
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.outcomes.subscribe()
        }

        /// Read the state through a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.addresses.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Reduce `action` and start its effects under `flow`
        async fn dispatch(&self, action: A, flow: &InFlight) -> Result<(), StoreError> {
            if self.closing.load(Ordering::Acquire) {
                tracing::warn!("action rejected: store is shutting down");
                return Err(StoreError::ShutdownInProgress);
            }
            metrics::counter!("store.commands.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;
                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                effects
            };
            tracing::trace!(effects = effects.len(), "reduced");

            for effect in effects {
                self.start_effect(effect, flow);
            }
            Ok(())
        }

        /// Run one effect on a Tokio task, counted in `flow` and in the store
        fn start_effect(&self, effect: Effect<A>, flow: &InFlight) {
            let Effect::Future(request) = effect else {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                return;
            };
            metrics::counter!("store.effects.executed", "type" => "future").increment(1);

            let guards = (flow.start(), self.in_flight.start());
            let flow = flow.clone();
            let store = self.clone();

            tokio::spawn(async move {
                // Follow-up effects join `flow` before these guards drop
                let _guards = guards;
                match request.await {
                    Some(outcome) => store.feed_back(outcome, &flow).await,
                    None => tracing::trace!("effect finished without an outcome"),
                }
            });
        }

        /// Reduce an outcome in the flow that produced it, then broadcast it
        async fn feed_back(&self, outcome: A, flow: &InFlight) {
            match self.dispatch(outcome.clone(), flow).await {
                Ok(()) => {
                    let _ = self.outcomes.send(outcome);
                },
                Err(error) => tracing::warn!(%error, "dropped outcome of a request"),
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                closing: Arc::clone(&self.closing),
                in_flight: self.in_flight.clone(),
                outcomes: self.outcomes.clone(),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can unwrap

    use super::*;
    use storefront_core::effect::Effect;
    use storefront_core::reducer::Reducer;
    use storefront_core::{SmallVec, smallvec};

    /// Cart-like slice: adding an item is confirmed, then the cart is reloaded.
    #[derive(Debug, Clone, Default)]
    struct CartState {
        loading: bool,
        items: u32,
        log: Vec<&'static str>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum CartAction {
        Fetch,
        AddItem,
        ItemAdded,
        Loaded(u32),
        Forget,
    }

    #[derive(Clone)]
    struct CartReducer;

    fn respond(action: CartAction) -> Effect<CartAction> {
        Effect::Future(Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Some(action)
        }))
    }

    impl Reducer for CartReducer {
        type State = CartState;
        type Action = CartAction;
        type Environment = u32;

        fn reduce(
            &self,
            state: &mut CartState,
            action: CartAction,
            server_items: &u32,
        ) -> SmallVec<[Effect<CartAction>; 4]> {
            state.log.push(match action {
                CartAction::Fetch => "fetch",
                CartAction::AddItem => "add",
                CartAction::ItemAdded => "added",
                CartAction::Loaded(_) => "loaded",
                CartAction::Forget => "forget",
            });
            match action {
                CartAction::Fetch => {
                    state.loading = true;
                    smallvec![respond(CartAction::Loaded(*server_items))]
                },
                CartAction::AddItem => {
                    state.loading = true;
                    smallvec![respond(CartAction::ItemAdded)]
                },
                CartAction::ItemAdded => smallvec![respond(CartAction::Loaded(*server_items + 1))],
                CartAction::Loaded(items) => {
                    state.loading = false;
                    state.items = items;
                    SmallVec::new()
                },
                CartAction::Forget => smallvec![
                    Effect::None,
                    Effect::Future(Box::pin(async { None })),
                ],
            }
        }
    }

    fn store() -> Store<CartState, CartAction, u32, CartReducer> {
        Store::new(CartState::default(), CartReducer, 2)
    }

    #[tokio::test]
    async fn pending_is_visible_before_the_outcome() {
        let store = store();
        let mut handle = store.send(CartAction::Fetch).await.unwrap();

        assert!(store.state(|s| s.loading).await);
        assert_eq!(handle.pending(), 1);

        handle.wait().await;
        let state = store.state(Clone::clone).await;
        assert!(!state.loading);
        assert_eq!(state.items, 2);
        assert_eq!(state.log, vec!["fetch", "loaded"]);
    }

    #[tokio::test]
    async fn handle_waits_for_follow_up_requests() {
        let store = store();
        let mut handle = store.send(CartAction::AddItem).await.unwrap();

        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();

        let state = store.state(Clone::clone).await;
        assert_eq!(state.log, vec!["add", "added", "loaded"]);
        assert_eq!(state.items, 3);
        assert!(!state.loading);
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn effects_without_outcome_complete_the_handle() {
        let store = store();
        let mut handle = store.send(CartAction::Forget).await.unwrap();

        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(store.state(|s| s.log.clone()).await, vec!["forget"]);
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_a_reduced_outcome() {
        let store = store();
        let outcome = store
            .send_and_wait_for(
                CartAction::Fetch,
                |a| matches!(a, CartAction::Loaded(_)),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(outcome, CartAction::Loaded(2));
        assert_eq!(store.state(|s| s.items).await, 2);
    }

    #[tokio::test]
    async fn outcomes_dropped_by_shutdown_are_not_broadcast() {
        let store = store();
        let mut outcomes = store.subscribe_actions();

        store.send(CartAction::Fetch).await.unwrap();
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert!(store.state(|s| s.loading).await);
        assert!(outcomes.try_recv().is_err());
        assert!(matches!(
            store.send(CartAction::Fetch).await,
            Err(StoreError::ShutdownInProgress)
        ));
    }

    #[tokio::test]
    async fn completed_handle_does_not_block() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        handle.wait().await;
    }
}

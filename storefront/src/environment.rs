//! Dependencies injected into the storefront reducers.

use std::sync::Arc;
use storefront_core::environment::{Clock, SystemClock};
use storefront_runtime::RetryPolicy;

/// Environment shared by all storefront slices
///
/// Slices reach the part they need through projections: the CRUD, cart and
/// catalog slices only see `gateway`; the profile slice uses everything.
#[derive(Clone)]
pub struct StorefrontEnvironment<G, S> {
    /// REST endpoints
    pub gateway: G,
    /// Object storage for avatar pictures
    pub storage: S,
    /// Clock used to name uploaded objects
    pub clock: Arc<dyn Clock>,
    /// Retry policy of avatar uploads
    pub avatar_retry: RetryPolicy,
}

impl<G, S> StorefrontEnvironment<G, S> {
    /// Environment with the wall clock and 3 linear upload attempts
    #[must_use]
    pub fn new(gateway: G, storage: S) -> Self {
        Self {
            gateway,
            storage,
            clock: Arc::new(SystemClock),
            avatar_retry: RetryPolicy::default(),
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the avatar upload retry policy
    #[must_use]
    pub fn with_avatar_retry(mut self, policy: RetryPolicy) -> Self {
        self.avatar_retry = policy;
        self
    }
}

impl<G: std::fmt::Debug, S: std::fmt::Debug> std::fmt::Debug for StorefrontEnvironment<G, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontEnvironment")
            .field("gateway", &self.gateway)
            .field("storage", &self.storage)
            .field("avatar_retry", &self.avatar_retry)
            .finish_non_exhaustive()
    }
}

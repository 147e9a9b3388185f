//! Reducer composition utilities
//!
//! Slices are written against their own state, action and environment.
//! [`pullback`] lifts a slice reducer into a parent domain:
//!
//! - a **state lens** borrows the slice state out of the parent state
//! - an **extract** function picks the slice action out of a parent action
//! - an **embed** function wraps effects' actions back into the parent action
//! - an **environment projection** borrows the slice dependencies
//!
//! # Example
//!
//! ```
//! use storefront_core::composition::pullback;
//! use storefront_core::effect::Effect;
//! use storefront_core::reducer::Reducer;
//! use storefront_core::SmallVec;
//!
//! #[derive(Clone, Default)]
//! struct CounterState {
//!     count: i32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! #[derive(Clone)]
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut CounterState, _action: CounterAction, _env: &()) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         state.count += 1;
//!         SmallVec::new()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct AppState {
//!     counter: CounterState,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum AppAction {
//!     Counter(CounterAction),
//!     Other,
//! }
//!
//! let lifted = pullback(
//!     CounterReducer,
//!     |app: &mut AppState| &mut app.counter,
//!     |action: AppAction| match action {
//!         AppAction::Counter(inner) => Some(inner),
//!         AppAction::Other => None,
//!     },
//!     AppAction::Counter,
//!     |env: &()| env,
//! );
//!
//! let mut state = AppState::default();
//! let _ = lifted.reduce(&mut state, AppAction::Counter(CounterAction::Increment), &());
//! let _ = lifted.reduce(&mut state, AppAction::Other, &());
//! assert_eq!(state.counter.count, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Lifts a slice reducer into a parent state, action and environment.
///
/// Parent actions for which `extract` returns `None` are ignored and
/// produce no effects.
pub fn pullback<R, S, A, E>(
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    extract: fn(A) -> Option<R::Action>,
    embed: fn(R::Action) -> A,
    environment: fn(&E) -> &R::Environment,
) -> Pullback<R, S, A, E>
where
    R: Reducer,
{
    Pullback {
        reducer,
        state,
        extract,
        embed,
        environment,
    }
}

/// A slice reducer lifted into a parent domain.
///
/// Created by [`pullback`].
pub struct Pullback<R, S, A, E>
where
    R: Reducer,
{
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    extract: fn(A) -> Option<R::Action>,
    embed: fn(R::Action) -> A,
    environment: fn(&E) -> &R::Environment,
}

impl<R, S, A, E> Clone for Pullback<R, S, A, E>
where
    R: Reducer + Clone,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            state: self.state,
            extract: self.extract,
            embed: self.embed,
            environment: self.environment,
        }
    }
}

impl<R, S, A, E> Reducer for Pullback<R, S, A, E>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let effects = self
            .reducer
            .reduce((self.state)(state), action, (self.environment)(env));

        effects
            .into_iter()
            .map(|effect| effect.map(self.embed))
            .collect()
    }
}

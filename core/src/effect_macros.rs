//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when a reducer hands an async request to
//! the runtime.

/// Create an `Effect::Future` from an async body
///
/// The body is moved into an `async move` block and must evaluate to
/// `Option<Action>`.
///
/// # Example
///
/// ```rust,ignore
/// use storefront_core::async_effect;
///
/// let gateway = env.clone();
/// async_effect! {
///     match gateway.list().await {
///         Ok(addresses) => Some(AddressAction::Loaded(addresses)),
///         Err(error) => Some(AddressAction::Rejected(error.to_string())),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move { $($body)* }))
    };
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)] // Test code can panic

    use crate::effect::Effect;

    #[test]
    fn async_effect_builds_future() {
        let value = 7;
        let effect: Effect<i32> = async_effect! { Some(value * 2) };

        let Effect::Future(fut) = effect else {
            panic!("expected Effect::Future");
        };
        assert_eq!(tokio_test::block_on(fut), Some(14));
    }
}

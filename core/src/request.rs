//! Request lifecycle tracking.
//!
//! Every slice carries a [`RequestState`] describing the most recent remote
//! operation: whether it is still in flight, and the success message or the
//! error to show inline.

use serde::{Deserialize, Serialize};

/// Phase of the most recent remote operation of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Nothing requested yet (or the slice was cleared)
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// The last request was fulfilled
    Succeeded,
    /// The last request was rejected
    Failed,
}

/// Loading flag, error and success message of a slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestState {
    /// Current lifecycle phase
    pub status: RequestStatus,
    /// Human readable error of the last rejected request or failed validation
    pub error: Option<String>,
    /// Success message of the last fulfilled request
    pub message: Option<String>,
}

impl RequestState {
    /// Pending phase: loading, prior error and message cleared.
    pub fn begin(&mut self) {
        self.status = RequestStatus::Loading;
        self.error = None;
        self.message = None;
    }

    /// Fulfilled phase.
    pub fn succeed(&mut self, message: impl Into<String>) {
        self.status = RequestStatus::Succeeded;
        self.error = None;
        self.message = Some(message.into());
    }

    /// Rejected phase.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = RequestStatus::Failed;
        self.error = Some(error.into());
    }

    /// Client-side validation failure.
    ///
    /// No request was issued, so the lifecycle phase is left untouched.
    pub fn invalid(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.message = None;
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == RequestStatus::Loading
    }

    /// Back to [`RequestStatus::Idle`] with no error or message.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Errors that may carry a message written by the server for end users.
pub trait ServerMessage {
    /// The server provided message, if the failure carried one.
    fn server_message(&self) -> Option<&str>;
}

/// Message shown for a rejected request.
///
/// Prefers the server provided message and falls back to `fallback` when the
/// failure carried none (network errors, empty bodies).
#[must_use]
pub fn rejection_message<E: ServerMessage + ?Sized>(error: &E, fallback: &str) -> String {
    error
        .server_message()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failure(Option<&'static str>);

    impl ServerMessage for Failure {
        fn server_message(&self) -> Option<&str> {
            self.0
        }
    }

    #[test]
    fn begin_clears_previous_outcome() {
        let mut request = RequestState::default();
        request.fail("boom");
        request.begin();

        assert!(request.is_loading());
        assert_eq!(request.error, None);
        assert_eq!(request.message, None);
    }

    #[test]
    fn terminal_phases_are_not_loading() {
        let mut request = RequestState::default();
        request.begin();
        request.succeed("done");
        assert!(!request.is_loading());
        assert_eq!(request.message.as_deref(), Some("done"));

        request.begin();
        request.fail("nope");
        assert!(!request.is_loading());
        assert_eq!(request.status, RequestStatus::Failed);
    }

    #[test]
    fn invalid_keeps_phase() {
        let mut request = RequestState::default();
        request.begin();
        request.succeed("ok");
        request.invalid("Quantity must be at least 1");

        assert_eq!(request.status, RequestStatus::Succeeded);
        assert_eq!(request.error.as_deref(), Some("Quantity must be at least 1"));
        assert_eq!(request.message, None);
    }

    #[test]
    fn rejection_message_prefers_server_text() {
        assert_eq!(rejection_message(&Failure(Some("Address not found")), "fallback"), "Address not found");
        assert_eq!(rejection_message(&Failure(Some("   ")), "fallback"), "fallback");
        assert_eq!(rejection_message(&Failure(None), "fallback"), "fallback");
    }
}

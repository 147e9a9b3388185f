//! Wire envelopes of the storefront API

use serde::Deserialize;

/// Successful response: `{ "data": <payload> }`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// Payload
    pub data: T,
}

/// Error response: `{ "message": <string> }`
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    /// User-facing message, when the server wrote one
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Extract the message from a raw error body
    ///
    /// Bodies that are not JSON or carry no message yield `None`.
    #[must_use]
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<Self>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            ErrorBody::message_from(r#"{"message":"Out of stock"}"#),
            Some("Out of stock".to_string())
        );
        assert_eq!(ErrorBody::message_from(r#"{"message":""}"#), None);
        assert_eq!(ErrorBody::message_from("<html>Bad Gateway</html>"), None);
        assert_eq!(ErrorBody::message_from(r#"{"error":"x"}"#), None);
    }
}

//! Delivery of encoded messages.
//!
//! [`Transport`] is the seam between the send orchestration and the network.
//! [`GmailTransport`] posts to the Gmail REST API; tests substitute their own.

mod gmail;

pub use gmail::{GMAIL_SEND_URL, GmailTransport};

use std::future::Future;
use thiserror::Error;

/// Reply from a transport that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Reason phrase for the status.
    pub status_text: String,
    /// URL the message was delivered to.
    pub request_url: Option<String>,
    /// Parsed response body, when there was one.
    pub body: Option<serde_json::Value>,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A transport that could not complete the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct TransportError {
    /// What went wrong.
    pub description: String,
    /// Status code, when the failure carried one.
    pub status: Option<u16>,
}

impl TransportError {
    /// Creates an error without a status.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            description: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

impl From<gmailer_auth::Error> for TransportError {
    fn from(err: gmailer_auth::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Sends a Base64url-encoded MIME message.
///
/// A reply with a non-2xx status is still `Ok`; `Err` is reserved for
/// exchanges that produced no reply.
pub trait Transport: Send + Sync {
    /// Delivers the encoded message.
    fn send_raw(
        &self,
        raw: &str,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let mut response = TransportResponse {
            status: 200,
            status_text: "OK".into(),
            request_url: None,
            body: None,
        };
        assert!(response.is_success());
        response.status = 299;
        assert!(response.is_success());
        response.status = 300;
        assert!(!response.is_success());
        response.status = 429;
        assert!(!response.is_success());
    }

    #[test]
    fn test_error_display_is_description() {
        assert_eq!(TransportError::new("rate limited").to_string(), "rate limited");
    }
}

//! Diagnostic events emitted while sending.
//!
//! A send never fails with an error; instead every rejected precondition,
//! encoding failure and transport outcome is reported to a
//! [`DiagnosticHandler`] alongside the returned [`SendResult`](crate::SendResult).
//!
//! # Example
//!
//! ```ignore
//! use gmailer_core::{DiagnosticHandler, Mailer, MailerConfig};
//!
//! struct Counter(std::sync::atomic::AtomicUsize);
//!
//! impl DiagnosticHandler for Counter {
//!     fn on_sent(&self, _recipient: &str, _status: u16) {
//!         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!     }
//! }
//! ```

use std::sync::Mutex;

/// A send request rejected before any encoding or network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// No transport has been attached.
    ClientNotInitialized,
    /// Neither the request nor the configuration names a sender.
    SenderNotConfigured,
    /// The message body is empty.
    EmptyMessage,
    /// The recipient is empty.
    EmptyRecipient,
    /// A sender, recipient or attachment header value contains a line break.
    InvalidHeaderValue,
}

impl Precondition {
    /// Returns the caller-facing description.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ClientNotInitialized => {
                "The Gmail client has not been initialized. Please call initialize first."
            }
            Self::SenderNotConfigured => "Sender email not configured. Please provide a sender email.",
            Self::EmptyMessage => "A message body must be provided.",
            Self::EmptyRecipient => "A recipient email must be provided.",
            Self::InvalidHeaderValue => {
                "Sender, recipient and attachment names must not contain line breaks."
            }
        }
    }
}

/// Receives diagnostic events from a [`Mailer`](crate::Mailer).
///
/// All methods have empty defaults. Handlers are shared between concurrent
/// sends and so take `&self`.
pub trait DiagnosticHandler: Send + Sync {
    /// Called when a request is rejected before encoding.
    fn on_precondition_failed(&self, failure: Precondition) {
        let _ = failure;
    }

    /// Called when a request without a subject gets the default one.
    fn on_subject_defaulted(&self, recipient: &str) {
        let _ = recipient;
    }

    /// Called when the message could not be assembled or encoded.
    fn on_encoding_failed(&self, reason: &str) {
        let _ = reason;
    }

    /// Called when the transport failed or returned a non-success status.
    fn on_send_failed(&self, recipient: &str, reason: &str) {
        let _ = (recipient, reason);
    }

    /// Called after the transport accepted the message.
    fn on_sent(&self, recipient: &str, status: u16) {
        let _ = (recipient, status);
    }
}

/// A handler that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl DiagnosticHandler for NoopHandler {}

/// A handler that logs events using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl DiagnosticHandler for LoggingHandler {
    fn on_precondition_failed(&self, failure: Precondition) {
        tracing::warn!(?failure, "{}", failure.message());
    }

    fn on_subject_defaulted(&self, recipient: &str) {
        tracing::debug!(recipient, "No subject provided, using default");
    }

    fn on_encoding_failed(&self, reason: &str) {
        tracing::error!(reason, "Failed to encode MIME message");
    }

    fn on_send_failed(&self, recipient: &str, reason: &str) {
        tracing::error!(recipient, reason, "Failed to send email");
    }

    fn on_sent(&self, recipient: &str, status: u16) {
        tracing::info!(recipient, status, "Email sent");
    }
}

/// A diagnostic event recorded by [`CollectingHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// A precondition failed.
    PreconditionFailed(Precondition),
    /// The default subject was substituted.
    SubjectDefaulted(String),
    /// Encoding failed.
    EncodingFailed(String),
    /// Sending failed.
    SendFailed {
        /// Intended recipient.
        recipient: String,
        /// Failure description.
        reason: String,
    },
    /// The message was accepted.
    Sent {
        /// Recipient.
        recipient: String,
        /// Transport status code.
        status: u16,
    },
}

/// A handler that collects events for later inspection.
#[derive(Debug, Default)]
pub struct CollectingHandler {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CollectingHandler {
    /// Creates an empty collecting handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all collected events, leaving the handler empty.
    pub fn take(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    fn push(&self, event: DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl DiagnosticHandler for CollectingHandler {
    fn on_precondition_failed(&self, failure: Precondition) {
        self.push(DiagnosticEvent::PreconditionFailed(failure));
    }

    fn on_subject_defaulted(&self, recipient: &str) {
        self.push(DiagnosticEvent::SubjectDefaulted(recipient.to_string()));
    }

    fn on_encoding_failed(&self, reason: &str) {
        self.push(DiagnosticEvent::EncodingFailed(reason.to_string()));
    }

    fn on_send_failed(&self, recipient: &str, reason: &str) {
        self.push(DiagnosticEvent::SendFailed {
            recipient: recipient.to_string(),
            reason: reason.to_string(),
        });
    }

    fn on_sent(&self, recipient: &str, status: u16) {
        self.push(DiagnosticEvent::Sent {
            recipient: recipient.to_string(),
            status,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_handler_take() {
        let handler = CollectingHandler::new();
        handler.on_precondition_failed(Precondition::EmptyMessage);
        handler.on_sent("a@b.co", 200);

        let events = handler.take();
        assert_eq!(
            events,
            vec![
                DiagnosticEvent::PreconditionFailed(Precondition::EmptyMessage),
                DiagnosticEvent::Sent {
                    recipient: "a@b.co".into(),
                    status: 200
                },
            ]
        );
        assert!(handler.take().is_empty());
    }

    #[test]
    fn test_noop_handler_accepts_everything() {
        let handler = NoopHandler;
        handler.on_precondition_failed(Precondition::ClientNotInitialized);
        handler.on_subject_defaulted("a@b.co");
        handler.on_encoding_failed("too large");
        handler.on_send_failed("a@b.co", "rate limited");
        handler.on_sent("a@b.co", 200);
    }

    #[test]
    fn test_precondition_messages() {
        assert!(
            Precondition::ClientNotInitialized
                .message()
                .contains("not been initialized")
        );
        assert!(
            Precondition::SenderNotConfigured
                .message()
                .contains("Sender email not configured")
        );
    }
}

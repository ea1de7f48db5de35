//! Send requests and their normalized results.

use gmailer_mime::Attachment;
use serde::Serialize;

/// A single email to send.
#[derive(Debug, Clone, Default)]
pub struct SendEmailRequest {
    /// Recipient address. Not format-checked.
    pub recipient_email: String,
    /// Body; HTML is detected automatically.
    pub message: String,
    /// Subject; the default subject is used when absent or empty.
    pub subject: Option<String>,
    /// Sender; the configured default is used when absent or empty.
    pub sender_email: Option<String>,
    /// Display name for the sender.
    pub sender_name: Option<String>,
    /// Attachments.
    pub attachments: Vec<Attachment>,
}

impl SendEmailRequest {
    /// Creates a request with a recipient and body.
    #[must_use]
    pub fn new(recipient_email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient_email: recipient_email.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the sender address.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender_email = Some(sender.into());
        self
    }

    /// Sets the sender display name.
    #[must_use]
    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Outcome of a send.
///
/// Every field is always present; the optional ones serialize as `null`
/// when absent. `sent` is true only for a 2xx transport response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    /// Whether the message was accepted.
    pub sent: bool,
    /// Transport status code.
    pub status: Option<u16>,
    /// Transport status text.
    pub status_text: Option<String>,
    /// URL the request was sent to.
    pub response_url: Option<String>,
    /// Human-readable outcome.
    pub message: String,
    /// Transport response body, for successful sends.
    pub raw_response: Option<serde_json::Value>,
}

impl SendResult {
    /// A failed result with every transport field empty.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            sent: false,
            status: None,
            status_text: None,
            response_url: None,
            message: message.into(),
            raw_response: None,
        }
    }

    /// Whether this result reports a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.sent
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let request = SendEmailRequest::new("to@example.com", "Hi")
            .with_subject("Hello")
            .with_sender("from@example.com")
            .with_sender_name("Sender")
            .with_attachment(Attachment::new("a.txt", "text/plain", "hello"));

        assert_eq!(request.recipient_email, "to@example.com");
        assert_eq!(request.subject.as_deref(), Some("Hello"));
        assert_eq!(request.sender_email.as_deref(), Some("from@example.com"));
        assert_eq!(request.sender_name.as_deref(), Some("Sender"));
        assert_eq!(request.attachments.len(), 1);
    }

    #[test]
    fn test_failure_serializes_nulls() {
        let result = SendResult::failure("nope");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["sent"], false);
        assert_eq!(json["message"], "nope");
        for key in ["status", "statusText", "responseUrl", "rawResponse"] {
            assert!(json[key].is_null(), "{key} should be null");
        }
    }
}

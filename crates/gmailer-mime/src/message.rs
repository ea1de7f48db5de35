//! MIME message assembly.
//!
//! Produces a multipart RFC 5322 message: headers, one body part whose type
//! follows [`detect_html`], then one part per attachment in list order.
//! The result is always multipart, even without attachments.

use crate::content_type::ContentType;
use crate::detect::detect_html;
use crate::encoding::{
    EncodingResult, encode_attachment, encode_base64, encode_mime_message, encode_subject,
};
use crate::error::{Error, Result};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt::{self, Write as _};

/// Fixed prefix of every boundary token.
pub const BOUNDARY_PREFIX: &str = "----=_NextPart_";

/// Length of the random suffix appended to [`BOUNDARY_PREFIX`].
const BOUNDARY_SUFFIX_LEN: usize = 9;

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// MIME type, e.g. `application/pdf`.
    pub mime_type: String,
    /// Raw text or standard Base64. Raw text is encoded during assembly.
    pub content: String,
}

impl Attachment {
    /// Creates an attachment from text or already-encoded Base64 content.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            content: content.into(),
        }
    }

    /// Creates an attachment from binary data, Base64-encoding it up front.
    #[must_use]
    pub fn from_bytes(filename: impl Into<String>, mime_type: impl Into<String>, data: &[u8]) -> Self {
        Self::new(filename, mime_type, encode_base64(data))
    }
}

/// Everything needed to assemble one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Sender address.
    pub from: String,
    /// Sender display name.
    pub from_name: Option<String>,
    /// Recipient address.
    pub to: String,
    /// Subject; `None` or empty falls back to the default subject.
    pub subject: Option<String>,
    /// Body, HTML or plain text. Inserted verbatim.
    pub body: String,
    /// Attachments, emitted in order.
    pub attachments: Vec<Attachment>,
}

impl OutgoingEmail {
    /// Rejects header values that would break out of their header line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderValue`] naming the first offending field.
    pub fn check_headers(&self) -> Result<()> {
        let mut fields = vec![
            ("From", self.from.as_str()),
            ("From display name", self.from_name.as_deref().unwrap_or_default()),
            ("To", self.to.as_str()),
        ];
        for attachment in &self.attachments {
            fields.push(("attachment filename", attachment.filename.as_str()));
            fields.push(("attachment MIME type", attachment.mime_type.as_str()));
        }

        match fields.into_iter().find(|(_, value)| contains_line_break(value)) {
            Some((field, _)) => Err(Error::InvalidHeaderValue { field }),
            None => Ok(()),
        }
    }
}

/// Whether `value` contains a CR or LF.
#[must_use]
pub fn contains_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// An assembled, not yet transport-encoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeMessage {
    raw: String,
    boundary: String,
    content_type: ContentType,
}

impl MimeMessage {
    /// Returns the raw message text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the boundary token separating parts.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns the top-level content type.
    #[must_use]
    pub const fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Consumes the message, returning the raw text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.raw
    }

    /// Encodes the message as the URL-safe transport payload.
    #[must_use]
    pub fn encode(&self, max_size: usize) -> EncodingResult {
        encode_mime_message(&self.raw, max_size)
    }
}

impl fmt::Display for MimeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Generates a boundary token: fixed prefix plus a random alphanumeric suffix.
///
/// Not a security token; a thread-local PRNG is enough.
#[must_use]
pub fn generate_boundary() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{BOUNDARY_PREFIX}{suffix}")
}

/// Assembles a multipart message with a fresh boundary.
///
/// # Errors
///
/// Returns an error if a header value contains a line break or an
/// attachment cannot be normalized to Base64.
pub fn build_mime_message(email: &OutgoingEmail) -> Result<MimeMessage> {
    build_with_boundary(email, generate_boundary())
}

/// Assembles a multipart message using the given boundary.
///
/// # Errors
///
/// Returns an error if a header value contains a line break or an
/// attachment cannot be normalized to Base64.
pub fn build_with_boundary(email: &OutgoingEmail, boundary: String) -> Result<MimeMessage> {
    email.check_headers()?;
    let subject = encode_subject(email.subject.as_deref().unwrap_or_default());
    let content_type = if email.attachments.is_empty() {
        ContentType::multipart_alternative(boundary.as_str())
    } else {
        ContentType::multipart_mixed(boundary.as_str())
    };
    let body_type = if detect_html(&email.body).is_html {
        ContentType::text_html()
    } else {
        ContentType::text_plain()
    };

    let mut raw = String::new();

    // Headers
    let _ = write!(raw, "From: {}\r\n", format_sender(&email.from, email.from_name.as_deref()));
    let _ = write!(raw, "To: {}\r\n", email.to);
    let _ = write!(raw, "Subject: {subject}\r\n");
    raw.push_str("MIME-Version: 1.0\r\n");
    let _ = write!(raw, "Content-Type: {content_type}\r\n\r\n");

    // Body part
    let _ = write!(raw, "--{boundary}\r\nContent-Type: {body_type}\r\n\r\n{}\r\n", email.body);

    for attachment in &email.attachments {
        let encoded = encode_attachment(&attachment.content);
        if !encoded.succeeded {
            return Err(Error::Encoding(format!(
                "attachment '{}': {}",
                attachment.filename, encoded.message
            )));
        }

        let filename = escape_quoted(&attachment.filename);
        let _ = write!(raw, "--{boundary}\r\n");
        let _ = write!(raw, "Content-Type: {}; name=\"{filename}\"\r\n", attachment.mime_type);
        let _ = write!(raw, "Content-Disposition: attachment; filename=\"{filename}\"\r\n");
        raw.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
        let _ = write!(raw, "{}\r\n", encoded.encoded_content);
    }

    let _ = write!(raw, "--{boundary}--");

    Ok(MimeMessage {
        raw,
        boundary,
        content_type,
    })
}

/// Builds and transport-encodes a message in one step.
///
/// # Errors
///
/// Returns an error if assembly fails or the message exceeds `max_size`.
pub fn encode_for_transport(email: &OutgoingEmail, max_size: usize) -> Result<String> {
    build_mime_message(email)?.encode(max_size).into_result()
}

/// Formats the `From:` value: `"Name" <address>` or the bare address.
fn format_sender(address: &str, name: Option<&str>) -> String {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => format!("\"{}\" <{address}>", escape_quoted(name)),
        None => address.to_string(),
    }
}

/// Escapes `\` and `"` for use inside a quoted-string.
fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::encoding::{DEFAULT_MAX_MESSAGE_SIZE, decode_base64_url, decode_encoded_word};

    fn email(body: &str) -> OutgoingEmail {
        OutgoingEmail {
            from: "from@example.com".to_string(),
            to: "to@example.com".to_string(),
            body: body.to_string(),
            ..OutgoingEmail::default()
        }
    }

    #[test]
    fn test_boundary_shape() {
        let boundary = generate_boundary();
        assert!(boundary.starts_with(BOUNDARY_PREFIX));
        let suffix = &boundary[BOUNDARY_PREFIX.len()..];
        assert_eq!(suffix.len(), BOUNDARY_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_plain_message_exact_layout() {
        let mut email = email("hello");
        email.subject = Some("Hi".to_string());
        let message = build_with_boundary(&email, "B".to_string()).unwrap();

        let expected = "From: from@example.com\r\n\
                        To: to@example.com\r\n\
                        Subject: =?utf-8?B?SGk=?=\r\n\
                        MIME-Version: 1.0\r\n\
                        Content-Type: multipart/alternative; boundary=B\r\n\r\n\
                        --B\r\n\
                        Content-Type: text/plain; charset=UTF-8\r\n\r\n\
                        hello\r\n\
                        --B--";
        assert_eq!(message.as_str(), expected);
    }

    #[test]
    fn test_sender_display_name() {
        let mut email = email("hello");
        email.from_name = Some("Jane \"JD\" Doe".to_string());
        let message = build_mime_message(&email).unwrap();
        assert!(message
            .as_str()
            .starts_with("From: \"Jane \\\"JD\\\" Doe\" <from@example.com>\r\n"));
    }

    #[test]
    fn test_missing_subject_defaults() {
        let message = build_mime_message(&email("hello")).unwrap();
        let subject = message
            .as_str()
            .lines()
            .find_map(|l| l.strip_prefix("Subject: "))
            .unwrap();
        assert_eq!(decode_encoded_word(subject).unwrap(), "No Subject");
    }

    #[test]
    fn test_html_body_with_attachments() {
        let mut email = email("<p>hi</p>");
        email.attachments = vec![
            Attachment::new("a.txt", "text/plain", "aGVsbG8="),
            Attachment::new("b.txt", "text/plain", "raw text"),
        ];
        let message = build_mime_message(&email).unwrap();
        let raw = message.as_str();

        assert_eq!(message.content_type().sub_type, "mixed");
        assert!(raw.contains("Content-Type: text/html; charset=UTF-8\r\n\r\n<p>hi</p>\r\n"));
        assert!(raw.contains("Content-Disposition: attachment; filename=\"a.txt\"\r\n"));
        assert!(raw.contains("Content-Transfer-Encoding: base64\r\n\r\naGVsbG8=\r\n"));
        assert!(raw.contains(&format!("\r\n\r\n{}\r\n", encode_base64(b"raw text"))));

        let first = raw.find("a.txt").unwrap();
        let second = raw.find("b.txt").unwrap();
        assert!(first < second);
        assert!(raw.ends_with(&format!("--{}--", message.boundary())));
    }

    #[test]
    fn test_empty_body_passes_through() {
        let message = build_with_boundary(&email(""), "B".to_string()).unwrap();
        assert!(message.as_str().contains("charset=UTF-8\r\n\r\n\r\n--B--"));
    }

    #[test]
    fn test_encode_for_transport_round_trip() {
        let payload = encode_for_transport(&email("hello"), DEFAULT_MAX_MESSAGE_SIZE).unwrap();
        let decoded = String::from_utf8(decode_base64_url(&payload).unwrap()).unwrap();
        assert!(decoded.starts_with("From: from@example.com\r\n"));
        assert!(decoded.contains("\r\nhello\r\n"));
    }

    #[test]
    fn test_encode_for_transport_too_large() {
        let result = encode_for_transport(&email("hello"), 16);
        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[test]
    fn test_attachment_from_bytes() {
        let attachment = Attachment::from_bytes("x.bin", "application/octet-stream", &[0, 159, 255]);
        assert_eq!(attachment.content, "AJ//");
    }

    #[test]
    fn test_recipient_with_line_break_is_refused() {
        let mut email = email("hi");
        email.to = "to@example.com\r\nBcc: someone@elsewhere.test".to_string();
        let err = build_mime_message(&email).unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue { field: "To" }));
    }

    #[test]
    fn test_sender_fields_with_line_break_are_refused() {
        let mut email = email("hi");
        email.from = "from@example.com\nX-Extra: 1".to_string();
        assert!(matches!(
            email.check_headers(),
            Err(Error::InvalidHeaderValue { field: "From" })
        ));

        let mut email = self::email("hi");
        email.from_name = Some("Jane\r\nX-Extra: 1".to_string());
        assert!(matches!(
            email.check_headers(),
            Err(Error::InvalidHeaderValue { field: "From display name" })
        ));
    }

    #[test]
    fn test_attachment_headers_with_line_break_are_refused() {
        let mut email = email("hi");
        email.attachments = vec![Attachment::new("a.txt\r\nX-Extra: 1", "text/plain", "aGk=")];
        assert!(matches!(
            build_mime_message(&email),
            Err(Error::InvalidHeaderValue { field: "attachment filename" })
        ));

        email.attachments = vec![Attachment::new("a.txt", "text/plain\nX-Extra: 1", "aGk=")];
        assert!(matches!(
            build_mime_message(&email),
            Err(Error::InvalidHeaderValue { field: "attachment MIME type" })
        ));
    }

    #[test]
    fn test_attachment_filename_is_escaped() {
        let mut email = email("hi");
        email.attachments = vec![Attachment::new("a\"b\\c.txt", "text/plain", "aGk=")];
        let message = build_with_boundary(&email, "B".to_string()).unwrap();
        let raw = message.as_str();
        assert!(raw.contains("Content-Type: text/plain; name=\"a\\\"b\\\\c.txt\"\r\n"));
        assert!(raw.contains("filename=\"a\\\"b\\\\c.txt\"\r\n"));
    }

    #[test]
    fn test_contains_line_break() {
        assert!(contains_line_break("a\rb"));
        assert!(contains_line_break("a\nb"));
        assert!(!contains_line_break("a b\t"));
    }
}

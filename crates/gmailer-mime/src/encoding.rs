//! Content encoding for outgoing mail.
//!
//! Three policies, picked by [`EncodingKind`]:
//!
//! - **Subject**: RFC 2047 encoded-word, `=?utf-8?B?<base64>?=`, applied even
//!   to ASCII subjects. An empty subject becomes [`DEFAULT_SUBJECT`].
//! - **MIME message**: Base64 with the URL-safe alphabet (`-` and `_`),
//!   padding kept. This is the `raw` payload the Gmail API expects.
//! - **Attachment**: standard Base64, unless the content already is valid
//!   Base64, in which case it passes through untouched.
//!
//! [`encode_content`] never fails outright; it always hands back an
//! [`EncodingResult`] and, on failure, the original content.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Subject used when the caller supplies none.
pub const DEFAULT_SUBJECT: &str = "No Subject";

/// Largest assembled message accepted for transport (35 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 35 * 1024 * 1024;

/// Whole-string match against the standard alphabet with correct padding.
static BASE64_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
});

/// RFC 2047 encoded-word in UTF-8, either B or Q form.
static ENCODED_WORD_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?i)=\?utf-8\?(B|Q)\?[^?]*\?="));

/// Which encoding policy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncodingKind {
    /// A `Subject:` header value.
    Subject,
    /// The fully assembled message, encoded for transport.
    MimeMessage,
    /// An attachment body.
    Attachment,
}

impl FromStr for EncodingKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "subject" | "Subject" => Ok(Self::Subject),
            "mime_message" | "mimeMessage" | "MimeMessage" => Ok(Self::MimeMessage),
            "attachment" | "Attachment" => Ok(Self::Attachment),
            other => Err(Error::InvalidEncodingKind(other.to_string())),
        }
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject => write!(f, "subject"),
            Self::MimeMessage => write!(f, "mime_message"),
            Self::Attachment => write!(f, "attachment"),
        }
    }
}

/// Outcome of an encoding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingResult {
    /// Whether the policy was applied.
    pub succeeded: bool,
    /// Encoded text, or the original input when `succeeded` is false.
    pub encoded_content: String,
    /// Human-readable explanation.
    pub message: String,
}

impl EncodingResult {
    fn ok(encoded_content: String, message: &str) -> Self {
        Self {
            succeeded: true,
            encoded_content,
            message: message.to_string(),
        }
    }

    fn failed(original: &str, error: &Error) -> Self {
        Self {
            succeeded: false,
            encoded_content: original.to_string(),
            message: format!("Error during encoding: {error}"),
        }
    }

    /// Converts into a `Result`, keeping the encoded text on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] carrying the diagnostic message when the
    /// policy was not applied.
    pub fn into_result(self) -> Result<String> {
        if self.succeeded {
            Ok(self.encoded_content)
        } else {
            Err(Error::Encoding(self.message))
        }
    }
}

/// Encodes `content` with the policy selected by `kind`.
#[must_use]
pub fn encode_content(content: &str, kind: EncodingKind) -> EncodingResult {
    match kind {
        EncodingKind::Subject => {
            EncodingResult::ok(encode_subject(content), "Email subject encoded successfully.")
        }
        EncodingKind::MimeMessage => encode_mime_message(content, DEFAULT_MAX_MESSAGE_SIZE),
        EncodingKind::Attachment => encode_attachment(content),
    }
}

/// Like [`encode_content`], with the kind given by name.
///
/// An unknown name yields a failed result that names the kind and returns
/// `content` unchanged.
#[must_use]
pub fn encode_content_named(content: &str, kind: &str) -> EncodingResult {
    match kind.parse::<EncodingKind>() {
        Ok(kind) => encode_content(content, kind),
        Err(e) => EncodingResult::failed(content, &e),
    }
}

/// Wraps a subject in a UTF-8 Base64 encoded-word.
#[must_use]
pub fn encode_subject(subject: &str) -> String {
    let subject = if subject.is_empty() {
        DEFAULT_SUBJECT
    } else {
        subject
    };
    format!("=?utf-8?B?{}?=", encode_base64(subject.as_bytes()))
}

/// Encodes an assembled message for transport, refusing anything over
/// `max_size` bytes.
#[must_use]
pub fn encode_mime_message(message: &str, max_size: usize) -> EncodingResult {
    if message.len() > max_size {
        let error = Error::MessageTooLarge {
            size: message.len(),
            limit: max_size,
        };
        return EncodingResult::failed(message, &error);
    }

    EncodingResult::ok(
        URL_SAFE.encode(message.as_bytes()),
        "MIME message encoded successfully.",
    )
}

/// Normalizes attachment content to standard Base64 without double-encoding.
#[must_use]
pub fn encode_attachment(content: &str) -> EncodingResult {
    match is_base64(content) {
        Ok(true) => EncodingResult::ok(
            content.to_string(),
            "Attachment content was already Base64 encoded.",
        ),
        Ok(false) => EncodingResult::ok(
            encode_base64(content.as_bytes()),
            "Attachment content encoded successfully.",
        ),
        Err(e) => EncodingResult::failed(content, &e),
    }
}

/// Checks whether `content` is valid standard Base64 with correct padding.
///
/// The empty string counts as valid.
///
/// # Errors
///
/// Returns an error if the matcher cannot be built.
pub fn is_base64(content: &str) -> Result<bool> {
    BASE64_PATTERN
        .as_ref()
        .map(|pattern| pattern.is_match(content))
        .map_err(|e| Error::InvalidEncoding(e.to_string()))
}

/// Checks whether a header value contains a UTF-8 encoded-word.
#[must_use]
pub fn is_mime_encoded_word(value: &str) -> bool {
    ENCODED_WORD_PATTERN
        .as_ref()
        .is_ok_and(|pattern| pattern.is_match(value))
}

/// Decodes a single `=?charset?B?...?=` encoded-word.
///
/// Values that are not encoded-words are returned unchanged.
///
/// # Errors
///
/// Returns an error for malformed words, the Q form, or invalid UTF-8.
pub fn decode_encoded_word(value: &str) -> Result<String> {
    let Some(inner) = value
        .strip_prefix("=?")
        .and_then(|rest| rest.strip_suffix("?="))
    else {
        return Ok(value.to_string());
    };

    let parts: Vec<&str> = inner.split('?').collect();
    let [_charset, encoding, text] = parts.as_slice() else {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    };

    if !encoding.eq_ignore_ascii_case("b") {
        return Err(Error::InvalidEncoding(format!(
            "Unsupported encoded-word encoding: {encoding}"
        )));
    }

    String::from_utf8(decode_base64(text)?).map_err(Into::into)
}

/// Encodes data as standard Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes standard Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes a URL-safe transport payload back to message bytes.
///
/// # Errors
///
/// Returns an error if the input is not valid URL-safe Base64.
pub fn decode_base64_url(data: &str) -> Result<Vec<u8>> {
    URL_SAFE.decode(data).map_err(Into::into)
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
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode_decode() {
        let encoded = encode_base64(b"Hello, World!");
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(decode_base64(&encoded).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_subject_encoded_word() {
        let result = encode_content("Hello", EncodingKind::Subject);
        assert!(result.succeeded);
        assert_eq!(result.encoded_content, "=?utf-8?B?SGVsbG8=?=");
        assert_eq!(result.message, "Email subject encoded successfully.");
    }

    #[test]
    fn test_empty_subject_uses_placeholder() {
        let result = encode_content("", EncodingKind::Subject);
        assert_eq!(decode_encoded_word(&result.encoded_content).unwrap(), "No Subject");
    }

    #[test]
    fn test_subject_non_ascii() {
        let encoded = encode_subject("Héllo wörld ✉");
        assert!(is_mime_encoded_word(&encoded));
        assert_eq!(decode_encoded_word(&encoded).unwrap(), "Héllo wörld ✉");
    }

    #[test]
    fn test_mime_message_is_url_safe() {
        // U+FBFF is EF AF BF, which is "76+/" in the standard alphabet.
        let message = "\u{fbff}";
        assert_eq!(encode_base64(message.as_bytes()), "76+/");
        let result = encode_content(message, EncodingKind::MimeMessage);
        assert!(result.succeeded);
        assert_eq!(result.encoded_content, "76-_");
    }

    #[test]
    fn test_mime_message_keeps_padding() {
        let result = encode_content("ab", EncodingKind::MimeMessage);
        assert_eq!(result.encoded_content, "YWI=");
    }

    #[test]
    fn test_mime_message_over_limit_fails() {
        let result = encode_mime_message("0123456789", 4);
        assert!(!result.succeeded);
        assert_eq!(result.encoded_content, "0123456789");
        assert!(result.message.contains("size limit"));
        assert!(result.into_result().is_err());
    }

    #[test]
    fn test_attachment_raw_text_is_encoded() {
        let result = encode_content("hello", EncodingKind::Attachment);
        assert!(result.succeeded);
        assert_eq!(result.encoded_content, "aGVsbG8=");
        assert_eq!(result.message, "Attachment content encoded successfully.");
    }

    #[test]
    fn test_attachment_already_encoded_passes_through() {
        let result = encode_content("aGVsbG8=", EncodingKind::Attachment);
        assert!(result.succeeded);
        assert_eq!(result.encoded_content, "aGVsbG8=");
        assert_eq!(result.message, "Attachment content was already Base64 encoded.");
    }

    #[test]
    fn test_is_base64() {
        assert!(is_base64("aGVsbG8=").unwrap());
        assert!(is_base64("YWI=").unwrap());
        assert!(is_base64("").unwrap());
        assert!(!is_base64("hello world").unwrap());
        assert!(!is_base64("aGVsbG8").unwrap());
        assert!(!is_base64("aGVs-G8=").unwrap());
    }

    #[test]
    fn test_invalid_kind_name() {
        let result = encode_content_named("payload", "rot13");
        assert!(!result.succeeded);
        assert_eq!(result.encoded_content, "payload");
        assert!(result.message.contains("rot13"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!("subject".parse::<EncodingKind>().unwrap(), EncodingKind::Subject);
        assert_eq!("mimeMessage".parse::<EncodingKind>().unwrap(), EncodingKind::MimeMessage);
        assert_eq!("attachment".parse::<EncodingKind>().unwrap(), EncodingKind::Attachment);
        let named = encode_content_named("x", "subject");
        assert_eq!(named, encode_content("x", EncodingKind::Subject));
    }

    #[test]
    fn test_decode_encoded_word_rejects_q_form() {
        assert!(decode_encoded_word("=?utf-8?Q?H=C3=A9llo?=").is_err());
        assert_eq!(decode_encoded_word("plain").unwrap(), "plain");
    }

    proptest! {
        #[test]
        fn prop_subject_round_trip(subject in "\\PC{1,80}") {
            let encoded = encode_subject(&subject);
            prop_assert_eq!(decode_encoded_word(&encoded).unwrap(), subject);
        }

        #[test]
        fn prop_mime_message_round_trip(message in "\\PC{0,400}") {
            let result = encode_content(&message, EncodingKind::MimeMessage);
            prop_assert!(result.succeeded);
            let decoded = decode_base64_url(&result.encoded_content).unwrap();
            prop_assert_eq!(decoded, message.into_bytes());
        }

        #[test]
        fn prop_attachment_idempotent(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let encoded = encode_base64(&data);
            let result = encode_content(&encoded, EncodingKind::Attachment);
            prop_assert_eq!(&result.encoded_content, &encoded);
            let again = encode_content(&result.encoded_content, EncodingKind::Attachment);
            prop_assert_eq!(again.encoded_content, encoded);
        }
    }
}

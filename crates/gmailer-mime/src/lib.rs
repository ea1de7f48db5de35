//! # gmailer-mime
//!
//! MIME message construction and transport encoding for sending mail
//! through the Gmail REST API.
//!
//! ## Features
//!
//! - **Address validation**: shape check for sender and recipient addresses
//! - **Content detection**: picks `text/html` or `text/plain` for the body
//! - **Encoding**: RFC 2047 subjects, Base64 attachments, URL-safe payloads
//! - **Assembly**: multipart/alternative or multipart/mixed messages
//!
//! This is not a MIME parser and implements only the subset of RFC 5322,
//! RFC 2045 and RFC 2047 needed for simple messages with attachments.
//!
//! ## Quick Start
//!
//! ### Building a Message
//!
//! ```ignore
//! use gmailer_mime::{Attachment, OutgoingEmail, build_mime_message};
//!
//! let email = OutgoingEmail {
//!     from: "sender@example.com".into(),
//!     to: "recipient@example.com".into(),
//!     subject: Some("Report".into()),
//!     body: "<p>See attached.</p>".into(),
//!     attachments: vec![Attachment::new("notes.txt", "text/plain", "plain text")],
//!     ..OutgoingEmail::default()
//! };
//!
//! let message = build_mime_message(&email)?;
//! println!("{message}");
//! ```
//!
//! ### Encoding
//!
//! ```ignore
//! use gmailer_mime::encoding::{EncodingKind, encode_content};
//!
//! let subject = encode_content("Héllo", EncodingKind::Subject);
//! assert_eq!(subject.encoded_content, "=?utf-8?B?SMOpbGxv?=");
//!
//! // Already-encoded attachment content passes through unchanged.
//! let attachment = encode_content("aGVsbG8=", EncodingKind::Attachment);
//! assert_eq!(attachment.encoded_content, "aGVsbG8=");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod detect;
mod error;
mod message;
mod validate;

pub mod encoding;

pub use content_type::ContentType;
pub use detect::{HtmlDetection, detect_html};
pub use encoding::{DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_SUBJECT, EncodingKind, EncodingResult, encode_content};
pub use error::{Error, Result};
pub use message::{
    Attachment, BOUNDARY_PREFIX, MimeMessage, OutgoingEmail, build_mime_message,
    build_with_boundary, contains_line_break, encode_for_transport, generate_boundary,
};
pub use validate::{EmailCheck, check_email, is_valid_email};

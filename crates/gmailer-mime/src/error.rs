//! Error types for MIME operations.

use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown encoding kind name.
    #[error("Invalid encoding type specified: {0}")]
    InvalidEncodingKind(String),

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),

    /// Assembled message is larger than the transport accepts.
    #[error("Message exceeds size limit: {size} bytes (limit {limit})")]
    MessageTooLarge {
        /// Size of the assembled message in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// A header value contains a CR or LF.
    #[error("Header value for {field} must not contain line breaks")]
    InvalidHeaderValue {
        /// Which header field was rejected.
        field: &'static str,
    },

    /// The assembled message could not be encoded for transport.
    #[error("Failed to encode MIME message: {0}")]
    Encoding(String),
}

//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
///
/// `send_email` never returns these; it reports failures through
/// [`SendResult`](crate::SendResult). They surface from construction,
/// configuration and initialization.
#[derive(Debug, Error)]
pub enum Error {
    /// MIME assembly or encoding failed.
    #[error("MIME error: {0}")]
    Mime(#[from] gmailer_mime::Error),

    /// Credential or token operation failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] gmailer_auth::Error),

    /// Sender address failed validation.
    #[error("The provided Gmail sender's email is invalid: {0}")]
    InvalidSender(String),

    /// Client initialization failed.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// A request failed a precondition.
    #[error("{}", .0.message())]
    Rejected(crate::diagnostics::Precondition),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

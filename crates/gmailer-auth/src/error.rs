//! Error types for credential and token operations.

use std::io;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Authentication error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `OAuth2` error from server.
    #[error("OAuth2 error: {error} - {description}")]
    OAuth {
        /// Error code (e.g., `invalid_grant`).
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// Invalid token response.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// The private key could not be used to sign an assertion.
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Service account file does not exist.
    #[error("File not found at provided path: '{0}'.")]
    ServiceAccountNotFound(String),

    /// Service account source is not valid JSON.
    #[error("Service account from {origin} contains invalid JSON: {source}")]
    InvalidServiceAccountJson {
        /// Where the JSON came from (a path or a variable name).
        origin: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// Service account lacks `private_key` or `client_email`.
    #[error("The service account from {0} lacks required 'private_key' or 'client_email' fields.")]
    IncompleteServiceAccount(String),

    /// No provider in the chain produced a service account.
    #[error("Service account configuration is missing.")]
    MissingServiceAccount,
}

impl Error {
    /// Creates an OAuth error from error code and description.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            error: error.into(),
            description: description.into(),
        }
    }
}

//! # gmailer-auth
//!
//! Service-account authentication for the Gmail API.
//!
//! ## Features
//!
//! - **Credential chain**: explicit value, file path, environment variables,
//!   and the user's config directory, tried in order
//! - **JWT bearer flow**: RS256-signed assertions exchanged for access tokens
//! - **Token management**: expiration checking with a safety buffer
//!
//! ## Quick Start
//!
//! ```ignore
//! use gmailer_auth::{CredentialChain, ServiceAccountAuthenticator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Explicit → path → GMAIL_MAILER_SERVICE_ACCOUNT_PATH
//!     //          → GMAIL_MAILER_SERVICE_ACCOUNT → ~/.config/gmailer/serviceaccount.json
//!     let account = CredentialChain::standard(None, None).resolve()?;
//!
//!     let auth = ServiceAccountAuthenticator::new(account)?
//!         .with_subject("sender@example.com");
//!
//!     let token = auth.fetch_token().await?;
//!     println!("Token expires at {:?}", token.expires_at);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod assertion;
pub mod credentials;
mod error;
pub mod provider;
pub mod token;

pub use assertion::ServiceAccountAuthenticator;
pub use credentials::{CredentialChain, CredentialProvider, ServiceAccount};
pub use error::{Error, Result};
pub use provider::Provider;
pub use token::Token;

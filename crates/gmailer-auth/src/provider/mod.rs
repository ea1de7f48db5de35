//! Token endpoint configuration.

use crate::error::{Error, Result};
use url::Url;

/// Scope allowing a service account to send mail as the impersonated user.
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// Google's token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// `OAuth2` token endpoint and the scopes requested from it.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Token endpoint URL; also the JWT audience.
    pub token_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(name: impl Into<String>, token_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            token_url: Url::parse(token_url.as_ref())?,
            default_scopes: Vec::new(),
        })
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Google with the `gmail.send` scope.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new("Google", GOOGLE_TOKEN_URL)?
            .with_default_scopes(vec![GMAIL_SEND_SCOPE.to_string()]))
    }

    /// Google, but with the token endpoint named by a service account.
    ///
    /// # Errors
    ///
    /// Returns an error if `token_uri` is not a valid URL.
    pub fn google_with_token_uri(token_uri: Option<&str>) -> Result<Self> {
        let mut provider = Self::google()?;
        if let Some(uri) = token_uri {
            provider.token_url = Url::parse(uri)?;
        }
        Ok(provider)
    }

    /// Returns the scopes joined for a JWT `scope` claim.
    #[must_use]
    pub fn scope(&self) -> String {
        self.default_scopes.join(" ")
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no scope is configured or the endpoint is not HTTP(S).
    pub fn validate(&self) -> Result<()> {
        if self.default_scopes.is_empty() {
            return Err(Error::InvalidConfig("no scopes configured".into()));
        }
        if !matches!(self.token_url.scheme(), "https" | "http") {
            return Err(Error::InvalidConfig(format!(
                "token_url must be http(s): {}",
                self.token_url
            )));
        }
        Ok(())
    }
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

    #[test]
    fn test_google_provider() {
        let provider = Provider::google().unwrap();
        assert_eq!(provider.name, "Google");
        assert_eq!(provider.scope(), GMAIL_SEND_SCOPE);
        assert_eq!(provider.token_url.as_str(), GOOGLE_TOKEN_URL);
        provider.validate().unwrap();
    }

    #[test]
    fn test_custom_token_uri() {
        let provider =
            Provider::google_with_token_uri(Some("https://token.example.com/token")).unwrap();
        assert_eq!(provider.token_url.host_str(), Some("token.example.com"));
        assert!(Provider::google_with_token_uri(Some("not a url")).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_scopes() {
        let provider = Provider::new("Custom", "https://auth.example.com/token").unwrap();
        assert!(matches!(provider.validate(), Err(Error::InvalidConfig(_))));
    }
}

//! JWT-bearer token acquisition for service accounts (RFC 7523).
//!
//! The service account signs a short-lived RS256 assertion naming the
//! impersonated user as `sub`, and trades it at the token endpoint for an
//! access token. There is no refresh token; a new assertion is signed
//! whenever the access token runs out.

use crate::credentials::ServiceAccount;
use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::{ErrorResponse, Token, TokenResponse};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Grant type for exchanging a signed assertion.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed assertion; Google rejects anything over an hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Claims of the signed assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer: the service account email.
    pub iss: String,
    /// Subject: the user being impersonated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Space-separated scopes.
    pub scope: String,
    /// Audience: the token endpoint.
    pub aud: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expires at (Unix seconds).
    pub exp: i64,
}

/// Obtains access tokens for a service account.
#[derive(Debug, Clone)]
pub struct ServiceAccountAuthenticator {
    account: ServiceAccount,
    subject: Option<String>,
    provider: Provider,
    http_client: Client,
}

impl ServiceAccountAuthenticator {
    /// Creates an authenticator using the account's token endpoint, or
    /// Google's, with the `gmail.send` scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the account's `token_uri` is not a valid URL.
    pub fn new(account: ServiceAccount) -> Result<Self> {
        let provider = Provider::google_with_token_uri(account.token_uri.as_deref())?;
        Ok(Self {
            account,
            subject: None,
            provider,
            http_client: Client::new(),
        })
    }

    /// Sets the user to impersonate (domain-wide delegation).
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Replaces the provider configuration.
    #[must_use]
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Uses the given HTTP client for token requests.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Returns the service account identity.
    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.account.client_email
    }

    /// Returns the impersonated user, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Builds assertion claims issued at `now`.
    #[must_use]
    pub fn claims_at(&self, now: DateTime<Utc>) -> Claims {
        let iat = now.timestamp();
        Claims {
            iss: self.account.client_email.clone(),
            sub: self.subject.clone(),
            scope: self.provider.scope(),
            aud: self.provider.token_url.to_string(),
            iat,
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        }
    }

    /// Signs an assertion issued now.
    ///
    /// # Errors
    ///
    /// Returns an error if the private key is not a usable RSA PEM key.
    pub fn sign_assertion(&self) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.account.private_key_id);
        let key = EncodingKey::from_rsa_pem(self.account.private_key.as_bytes())?;
        encode(&header, &self.claims_at(Utc::now()), &key).map_err(Into::into)
    }

    /// Signs an assertion and exchanges it for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if signing, the request, or the exchange fails.
    pub async fn fetch_token(&self) -> Result<Token> {
        self.provider.validate()?;
        let assertion = self.sign_assertion()?;

        let mut params = HashMap::new();
        params.insert("grant_type", JWT_BEARER_GRANT);
        params.insert("assertion", assertion.as_str());

        debug!(
            client_email = %self.account.client_email,
            subject = ?self.subject,
            "Requesting access token"
        );

        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match response.json::<ErrorResponse>().await {
                Ok(error) => error.into_error(),
                Err(_) => Error::InvalidResponse(format!("token endpoint returned {status}")),
            });
        }

        let token_response: TokenResponse = response.json().await?;
        Token::from_response(token_response)
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
    use crate::provider::GMAIL_SEND_SCOPE;
    use chrono::TimeZone;

    fn authenticator() -> ServiceAccountAuthenticator {
        ServiceAccountAuthenticator::new(ServiceAccount::new(
            "mailer@project.iam.gserviceaccount.com",
            "not a pem key",
        ))
        .unwrap()
    }

    #[test]
    fn test_claims() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let claims = authenticator().with_subject("sender@example.com").claims_at(now);

        assert_eq!(claims.iss, "mailer@project.iam.gserviceaccount.com");
        assert_eq!(claims.sub.as_deref(), Some("sender@example.com"));
        assert_eq!(claims.scope, GMAIL_SEND_SCOPE);
        assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_claims_without_subject_omit_sub() {
        let claims = authenticator().claims_at(Utc::now());
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("sub").is_none());
    }

    #[test]
    fn test_invalid_key_fails_before_request() {
        let auth = authenticator();
        assert!(matches!(auth.sign_assertion(), Err(Error::Jwt(_))));
        let result = tokio_test::block_on(auth.fetch_token());
        assert!(matches!(result, Err(Error::Jwt(_))));
    }

    #[test]
    fn test_invalid_token_uri() {
        let mut account = ServiceAccount::new("a@b.co", "k");
        account.token_uri = Some("::nope::".into());
        assert!(ServiceAccountAuthenticator::new(account).is_err());
    }
}

//! Gmail REST API transport.

use super::{Transport, TransportError, TransportResponse};
use crate::error::Result;
use gmailer_auth::{ServiceAccountAuthenticator, Token};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

/// Gmail endpoint for sending a raw message as the authenticated user.
pub const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

#[derive(Serialize)]
struct SendBody<'a> {
    raw: &'a str,
}

/// Transport that posts to the Gmail REST API with a service-account token.
///
/// The access token is cached and re-fetched once it is missing or within
/// the expiry buffer.
#[derive(Debug)]
pub struct GmailTransport {
    http_client: Client,
    endpoint: Url,
    authenticator: ServiceAccountAuthenticator,
    token: Mutex<Option<Token>>,
}

impl GmailTransport {
    /// Creates a transport without fetching a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in endpoint fails to parse.
    pub fn new(authenticator: ServiceAccountAuthenticator) -> Result<Self> {
        Ok(Self {
            http_client: Client::new(),
            endpoint: Url::parse(GMAIL_SEND_URL)?,
            authenticator,
            token: Mutex::new(None),
        })
    }

    /// Creates a transport and fetches its first token, so credential
    /// problems surface immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be obtained.
    pub async fn connect(authenticator: ServiceAccountAuthenticator) -> Result<Self> {
        let transport = Self::new(authenticator)?;
        transport.authorize().await?;
        Ok(transport)
    }

    /// Sends to a different endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if `endpoint` is not a valid URL.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.endpoint = Url::parse(endpoint)?;
        Ok(self)
    }

    /// Uses the given HTTP client for send requests.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Seeds the token cache, e.g. with a token obtained out of band.
    #[must_use]
    pub fn with_token(self, token: Token) -> Self {
        Self {
            token: Mutex::new(Some(token)),
            ..self
        }
    }

    /// Returns the send endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns a valid access token, fetching a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a new token is needed and cannot be obtained.
    pub async fn authorize(&self) -> gmailer_auth::Result<Token> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid()) {
            return Ok(token.clone());
        }

        debug!(
            client_email = self.authenticator.client_email(),
            "Fetching access token"
        );
        let token = self.authenticator.fetch_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

impl Transport for GmailTransport {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, size = raw.len()))]
    async fn send_raw(&self, raw: &str) -> std::result::Result<TransportResponse, TransportError> {
        let token = self.authorize().await?;

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(reqwest::header::AUTHORIZATION, token.authorization_header())
            .json(&SendBody { raw })
            .send()
            .await?;

        let status = response.status();
        let request_url = response.url().to_string();
        let body = response.json::<serde_json::Value>().await.ok();

        debug!(status = status.as_u16(), "Gmail responded");

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            request_url: Some(request_url),
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gmailer_auth::ServiceAccount;

    fn transport() -> GmailTransport {
        let auth = ServiceAccountAuthenticator::new(ServiceAccount::new(
            "mailer@project.iam.gserviceaccount.com",
            "not a pem key",
        ))
        .unwrap();
        GmailTransport::new(auth).unwrap()
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(transport().endpoint().as_str(), GMAIL_SEND_URL);
    }

    #[test]
    fn test_with_endpoint() {
        let transport = transport()
            .with_endpoint("http://localhost:8080/send")
            .unwrap();
        assert_eq!(transport.endpoint().as_str(), "http://localhost:8080/send");
        assert!(transport.with_endpoint("not a url").is_err());
    }

    #[tokio::test]
    async fn test_bad_key_is_transport_error() {
        let err = transport().send_raw("cmF3").await.unwrap_err();
        assert!(err.status.is_none());
        assert!(err.description.contains("JWT"));
    }
}

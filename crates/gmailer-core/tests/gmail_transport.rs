//! Integration tests for the Gmail REST transport.
//!
//! A local mock server stands in for both the Gmail send endpoint and the
//! OAuth token endpoint.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use gmailer_auth::{ServiceAccount, ServiceAccountAuthenticator, Token};
use gmailer_core::{GmailTransport, Mailer, MailerConfig, SendEmailRequest, Transport};
use gmailer_mime::encoding::decode_base64_url;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &str = include_str!("../../gmailer-auth/tests/fixtures/test_key.pem");

fn authenticator(server: &MockServer) -> ServiceAccountAuthenticator {
    let mut account = ServiceAccount::new("mailer@project.iam.gserviceaccount.com", TEST_KEY);
    account.token_uri = Some(format!("{}/token", server.uri()));
    ServiceAccountAuthenticator::new(account)
        .unwrap()
        .with_subject("sender@example.com")
}

fn transport(server: &MockServer, token: Token) -> GmailTransport {
    GmailTransport::new(authenticator(server))
        .unwrap()
        .with_endpoint(&format!("{}/send", server.uri()))
        .unwrap()
        .with_token(token)
}

fn mailer(transport: GmailTransport) -> Mailer {
    Mailer::new(MailerConfig::new().with_default_sender("sender@example.com"))
        .unwrap()
        .with_transport(transport)
}

async fn token_endpoint_unused(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_accepted_send_populates_result() {
    let server = MockServer::start().await;
    token_endpoint_unused(&server).await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("authorization", "Bearer cached"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "18c0ffee", "labelIds": ["SENT"] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mailer = mailer(transport(&server, Token::new("cached", "Bearer")));
    let result = mailer
        .send_email(&SendEmailRequest::new("to@example.com", "Hello").with_subject("Hi"))
        .await;

    assert!(result.sent, "{}", result.message);
    assert_eq!(result.status, Some(200));
    assert_eq!(result.status_text.as_deref(), Some("OK"));
    assert!(result.response_url.unwrap().starts_with(&server.uri()));
    assert_eq!(result.message, "Email successfully sent to to@example.com.");
    assert_eq!(result.raw_response.unwrap()["id"], "18c0ffee");
}

#[tokio::test]
async fn test_request_body_carries_raw_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
        .mount(&server)
        .await;

    let mailer = mailer(transport(&server, Token::new("cached", "Bearer")));
    let result = mailer
        .send_email(&SendEmailRequest::new("to@example.com", "Hello"))
        .await;
    assert!(result.sent);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let raw = body["raw"].as_str().unwrap();
    let message = String::from_utf8(decode_base64_url(raw).unwrap()).unwrap();
    assert!(message.contains("To: to@example.com\r\n"));
    assert!(message.contains("From: sender@example.com\r\n"));
}

#[tokio::test]
async fn test_rate_limited_response_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({ "error": { "code": 429, "status": "RESOURCE_EXHAUSTED" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server, Token::new("cached", "Bearer"))
        .send_raw("cmF3")
        .await
        .unwrap();

    assert_eq!(response.status, 429);
    assert_eq!(response.status_text, "Too Many Requests");
    assert!(!response.is_success());
    assert_eq!(response.body.unwrap()["error"]["code"], 429);
}

#[tokio::test]
async fn test_rate_limited_send_is_reported_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let mailer = mailer(transport(&server, Token::new("cached", "Bearer")));
    let result = mailer
        .send_email(&SendEmailRequest::new("to@example.com", "Hello"))
        .await;

    assert!(!result.sent);
    assert_eq!(result.message, "Failed to send email. Status: 429");
    assert!(result.status.is_none());
    assert!(result.raw_response.is_none());
}

#[tokio::test]
async fn test_non_json_body_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
        .mount(&server)
        .await;

    let response = transport(&server, Token::new("cached", "Bearer"))
        .send_raw("cmF3")
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.body.is_none());
}

#[tokio::test]
async fn test_cached_token_is_reused() {
    let server = MockServer::start().await;
    token_endpoint_unused(&server).await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("authorization", "Bearer cached"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let expires = Utc::now() + Duration::minutes(30);
    let transport = transport(&server, Token::new("cached", "Bearer").with_expires_at(expires));

    transport.send_raw("b25l").await.unwrap();
    transport.send_raw("dHdv").await.unwrap();
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let stale = Token::new("stale", "Bearer").with_expires_at(Utc::now() - Duration::minutes(5));
    let transport = transport(&server, stale);

    assert_eq!(transport.send_raw("b25l").await.unwrap().status, 200);
    assert_eq!(transport.send_raw("dHdv").await.unwrap().status, 200);
}

#[tokio::test]
async fn test_token_within_expiry_buffer_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let nearly_expired =
        Token::new("stale", "Bearer").with_expires_at(Utc::now() + Duration::seconds(30));
    let token = transport(&server, nearly_expired).authorize().await.unwrap();

    assert_eq!(token.access_token, "fresh");
    assert!(token.is_valid());
}

#[tokio::test]
async fn test_rejected_token_request_fails_the_send() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let stale = Token::new("stale", "Bearer").with_expires_at(Utc::now() - Duration::minutes(5));
    let mailer = mailer(transport(&server, stale));
    let result = mailer
        .send_email(&SendEmailRequest::new("to@example.com", "Hello"))
        .await;

    assert!(!result.sent);
    assert!(result.status.is_none());
    assert!(
        result
            .message
            .starts_with("An error occurred while sending the email:"),
        "{}",
        result.message
    );
}
